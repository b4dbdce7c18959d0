// Copyright (c) 2022 RBB S.r.l
// opensource@mintlayer.org
// SPDX-License-Identifier: MIT
// Licensed under the MIT License;
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://spdx.org/licenses/MIT
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::*;
use crate::{
    config::{min_tx_fee, MAX_BLOCK_SIZE, MIN_TX_FEE, SEQUENCE_BUCKET_BITS},
    error::{RelationError, StorageError},
    interface::MockTxVerifier,
    storage::InMemoryTxPoolStorage,
};
use common::chain::{ForkType, TemplateKind};

mod reorg;
pub mod utils;

use self::utils::*;

#[ctor::ctor]
fn init() {
    logging::init_logging();
}
