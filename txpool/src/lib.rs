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

#![deny(clippy::clone_on_ref_ptr)]

use std::{path::Path, sync::Arc};

use common::time_getter::TimeGetter;

use crate::{
    error::Error as TxPoolError,
    interface::{Ledger, TxVerifier},
    storage::FileTxPoolStorage,
};

pub use crate::{
    config::{min_tx_fee, TxPoolConfig},
    pool::{AddressAggregate, PushOutcome, SequenceNumber, TxPool},
};

pub mod config;
pub mod error;
pub mod interface;
mod pool;
pub mod storage;
pub mod tx_accumulator;
pub mod types;

pub type Result<T> = core::result::Result<T, TxPoolError>;

/// A pool persisting its content to a file in `data_dir`.
pub fn make_tx_pool(
    config: TxPoolConfig,
    ledger: Arc<dyn Ledger>,
    verifier: Arc<dyn TxVerifier>,
    data_dir: impl AsRef<Path>,
) -> TxPool {
    let storage = Arc::new(FileTxPoolStorage::new(data_dir));
    TxPool::new(config, ledger, verifier, storage, TimeGetter::default())
}
