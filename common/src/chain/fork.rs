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

use parity_scale_codec::{Decode, Encode};

use super::Block;
use crate::primitives::{BlockHeight, Id};

/// Tag type for fork identifiers.
pub enum Fork {}

pub type ForkId = Id<Fork>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum ForkType {
    #[codec(index = 0)]
    Common,
    #[codec(index = 1)]
    Defi,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ForkProfile {
    pub name: String,
    pub fork_type: ForkType,
    pub parent: Option<ForkId>,
}

impl ForkProfile {
    pub fn is_defi(&self) -> bool {
        self.fork_type == ForkType::Defi
    }
}

/// Tip of a fork as recorded by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkStatus {
    pub last_block: Id<Block>,
    pub last_height: BlockHeight,
    pub last_time: u64,
}
