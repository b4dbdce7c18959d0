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

use std::collections::BTreeSet;

use common::{
    chain::{Block, Destination, ForkId, Transaction},
    primitives::{Amount, BlockHeight, Id},
};

/// What the ledger knew about a confirmed transaction's inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxContext {
    pub dest_in: Destination,
    pub value_in: Amount,
}

#[derive(Debug, Clone)]
pub struct BlockEx {
    pub id: Id<Block>,
    pub height: BlockHeight,
    pub time: u64,
    pub mint: Option<Transaction>,
    pub txs: Vec<(Transaction, TxContext)>,
}

/// A change of a fork's best chain.
///
/// Both block lists run from the tip backwards, i.e. most recent block first.
#[derive(Debug, Clone)]
pub struct ChainUpdate {
    pub fork: ForkId,
    pub last_block: Id<Block>,
    pub last_height: BlockHeight,
    pub last_time: u64,
    pub blocks_added: Vec<BlockEx>,
    pub blocks_removed: Vec<BlockEx>,
    /// Transactions confirmed on both the abandoned and the new branch. They stay
    /// confirmed and are only reported with their new height.
    pub updated_txs: BTreeSet<Id<Transaction>>,
}
