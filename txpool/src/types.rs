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

use std::collections::BTreeMap;

use parity_scale_codec::{Decode, Encode};

use common::{
    chain::{Destination, ForkId, OutPoint, Transaction, TxOutput, TxType},
    primitives::{Amount, BlockHeight, Id},
};

use crate::pool::SequenceNumber;

/// A transaction together with what was learned about it when it was pooled or confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct AssembledTx {
    pub tx: Transaction,
    /// Height of the confirming block, `None` while pooled.
    pub block_height: Option<BlockHeight>,
    pub dest_in: Option<Destination>,
    pub value_in: Amount,
}

impl AssembledTx {
    pub fn confirmed(tx: Transaction, height: BlockHeight) -> Self {
        Self {
            tx,
            block_height: Some(height),
            dest_in: None,
            value_in: Amount::ZERO,
        }
    }
}

/// One persisted pool entry.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct StoredTx {
    pub fork: ForkId,
    pub tx_id: Id<Transaction>,
    pub tx: AssembledTx,
}

/// Listing entry describing a pooled transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInfo {
    pub tx_id: Id<Transaction>,
    pub fork: ForkId,
    pub tx_type: TxType,
    pub timestamp: u64,
    pub lock_until: u64,
    pub sequence: SequenceNumber,
    pub dest_in: Destination,
    pub send_to: Destination,
    pub amount: Amount,
    pub tx_fee: Amount,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Skip `offset` matches, then return up to `count` (0 means no limit).
    Range { offset: usize, count: usize },
    /// The last `count` matches in label order (0 means all).
    Latest(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxUnspent {
    pub outpoint: OutPoint,
    pub output: TxOutput,
}

/// Candidate transactions for the next block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrangedBlock {
    pub txs: Vec<Transaction>,
    pub total_fee: Amount,
    pub total_size: usize,
}

/// Pool-side effect of a chain update, for wallets and indexers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxSetChange {
    pub fork: ForkId,
    /// Confirmed transactions the pool never held.
    pub added: Vec<AssembledTx>,
    /// Pooled transactions that got confirmed (`Some(height)`) or returned to the pool (`None`).
    pub updated: BTreeMap<Id<Transaction>, Option<BlockHeight>>,
    /// Transactions that left both the chain and the pool, with the outpoints they spent.
    pub removed: Vec<(Id<Transaction>, Vec<OutPoint>)>,
}

impl TxSetChange {
    pub fn new(fork: ForkId) -> Self {
        Self {
            fork,
            added: Vec::new(),
            updated: BTreeMap::new(),
            removed: Vec::new(),
        }
    }
}
