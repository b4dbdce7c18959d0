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

use common::{
    chain::{Destination, ForkId, OutPoint, Transaction, TxOutput, TxType},
    primitives::{Amount, BlockHeight, Id},
};

use super::SequenceNumber;
use crate::types::{AssembledTx, TxInfo};

/// A transaction admitted into the pool together with what admission learned about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PooledTx {
    tx_id: Id<Transaction>,
    tx: Transaction,
    fork: ForkId,
    sequence: SequenceNumber,
    /// Next label handed out below `sequence` while this entry sits on a bucket root.
    next_sequence: Option<SequenceNumber>,
    size: usize,
    dest_in: Destination,
    value_in: Amount,
}

impl PooledTx {
    pub fn new(
        tx: Transaction,
        fork: ForkId,
        sequence: SequenceNumber,
        dest_in: Destination,
        value_in: Amount,
    ) -> Self {
        let tx_id = tx.get_id();
        let size = tx.encoded_size();
        Self {
            tx_id,
            tx,
            fork,
            sequence,
            next_sequence: None,
            size,
            dest_in,
            value_in,
        }
    }

    pub fn tx_id(&self) -> &Id<Transaction> {
        &self.tx_id
    }

    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn fork(&self) -> &ForkId {
        &self.fork
    }

    pub fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    pub fn set_sequence(&mut self, sequence: SequenceNumber) {
        self.sequence = sequence;
    }

    pub fn next_sequence(&self) -> Option<SequenceNumber> {
        self.next_sequence
    }

    pub fn set_next_sequence(&mut self, cursor: Option<SequenceNumber>) {
        self.next_sequence = cursor;
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn fee(&self) -> Amount {
        self.tx.tx_fee()
    }

    pub fn tx_type(&self) -> TxType {
        self.tx.tx_type()
    }

    pub fn dest_in(&self) -> &Destination {
        &self.dest_in
    }

    pub fn value_in(&self) -> Amount {
        self.value_in
    }

    pub fn output(&self, index: u8) -> Option<TxOutput> {
        self.tx.output(index, &self.dest_in, self.value_in)
    }

    /// Outpoints this entry creates, output 0 first.
    pub fn outpoints(&self) -> impl Iterator<Item = (OutPoint, TxOutput)> + '_ {
        [Transaction::PAYMENT_OUTPUT, Transaction::CHANGE_OUTPUT]
            .into_iter()
            .filter_map(|i| self.output(i).map(|out| (OutPoint::new(self.tx_id, i), out)))
    }

    pub fn touches(&self, dest: &Destination) -> bool {
        self.dest_in == *dest || self.tx.send_to() == dest
    }

    pub fn to_assembled(&self) -> AssembledTx {
        AssembledTx {
            tx: self.tx.clone(),
            block_height: None,
            dest_in: Some(self.dest_in),
            value_in: self.value_in,
        }
    }

    pub fn to_confirmed(&self, height: BlockHeight) -> AssembledTx {
        AssembledTx {
            block_height: Some(height),
            ..self.to_assembled()
        }
    }

    pub fn to_info(&self) -> TxInfo {
        TxInfo {
            tx_id: self.tx_id,
            fork: self.fork,
            tx_type: self.tx.tx_type(),
            timestamp: self.tx.timestamp(),
            lock_until: self.tx.lock_until(),
            sequence: self.sequence,
            dest_in: self.dest_in,
            send_to: *self.tx.send_to(),
            amount: self.tx.amount(),
            tx_fee: self.tx.tx_fee(),
            size: self.size,
        }
    }
}

/// The global transaction table. Every other pool structure refers into it by id.
#[derive(Debug, Default)]
pub struct TxStore {
    txs: BTreeMap<Id<Transaction>, PooledTx>,
}

impl TxStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, tx_id: &Id<Transaction>) -> bool {
        self.txs.contains_key(tx_id)
    }

    pub fn get(&self, tx_id: &Id<Transaction>) -> Option<&PooledTx> {
        self.txs.get(tx_id)
    }

    pub fn get_mut(&mut self, tx_id: &Id<Transaction>) -> Option<&mut PooledTx> {
        self.txs.get_mut(tx_id)
    }

    pub fn sequence_of(&self, tx_id: &Id<Transaction>) -> Option<SequenceNumber> {
        self.txs.get(tx_id).map(PooledTx::sequence)
    }

    /// Returns the previous entry under the same id, if any.
    pub fn insert(&mut self, entry: PooledTx) -> Option<PooledTx> {
        self.txs.insert(*entry.tx_id(), entry)
    }

    pub fn remove(&mut self, tx_id: &Id<Transaction>) -> Option<PooledTx> {
        self.txs.remove(tx_id)
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PooledTx> {
        self.txs.values()
    }

    pub fn clear(&mut self) {
        self.txs.clear()
    }
}
