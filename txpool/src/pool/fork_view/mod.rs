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

//! Per-fork overlay of pooled transactions on top of the confirmed chain state.

mod arrange;
mod relation;

use std::{
    collections::{BTreeMap, BTreeSet},
    ops::Bound,
};

use common::{
    chain::{Block, Destination, ForkId, ForkProfile, OutPoint, Transaction, TxOutput, TxType},
    primitives::Id,
};
use logging::log;

use super::{
    entry::{PooledTx, TxStore},
    SequenceNumber,
};
use crate::{
    error::{Error, SequenceError},
    types::TxUnspent,
};

pub use arrange::{ArrangeParams, ArrangeResult, CertPolicy};
pub use relation::RelationTree;

/// State of an outpoint touched by the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpendRecord {
    /// Created by a pooled transaction and not spent by another one.
    Unspent(TxOutput),
    /// Spent by the pooled transaction `spender`. `owner` is the destination the output
    /// belonged to.
    Spent {
        spender: Id<Transaction>,
        owner: Destination,
    },
}

/// Undo log of a single admission attempt.
enum Undo {
    Entry {
        tx_id: Id<Transaction>,
        sequence: SequenceNumber,
        next_sequence: Option<SequenceNumber>,
    },
    Label {
        sequence: SequenceNumber,
        previous: Option<Id<Transaction>>,
    },
    Record {
        outpoint: OutPoint,
        previous: Option<SpendRecord>,
    },
}

pub struct ForkView {
    fork: ForkId,
    txs: BTreeSet<Id<Transaction>>,
    by_sequence: BTreeMap<SequenceNumber, Id<Transaction>>,
    by_type: BTreeMap<TxType, BTreeSet<Id<Transaction>>>,
    spent: BTreeMap<OutPoint, SpendRecord>,
    /// Pool-side changes to each destination's unspent set; `None` marks an output the pool
    /// spends.
    address_unspent: BTreeMap<Destination, BTreeMap<OutPoint, Option<TxOutput>>>,
    profile: Option<ForkProfile>,
    relations: RelationTree,
    mint_height_tx: Option<Id<Transaction>>,
    last_block: Id<Block>,
    last_block_time: u64,
    max_label_scan: usize,
}

impl ForkView {
    pub fn new(fork: ForkId, max_label_scan: usize) -> Self {
        Self {
            fork,
            txs: BTreeSet::new(),
            by_sequence: BTreeMap::new(),
            by_type: BTreeMap::new(),
            spent: BTreeMap::new(),
            address_unspent: BTreeMap::new(),
            profile: None,
            relations: RelationTree::new(),
            mint_height_tx: None,
            last_block: Id::zero(),
            last_block_time: 0,
            max_label_scan,
        }
    }

    pub fn fork(&self) -> &ForkId {
        &self.fork
    }

    pub fn contains(&self, tx_id: &Id<Transaction>) -> bool {
        self.txs.contains(tx_id)
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    /// Pooled transaction ids in label order.
    pub fn ids_by_sequence(&self) -> impl DoubleEndedIterator<Item = &Id<Transaction>> {
        self.by_sequence.values()
    }

    /// Pooled transaction ids with labels strictly above `after`, in label order.
    pub fn ids_after(&self, after: SequenceNumber) -> impl Iterator<Item = &Id<Transaction>> {
        self.by_sequence.range((Bound::Excluded(after), Bound::Unbounded)).map(|(_, id)| id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &Id<Transaction>> {
        self.txs.iter()
    }

    pub fn ids_of_type(&self, tx_type: TxType) -> impl Iterator<Item = &Id<Transaction>> {
        self.by_type.get(&tx_type).into_iter().flatten()
    }

    pub fn profile(&self) -> Option<&ForkProfile> {
        self.profile.as_ref()
    }

    pub fn set_profile(&mut self, profile: ForkProfile) {
        self.profile = Some(profile);
    }

    pub fn relations(&self) -> &RelationTree {
        &self.relations
    }

    pub fn relations_mut(&mut self) -> &mut RelationTree {
        &mut self.relations
    }

    pub fn last_block(&self) -> &Id<Block> {
        &self.last_block
    }

    pub fn last_block_time(&self) -> u64 {
        self.last_block_time
    }

    pub fn set_last_block(&mut self, block: Id<Block>, time: u64) {
        self.last_block = block;
        self.last_block_time = time;
    }

    /// The pooled mint height transaction, if it is still in the view.
    pub fn mint_height_tx(&self) -> Option<&Id<Transaction>> {
        self.mint_height_tx.as_ref().filter(|id| self.txs.contains(*id))
    }

    pub fn set_mint_height_tx(&mut self, tx_id: Id<Transaction>) {
        self.mint_height_tx = Some(tx_id);
    }

    pub fn is_spent(&self, outpoint: &OutPoint) -> bool {
        matches!(self.spent.get(outpoint), Some(SpendRecord::Spent { .. }))
    }

    pub fn spender(&self, outpoint: &OutPoint) -> Option<&Id<Transaction>> {
        match self.spent.get(outpoint)? {
            SpendRecord::Spent { spender, .. } => Some(spender),
            SpendRecord::Unspent(_) => None,
        }
    }

    pub fn get_unspent(&self, outpoint: &OutPoint) -> Option<&TxOutput> {
        match self.spent.get(outpoint)? {
            SpendRecord::Unspent(output) => Some(output),
            SpendRecord::Spent { .. } => None,
        }
    }

    fn put_record(&mut self, outpoint: OutPoint, record: SpendRecord) -> Option<SpendRecord> {
        let previous = self.drop_record(&outpoint);
        let (dest, value) = match &record {
            SpendRecord::Unspent(output) => (output.dest_to, Some(output.clone())),
            SpendRecord::Spent { owner, .. } => (*owner, None),
        };
        self.address_unspent.entry(dest).or_default().insert(outpoint, value);
        self.spent.insert(outpoint, record);
        previous
    }

    fn drop_record(&mut self, outpoint: &OutPoint) -> Option<SpendRecord> {
        let previous = self.spent.remove(outpoint)?;
        let dest = match &previous {
            SpendRecord::Unspent(output) => output.dest_to,
            SpendRecord::Spent { owner, .. } => *owner,
        };
        if let Some(entries) = self.address_unspent.get_mut(&dest) {
            entries.remove(outpoint);
            if entries.is_empty() {
                self.address_unspent.remove(&dest);
            }
        }
        Some(previous)
    }

    fn restore_record(&mut self, outpoint: OutPoint, previous: Option<SpendRecord>) {
        match previous {
            Some(record) => {
                self.put_record(outpoint, record);
            }
            None => {
                self.drop_record(&outpoint);
            }
        }
    }

    /// Index a transaction that is already in `store` and update the overlay with its
    /// inputs and outputs.
    ///
    /// Labels of the transaction and of pooled ancestors are repaired so that every
    /// parent stays ordered before its children. On error nothing is changed.
    pub fn add_transaction(
        &mut self,
        store: &mut TxStore,
        tx_id: &Id<Transaction>,
    ) -> Result<(), Error> {
        let tx_type = store.get(tx_id).ok_or(Error::NotFound(*tx_id))?.tx_type();
        let mut journal = Vec::new();
        match self.add_journaled(store, tx_id, &mut journal) {
            Ok(()) => {
                self.txs.insert(*tx_id);
                self.by_type.entry(tx_type).or_default().insert(*tx_id);
                Ok(())
            }
            Err(e) => {
                self.rollback(store, journal);
                Err(e)
            }
        }
    }

    fn add_journaled(
        &mut self,
        store: &mut TxStore,
        tx_id: &Id<Transaction>,
        journal: &mut Vec<Undo>,
    ) -> Result<(), Error> {
        self.index_tx(store, tx_id, journal)?;

        let entry = store.get(tx_id).ok_or(Error::NotFound(*tx_id))?;
        let dest_in = *entry.dest_in();
        let inputs = entry.transaction().inputs().to_vec();
        let outputs: Vec<_> = entry.outpoints().collect();
        let sequence = entry.sequence();

        for input in &inputs {
            let previous = self.put_record(
                *input,
                SpendRecord::Spent {
                    spender: *tx_id,
                    owner: dest_in,
                },
            );
            journal.push(Undo::Record {
                outpoint: *input,
                previous,
            });
        }

        // Outputs already spent by pooled children keep their records
        for (outpoint, output) in outputs {
            if !self.is_spent(&outpoint) {
                let previous = self.put_record(outpoint, SpendRecord::Unspent(output));
                journal.push(Undo::Record { outpoint, previous });
            }
        }

        let mut worklist: Vec<(Id<Transaction>, SequenceNumber)> =
            inputs.iter().map(|input| (input.tx_id(), sequence)).collect();
        let mut i = 0;
        while i < worklist.len() {
            let (prev_id, spender_sequence) = worklist[i];
            i += 1;

            if !self.txs.contains(&prev_id) {
                continue;
            }
            let prev = store.get(&prev_id).ok_or(Error::NotFound(prev_id))?;
            if prev.sequence() < spender_sequence {
                continue;
            }

            self.index_tx(store, &prev_id, journal)?;
            let prev = store.get(&prev_id).ok_or(Error::NotFound(prev_id))?;
            let prev_sequence = prev.sequence();
            worklist.extend(
                prev.transaction().inputs().iter().map(|input| (input.tx_id(), prev_sequence)),
            );
        }

        Ok(())
    }

    /// (Re)assign the label of `tx_id` so it sits below its smallest pooled child.
    fn index_tx(
        &mut self,
        store: &mut TxStore,
        tx_id: &Id<Transaction>,
        journal: &mut Vec<Undo>,
    ) -> Result<(), Error> {
        let current = store.sequence_of(tx_id).ok_or(Error::NotFound(*tx_id))?;
        if self.by_sequence.get(&current) == Some(tx_id) {
            self.by_sequence.remove(&current);
            journal.push(Undo::Label {
                sequence: current,
                previous: Some(*tx_id),
            });
        }

        let mut min_child: Option<SequenceNumber> = None;
        for index in [Transaction::PAYMENT_OUTPUT, Transaction::CHANGE_OUTPUT] {
            if let Some(spender) = self.spender(&OutPoint::new(*tx_id, index)) {
                let child = store.sequence_of(spender).ok_or(Error::NotFound(*spender))?;
                min_child = Some(min_child.map_or(child, |m| m.min(child)));
            }
        }

        let sequence = match min_child {
            Some(child) => self.label_below(store, child, journal)?,
            None => current,
        };
        utils::ensure!(
            !self.by_sequence.contains_key(&sequence),
            SequenceError::LabelCollision(sequence)
        );

        if sequence != current {
            let entry = store.get_mut(tx_id).ok_or(Error::NotFound(*tx_id))?;
            journal.push(Undo::Entry {
                tx_id: *tx_id,
                sequence: current,
                next_sequence: entry.next_sequence(),
            });
            entry.set_sequence(sequence);
            log::trace!("Relabelled {tx_id} from {current} to {sequence}");
        }
        self.by_sequence.insert(sequence, *tx_id);
        journal.push(Undo::Label {
            sequence,
            previous: None,
        });
        Ok(())
    }

    /// A free label below `child`, taken from the bucket root's cursor when the root is
    /// pooled, otherwise found by scanning down the bucket.
    fn label_below(
        &self,
        store: &mut TxStore,
        child: SequenceNumber,
        journal: &mut Vec<Undo>,
    ) -> Result<SequenceNumber, Error> {
        let root = child.bucket_root().ok_or(SequenceError::BucketExhausted(child))?;
        let floor = child.bucket_floor().ok_or(SequenceError::BucketExhausted(child))?;

        if let Some(root_id) = self.by_sequence.get(&root) {
            let entry = store.get_mut(root_id).ok_or(Error::NotFound(*root_id))?;
            let cursor = entry.next_sequence().unwrap_or(SequenceNumber::new(root.into_int() - 1));
            utils::ensure!(
                cursor.into_int() > floor && cursor < root,
                SequenceError::BucketExhausted(root)
            );
            journal.push(Undo::Entry {
                tx_id: *root_id,
                sequence: entry.sequence(),
                next_sequence: entry.next_sequence(),
            });
            entry.set_next_sequence(Some(SequenceNumber::new(cursor.into_int() - 1)));
            return Ok(cursor);
        }

        let mut candidate = child.into_int() - 1;
        let mut scanned = 0;
        for occupied in self.by_sequence.range(..child).rev().map(|(seq, _)| seq.into_int()) {
            if occupied != candidate || candidate <= floor {
                break;
            }
            scanned += 1;
            utils::ensure!(
                scanned <= self.max_label_scan,
                SequenceError::ScanLimitExceeded {
                    label: child,
                    scanned,
                }
            );
            candidate -= 1;
        }
        utils::ensure!(candidate > floor, SequenceError::BucketExhausted(root));
        Ok(SequenceNumber::new(candidate))
    }

    fn rollback(&mut self, store: &mut TxStore, journal: Vec<Undo>) {
        for undo in journal.into_iter().rev() {
            match undo {
                Undo::Entry {
                    tx_id,
                    sequence,
                    next_sequence,
                } => {
                    if let Some(entry) = store.get_mut(&tx_id) {
                        entry.set_sequence(sequence);
                        entry.set_next_sequence(next_sequence);
                    }
                }
                Undo::Label { sequence, previous } => match previous {
                    Some(tx_id) => {
                        self.by_sequence.insert(sequence, tx_id);
                    }
                    None => {
                        self.by_sequence.remove(&sequence);
                    }
                },
                Undo::Record { outpoint, previous } => self.restore_record(outpoint, previous),
            }
        }
    }

    /// Drop a transaction from the indices. Its overlay records are left to the caller.
    fn unindex(&mut self, entry: &PooledTx) {
        let tx_id = entry.tx_id();
        self.txs.remove(tx_id);
        if self.by_sequence.get(&entry.sequence()) == Some(tx_id) {
            self.by_sequence.remove(&entry.sequence());
        }
        if let Some(ids) = self.by_type.get_mut(&entry.tx_type()) {
            ids.remove(tx_id);
            if ids.is_empty() {
                self.by_type.remove(&entry.tx_type());
            }
        }
        if self.mint_height_tx.as_ref() == Some(tx_id) {
            self.mint_height_tx = None;
        }
        if entry.transaction().is_defi_relation() {
            self.relations.remove(entry.transaction().send_to());
        }
    }

    /// Take a transaction out of the view. Its inputs go back to their pooled creators
    /// (or are forgotten), unspent outputs are forgotten and outputs spent by pooled
    /// transactions keep their records.
    ///
    /// This is all that is needed when the transaction got confirmed.
    pub fn remove_transaction(&mut self, store: &TxStore, tx_id: &Id<Transaction>) -> bool {
        let Some(entry) = store.get(tx_id).filter(|_| self.txs.contains(tx_id)) else {
            return false;
        };
        self.unindex(entry);
        for input in entry.transaction().inputs() {
            self.restore_unspent(store, input);
        }
        for (outpoint, _) in entry.outpoints() {
            if !self.is_spent(&outpoint) {
                self.drop_record(&outpoint);
            }
        }
        true
    }

    /// Undo the spend of `outpoint` and evict every pooled transaction that depended on
    /// it. Returns the evicted ids; the entries are left in `store`.
    pub fn invalidate_spent(
        &mut self,
        store: &TxStore,
        outpoint: OutPoint,
    ) -> Vec<Id<Transaction>> {
        let mut evicted = Vec::new();
        let mut worklist = vec![outpoint];
        let mut i = 0;
        while i < worklist.len() {
            let outpoint = worklist[i];
            i += 1;

            let spender = self.spender(&outpoint).copied().filter(|id| self.txs.contains(id));
            let Some(entry) = spender.and_then(|id| store.get(&id)) else {
                // An output of a live parent stays spendable
                self.restore_unspent(store, &outpoint);
                continue;
            };

            for input in entry.transaction().inputs() {
                self.restore_unspent(store, input);
            }
            for index in [Transaction::PAYMENT_OUTPUT, Transaction::CHANGE_OUTPUT] {
                let output = OutPoint::new(*entry.tx_id(), index);
                if self.is_spent(&output) {
                    worklist.push(output);
                } else {
                    self.drop_record(&output);
                }
            }
            self.unindex(entry);
            evicted.push(*entry.tx_id());
        }
        evicted
    }

    /// Give `outpoint` back to its creator if that is pooled here, otherwise forget it.
    fn restore_unspent(&mut self, store: &TxStore, outpoint: &OutPoint) {
        let output = store
            .get(&outpoint.tx_id())
            .filter(|prev| self.txs.contains(prev.tx_id()))
            .and_then(|prev| prev.output(outpoint.index()));
        match output {
            Some(output) => {
                self.put_record(*outpoint, SpendRecord::Unspent(output));
            }
            None => {
                self.drop_record(outpoint);
            }
        }
    }

    /// Remove a pooled transaction together with everything built on its outputs.
    pub fn evict_transaction(
        &mut self,
        store: &TxStore,
        tx_id: &Id<Transaction>,
    ) -> Vec<Id<Transaction>> {
        if !self.remove_transaction(store, tx_id) {
            return Vec::new();
        }
        let mut evicted = vec![*tx_id];
        for index in [Transaction::PAYMENT_OUTPUT, Transaction::CHANGE_OUTPUT] {
            evicted.extend(self.invalidate_spent(store, OutPoint::new(*tx_id, index)));
        }
        evicted
    }

    /// Pooled transactions spending outputs of `tx_id`, directly or transitively.
    pub fn collect_descendants(
        &self,
        store: &TxStore,
        tx_id: &Id<Transaction>,
    ) -> BTreeSet<Id<Transaction>> {
        let mut found = BTreeSet::new();
        let mut worklist = vec![*tx_id];
        while let Some(current) = worklist.pop() {
            for index in [Transaction::PAYMENT_OUTPUT, Transaction::CHANGE_OUTPUT] {
                if let Some(spender) = self.spender(&OutPoint::new(current, index)) {
                    if store.contains(spender) && found.insert(*spender) {
                        worklist.push(*spender);
                    }
                }
            }
        }
        found
    }

    /// Unspent outputs the pool created for `dest`, skipping `exclude`; `max == 0` means
    /// no limit.
    pub fn list_unspent(
        &self,
        dest: &Destination,
        exclude: &BTreeSet<OutPoint>,
        max: usize,
    ) -> Vec<TxUnspent> {
        let Some(entries) = self.address_unspent.get(dest) else {
            return Vec::new();
        };
        let iter = entries
            .iter()
            .filter(|(outpoint, _)| !exclude.contains(outpoint))
            .filter_map(|(outpoint, output)| {
                output.as_ref().map(|output| TxUnspent {
                    outpoint: *outpoint,
                    output: output.clone(),
                })
            });
        if max == 0 {
            iter.collect()
        } else {
            iter.take(max).collect()
        }
    }

    /// Apply the pool's changes for `dest` to `unspent`: outputs the pool spends are
    /// removed, outputs it creates are added.
    pub fn apply_address_unspent(
        &self,
        dest: &Destination,
        unspent: &mut BTreeMap<OutPoint, TxOutput>,
    ) {
        for (outpoint, output) in self.address_unspent.get(dest).into_iter().flatten() {
            match output {
                Some(output) => {
                    unspent.insert(*outpoint, output.clone());
                }
                None => {
                    unspent.remove(outpoint);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.txs.clear();
        self.by_sequence.clear();
        self.by_type.clear();
        self.spent.clear();
        self.address_unspent.clear();
        self.relations.clear();
        self.mint_height_tx = None;
    }

    #[cfg(test)]
    pub fn spend_record(&self, outpoint: &OutPoint) -> Option<&SpendRecord> {
        self.spent.get(outpoint)
    }

    #[cfg(test)]
    pub fn sequence_index(&self) -> &BTreeMap<SequenceNumber, Id<Transaction>> {
        &self.by_sequence
    }
}
