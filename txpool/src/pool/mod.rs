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

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use parking_lot::RwLock;

use common::{
    chain::{Block, Destination, ForkId, OutPoint, Transaction, TxOutput, TxType},
    primitives::{Amount, BlockHeight, Id},
    time_getter::TimeGetter,
};
use logging::log;
use utils::{ensure, tap_log::TapLog};

use crate::{
    config::TxPoolConfig,
    error::{Error, QuotaError, TxValidationError},
    interface::{ChainUpdate, Ledger, TxVerifier},
    storage::TxPoolStorage,
    tx_accumulator::{DefaultTxAccumulator, TransactionAccumulator},
    types::{ArrangedBlock, AssembledTx, ListMode, StoredTx, TxInfo, TxSetChange, TxUnspent},
};

use self::{
    address_stats::AddressStats,
    arrange_cache::ArrangeCache,
    cert_cache::CertTxCache,
    entry::{PooledTx, TxStore},
    fork_view::{ArrangeParams, ArrangeResult, CertPolicy, ForkView},
    sequence::SequenceAllocator,
};

pub use self::{address_stats::AddressAggregate, sequence::SequenceNumber};

mod address_stats;
mod arrange_cache;
mod cert_cache;
mod entry;
mod fork_view;
mod reorg;
mod sequence;

/// What the pool learned about a transaction while admitting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    pub fork: ForkId,
    pub dest_in: Destination,
    pub value_in: Amount,
}

/// Multi-fork pool of unconfirmed transactions.
///
/// All pool state sits behind one lock. Per-destination aggregates have their own lock so
/// balance queries never wait for admission or chain synchronization.
pub struct TxPool {
    state: RwLock<PoolState>,
    stats: Arc<RwLock<AddressStats>>,
    storage: Arc<dyn TxPoolStorage>,
}

struct PoolState {
    config: TxPoolConfig,
    ledger: Arc<dyn Ledger>,
    verifier: Arc<dyn TxVerifier>,
    store: TxStore,
    views: BTreeMap<ForkId, ForkView>,
    cert_cache: CertTxCache,
    arrange_cache: ArrangeCache,
    sequence: SequenceAllocator,
    stats: Arc<RwLock<AddressStats>>,
}

struct Admitted {
    outcome: PushOutcome,
    /// Entries that had to leave the pool to make room, e.g. a timed out certificate.
    evicted: Vec<PooledTx>,
}

impl TxPool {
    pub fn new(
        config: TxPoolConfig,
        ledger: Arc<dyn Ledger>,
        verifier: Arc<dyn TxVerifier>,
        storage: Arc<dyn TxPoolStorage>,
        time_getter: TimeGetter,
    ) -> Self {
        log::debug!("Creating transaction pool with {config:?}");
        let stats = Arc::new(RwLock::new(AddressStats::new()));
        let state = PoolState {
            cert_cache: CertTxCache::new(
                config.cert_tx_timeout(),
                config.max_cert_tx_per_destination,
                time_getter,
            ),
            arrange_cache: ArrangeCache::new(config.arrange_cache_depth),
            config,
            ledger,
            verifier,
            store: TxStore::new(),
            views: BTreeMap::new(),
            sequence: SequenceAllocator::new(),
            stats: Arc::clone(&stats),
        };
        Self {
            state: RwLock::new(state),
            stats,
            storage,
        }
    }

    /// Admit a transaction into the fork its anchor block belongs to.
    pub fn push(&self, tx: Transaction) -> Result<PushOutcome, Error> {
        let tx_id = tx.get_id();
        let mut state = self.state.write();

        ensure!(!state.store.contains(&tx_id), Error::AlreadyPresent(tx_id));
        ensure!(!tx.is_reward(), TxValidationError::RewardTransaction);

        let location = state
            .ledger
            .block_location(&tx.anchor())?
            .ok_or(TxValidationError::UnknownAnchor(tx.anchor()))?;
        let status = state.ledger.last_block_status(&location.fork)?;

        match state.add_new(location.fork, tx, status.last_height) {
            Ok(admitted) => {
                log::debug!("Transaction {tx_id} added to fork {}", location.fork);
                Ok(admitted.outcome)
            }
            Err(e) => {
                log::debug!("Transaction {tx_id} rejected: {e}");
                Err(e)
            }
        }
    }

    /// Evict a transaction and everything depending on it. Returns the evicted ids.
    pub fn remove(&self, tx_id: &Id<Transaction>) -> Result<Vec<Id<Transaction>>, Error> {
        let mut state = self.state.write();
        ensure!(state.store.contains(tx_id), Error::NotFound(*tx_id));
        let evicted: Vec<_> = state.remove_tx(tx_id).iter().map(|e| *e.tx_id()).collect();
        log::debug!("Removed {tx_id} and {} dependants", evicted.len().saturating_sub(1));
        Ok(evicted)
    }

    /// Reconcile a fork with a change of its best chain.
    pub fn synchronize(&self, update: &ChainUpdate) -> Result<TxSetChange, Error> {
        self.state.write().synchronize(update)
    }

    /// Transactions for the block at `height` on top of `prev`.
    ///
    /// For the current tip of the fork the list is arranged afresh. For an older block
    /// only an arrangement cached when that block was the tip can be served.
    pub fn fetch_arrange_block_tx(
        &self,
        fork: &ForkId,
        prev: &Id<Block>,
        height: BlockHeight,
        block_time: u64,
        max_size: usize,
    ) -> Result<ArrangedBlock, Error> {
        let state = self.state.read();
        let Some(view) = state.views.get(fork) else {
            return Ok(ArrangedBlock::default());
        };

        if view.last_block() == prev {
            let arranged = state.arrange(fork, *prev, block_time, height, max_size)?;
            log::debug!(
                "Arranged {} transactions on tip {prev} of fork {fork} for height {height}",
                arranged.block.txs.len()
            );
            return Ok(arranged.block);
        }

        match state.arrange_cache.get(fork, prev) {
            Some(cached) if cached.height == height => Ok(truncate(&cached.block, max_size)),
            _ => Err(Error::ArrangementUnavailable {
                fork: *fork,
                anchor: *prev,
            }),
        }
    }

    /// Re-admit the persisted transactions. Returns how many made it back in.
    pub fn load(&self) -> Result<usize, Error> {
        let stored = self.storage.load()?;
        self.state.write().load(stored)
    }

    /// Persist every pooled transaction in label order. Returns how many were written.
    pub fn save(&self) -> Result<usize, Error> {
        let txs = self.state.read().snapshot();
        self.storage.save(&txs)?;
        log::info!("Saved {} pooled transactions", txs.len());
        Ok(txs.len())
    }

    pub fn exists(&self, tx_id: &Id<Transaction>) -> bool {
        self.state.read().store.contains(tx_id)
    }

    pub fn get(&self, tx_id: &Id<Transaction>) -> Option<Transaction> {
        self.state.read().store.get(tx_id).map(|e| e.transaction().clone())
    }

    pub fn get_pooled(&self, tx_id: &Id<Transaction>) -> Option<AssembledTx> {
        self.state.read().store.get(tx_id).map(PooledTx::to_assembled)
    }

    pub fn sequence_of(&self, tx_id: &Id<Transaction>) -> Option<SequenceNumber> {
        self.state.read().store.sequence_of(tx_id)
    }

    pub fn count(&self, fork: &ForkId) -> usize {
        self.state.read().views.get(fork).map_or(0, ForkView::len)
    }

    /// Ids and sizes of the fork's transactions in label order.
    pub fn list_tx(&self, fork: &ForkId) -> Vec<(Id<Transaction>, usize)> {
        let state = self.state.read();
        let Some(view) = state.views.get(fork) else {
            return Vec::new();
        };
        state.in_label_order(view).map(|e| (*e.tx_id(), e.size())).collect()
    }

    /// Transactions touching `dest` (all of them for `None`), in label order.
    pub fn list_tx_by_destination(
        &self,
        fork: &ForkId,
        dest: Option<&Destination>,
        mode: ListMode,
    ) -> Result<Vec<TxInfo>, Error> {
        let state = self.state.read();
        let view = state.views.get(fork).ok_or(Error::UnknownFork(*fork))?;
        let matches = state
            .in_label_order(view)
            .filter(|e| dest.is_none_or(|dest| e.touches(dest)))
            .map(PooledTx::to_info);

        let txs = match mode {
            ListMode::Range { offset, count } => {
                let matches = matches.skip(offset);
                if count == 0 {
                    matches.collect()
                } else {
                    matches.take(count).collect()
                }
            }
            ListMode::Latest(count) => {
                let all: Vec<_> = matches.collect();
                let start = if count == 0 { 0 } else { all.len().saturating_sub(count) };
                all[start..].to_vec()
            }
        };
        Ok(txs)
    }

    /// Up to `count` (0 for all) transactions touching `dest` labelled after `after`.
    pub fn list_tx_after_sequence(
        &self,
        fork: &ForkId,
        dest: Option<&Destination>,
        after: SequenceNumber,
        count: usize,
    ) -> Result<Vec<TxInfo>, Error> {
        let state = self.state.read();
        let view = state.views.get(fork).ok_or(Error::UnknownFork(*fork))?;
        let matches = view
            .ids_after(after)
            .filter_map(|id| state.store.get(id))
            .filter(|e| dest.is_none_or(|dest| e.touches(dest)))
            .map(PooledTx::to_info);
        Ok(if count == 0 {
            matches.collect()
        } else {
            matches.take(count).collect()
        })
    }

    /// Merge confirmed unspent outputs of `dest` with the pool: outputs spent by pooled
    /// transactions are dropped and outputs created by them are appended. `max == 0`
    /// means no limit.
    pub fn list_fork_unspent(
        &self,
        fork: &ForkId,
        dest: &Destination,
        max: usize,
        on_chain: &[TxUnspent],
    ) -> Result<Vec<TxUnspent>, Error> {
        let state = self.state.read();
        let view = state.views.get(fork).ok_or(Error::UnknownFork(*fork))?;
        Ok(list_unspent(view, dest, max, on_chain))
    }

    pub fn list_fork_unspent_batch(
        &self,
        fork: &ForkId,
        max: usize,
        on_chain: &BTreeMap<Destination, Vec<TxUnspent>>,
    ) -> Result<BTreeMap<Destination, Vec<TxUnspent>>, Error> {
        let state = self.state.read();
        let view = state.views.get(fork).ok_or(Error::UnknownFork(*fork))?;
        Ok(on_chain
            .iter()
            .map(|(dest, unspent)| (*dest, list_unspent(view, dest, max, unspent)))
            .collect())
    }

    /// Apply the pool's changes to a destination's confirmed unspent set.
    ///
    /// `chain_tip` is the block the caller's set was read at; it has to match the block
    /// the pool last synchronized to.
    pub fn address_unspent(
        &self,
        fork: &ForkId,
        dest: &Destination,
        chain_tip: &Id<Block>,
        unspent: &mut BTreeMap<OutPoint, TxOutput>,
    ) -> Result<(), Error> {
        let state = self.state.read();
        let view = state.views.get(fork).ok_or(Error::UnknownFork(*fork))?;
        ensure!(
            view.last_block() == chain_tip,
            Error::TipMismatch {
                pool: *view.last_block(),
                caller: *chain_tip,
            }
        );
        view.apply_address_unspent(dest, unspent);
        Ok(())
    }

    /// Feed every pooled transaction touching one of `dests` to `visitor` until it
    /// returns `false`. Returns `false` if the visitor stopped early.
    pub fn filter_tx<F>(&self, fork: &ForkId, dests: &BTreeSet<Destination>, mut visitor: F) -> bool
    where
        F: FnMut(&AssembledTx) -> bool,
    {
        let state = self.state.read();
        let Some(view) = state.views.get(fork) else {
            return true;
        };
        for entry in view.ids().filter_map(|id| state.store.get(id)) {
            let touches =
                dests.contains(entry.dest_in()) || dests.contains(entry.transaction().send_to());
            if touches && !visitor(&entry.to_assembled()) {
                log::debug!("Filter stopped at {}", entry.tx_id());
                return false;
            }
        }
        true
    }

    /// Resolve the outputs `tx` would spend, from the pool first and the ledger after.
    pub fn fetch_inputs(&self, fork: &ForkId, tx: &Transaction) -> Result<Vec<TxOutput>, Error> {
        let state = self.state.read();
        let inputs = match state.views.get(fork) {
            Some(view) => state.resolve_inputs(fork, view, tx)?,
            None => state.resolve_inputs(fork, &ForkView::new(*fork, 0), tx)?,
        };

        if let Some((first, rest)) = inputs.split_first() {
            if let Some(other) = rest.iter().find(|out| out.dest_to != first.dest_to) {
                return Err(TxValidationError::MixedInputDestinations {
                    first: first.dest_to,
                    other: other.dest_to,
                }
                .into());
            }
        }
        Ok(inputs)
    }

    /// Exempt `dest` from the certificate quota.
    pub fn register_delegate(&self, dest: Destination) {
        self.state.write().cert_cache.register_delegate(dest);
    }

    pub fn address_tx_count(&self, dest: &Destination) -> u64 {
        self.stats.read().get(dest).tx_count
    }

    /// Net change the pooled transactions make to the balance of `dest`.
    pub fn address_pooled_amount(&self, dest: &Destination) -> i128 {
        self.stats.read().get(dest).amount_delta
    }

    pub fn address_aggregate(&self, dest: &Destination) -> AddressAggregate {
        self.stats.read().get(dest)
    }

    pub fn clear(&self) {
        let mut state = self.state.write();
        state.views.clear();
        state.store.clear();
        state.cert_cache.clear();
        state.arrange_cache.clear();
        state.sequence.reset();
        state.stats.write().clear();
        log::info!("Transaction pool cleared");
    }
}

fn list_unspent(
    view: &ForkView,
    dest: &Destination,
    max: usize,
    on_chain: &[TxUnspent],
) -> Vec<TxUnspent> {
    let mut result = Vec::new();
    let mut seen = BTreeSet::new();
    for unspent in on_chain {
        if max != 0 && result.len() >= max {
            return result;
        }
        if !view.is_spent(&unspent.outpoint) {
            seen.insert(unspent.outpoint);
            result.push(unspent.clone());
        }
    }
    let remaining = if max == 0 { 0 } else { max - result.len() };
    if max != 0 && remaining == 0 {
        return result;
    }
    result.extend(view.list_unspent(dest, &seen, remaining));
    result
}

/// Keep the leading transactions of `block` that fit into `max_size`.
fn truncate(block: &ArrangedBlock, max_size: usize) -> ArrangedBlock {
    let mut acc = DefaultTxAccumulator::new(max_size);
    for tx in &block.txs {
        let _ = acc.add_tx(tx.clone(), tx.encoded_size(), tx.tx_fee()).log_err();
        if acc.done() {
            break;
        }
    }
    acc.into_block()
}

impl PoolState {
    fn view_mut(&mut self, fork: ForkId) -> &mut ForkView {
        let max_scan = self.config.max_free_label_scan;
        self.views.entry(fork).or_insert_with(|| ForkView::new(fork, max_scan))
    }

    fn in_label_order<'a>(&'a self, view: &'a ForkView) -> impl Iterator<Item = &'a PooledTx> {
        view.ids_by_sequence().filter_map(|id| self.store.get(id))
    }

    /// Outputs spent by `tx`, position by position.
    fn resolve_inputs(
        &self,
        fork: &ForkId,
        view: &ForkView,
        tx: &Transaction,
    ) -> Result<Vec<TxOutput>, Error> {
        let tx_id = tx.get_id();
        let conflict = |outpoint: &OutPoint| Error::ConflictingInput {
            tx_id,
            outpoint: *outpoint,
        };

        let mut resolved = Vec::with_capacity(tx.inputs().len());
        for input in tx.inputs() {
            ensure!(!view.is_spent(input), conflict(input));
            resolved.push(view.get_unspent(input).cloned());
        }

        let missing: Vec<OutPoint> = tx
            .inputs()
            .iter()
            .zip(&resolved)
            .filter(|(_, output)| output.is_none())
            .map(|(input, _)| *input)
            .collect();
        if !missing.is_empty() {
            let mut from_ledger = self.ledger.resolve_unspent(fork, &missing)?.into_iter();
            for slot in resolved.iter_mut().filter(|slot| slot.is_none()) {
                *slot = from_ledger.next().flatten();
            }
        }

        tx.inputs()
            .iter()
            .zip(resolved)
            .map(|(input, output)| output.ok_or_else(|| conflict(input)))
            .collect()
    }

    /// Validate and admit `tx` into `fork`, as seen at chain `height`.
    ///
    /// Nothing changes unless the transaction is admitted. A fork without a view gets one,
    /// anchored at the ledger's tip, only then.
    fn add_new(
        &mut self,
        fork: ForkId,
        tx: Transaction,
        height: BlockHeight,
    ) -> Result<Admitted, Error> {
        let tx_id = tx.get_id();
        ensure!(!tx.inputs().is_empty(), TxValidationError::NoInputs);

        let unseen;
        let (view, new_view_tip) = match self.views.get(&fork) {
            Some(view) => (view, None),
            None => {
                unseen = ForkView::new(fork, 0);
                (&unseen, Some(self.ledger.last_block_status(&fork)?))
            }
        };

        let inputs = self.resolve_inputs(&fork, view, &tx)?;
        let value_in = Amount::sum(inputs.iter().map(|out| out.amount))
            .ok_or(TxValidationError::InputValueOverflow)?;

        let profile = match view.profile() {
            Some(profile) => profile.clone(),
            None => self.ledger.fork_profile(&fork)?,
        };

        self.verifier.verify_transaction(&tx, &inputs, height, &fork, &profile)?;

        let dest_in = inputs[0].dest_to;
        let send_to = *tx.send_to();
        let tx_type = tx.tx_type();

        let mut expired_cert = None;
        if tx.is_certification() {
            expired_cert = self.cert_cache.oldest_expired(&send_to);
            if let Some(expired) = &expired_cert {
                // Inputs must not come from what the eviction takes with it
                let mut doomed = view.collect_descendants(&self.store, expired);
                doomed.insert(*expired);
                if let Some(input) = tx.inputs().iter().find(|i| doomed.contains(&i.tx_id())) {
                    return Err(Error::ConflictingInput {
                        tx_id,
                        outpoint: *input,
                    });
                }
            } else {
                ensure!(
                    !self.cert_cache.is_over_quota(&send_to),
                    QuotaError::TooManyCertTxs(send_to)
                );
            }
        }

        if tx_type == TxType::DefiMintHeight {
            if let Some(existing) = view.mint_height_tx() {
                return Err(QuotaError::DuplicateMintHeightTx {
                    fork,
                    existing: *existing,
                }
                .into());
            }
        }

        if tx.is_defi_relation() {
            ensure!(profile.is_defi(), TxValidationError::RelationNotAllowed);
            let root = view.relations().check_insert(&send_to, &dest_in)?;
            ensure!(
                self.ledger.check_add_relation(&fork, &send_to, &root)?,
                TxValidationError::RelationRejected {
                    dest: send_to,
                    root
                }
            );
        }

        let sequence = self.sequence.next_root()?;
        self.store.insert(PooledTx::new(tx, fork, sequence, dest_in, value_in));

        let max_scan = self.config.max_free_label_scan;
        let view = self.views.entry(fork).or_insert_with(|| ForkView::new(fork, max_scan));
        if let Some(status) = new_view_tip {
            view.set_last_block(status.last_block, status.last_time);
        }
        if view.profile().is_none() {
            view.set_profile(profile);
        }

        let mut indexed = Ok(());
        if tx_type == TxType::DefiRelation {
            indexed = view
                .relations_mut()
                .insert(send_to, dest_in, tx_id)
                .map(|_| ())
                .map_err(Error::from);
        }
        if indexed.is_ok() {
            indexed = view.add_transaction(&mut self.store, &tx_id);
            if indexed.is_err() && tx_type == TxType::DefiRelation {
                view.relations_mut().remove(&send_to);
            }
        }
        if let Err(e) = indexed {
            self.store.remove(&tx_id);
            if new_view_tip.is_some() {
                self.views.remove(&fork);
            }
            return Err(e);
        }
        if tx_type == TxType::DefiMintHeight {
            view.set_mint_height_tx(tx_id);
        }

        let evicted = match expired_cert {
            Some(expired) => {
                log::info!("Evicting timed out certificate {expired} to admit {tx_id}");
                self.remove_tx(&expired)
            }
            None => Vec::new(),
        };

        let entry = self.store.get(&tx_id).ok_or(Error::NotFound(tx_id)).log_err()?;
        self.stats.write().on_admit(entry);
        if tx_type == TxType::Certification {
            self.cert_cache.record(send_to, tx_id);
        }

        Ok(Admitted {
            outcome: PushOutcome {
                fork,
                dest_in,
                value_in,
            },
            evicted,
        })
    }

    /// Evict a pooled transaction with its dependants and drop them from the table.
    fn remove_tx(&mut self, tx_id: &Id<Transaction>) -> Vec<PooledTx> {
        let Some(fork) = self.store.get(tx_id).map(|e| *e.fork()) else {
            log::error!("Transaction {tx_id} to remove is not in the pool");
            return Vec::new();
        };
        let Some(view) = self.views.get_mut(&fork) else {
            log::error!("Fork {fork} of pooled transaction {tx_id} has no view");
            return Vec::new();
        };
        let evicted = view.evict_transaction(&self.store, tx_id);
        self.take_entries(evicted)
    }

    fn take_entries(&mut self, ids: Vec<Id<Transaction>>) -> Vec<PooledTx> {
        ids.into_iter().filter_map(|id| self.drop_entry(&id)).collect()
    }

    /// Drop an entry the fork view no longer references.
    fn drop_entry(&mut self, tx_id: &Id<Transaction>) -> Option<PooledTx> {
        let entry = self.store.remove(tx_id)?;
        if entry.transaction().is_certification() {
            self.cert_cache.forget(entry.transaction().send_to(), tx_id);
        }
        self.stats.write().on_remove(&entry);
        Some(entry)
    }

    fn arrange(
        &self,
        fork: &ForkId,
        last_block: Id<Block>,
        block_time: u64,
        height: BlockHeight,
        max_size: usize,
    ) -> Result<ArrangeResult, Error> {
        let Some(view) = self.views.get(fork) else {
            return Ok(ArrangeResult::default());
        };
        let cert_policy = if *fork == self.ledger.primary_fork() {
            Some(CertPolicy {
                remaining: self.ledger.delegate_cert_tx_counts(&last_block)?,
                votes: self.ledger.delegate_votes(&last_block)?,
                min_enroll: self.ledger.min_enroll_amount(&last_block)?,
            })
        } else {
            None
        };
        let params = ArrangeParams {
            last_block,
            block_time,
            height,
            max_size,
            min_tx_fee: self.config.min_tx_fee(),
            cert_policy,
            verifier: self.verifier.as_ref(),
        };
        Ok(view.build_block_tx_list(&self.store, params))
    }

    fn snapshot(&self) -> Vec<StoredTx> {
        let mut txs = Vec::with_capacity(self.store.len());
        for (fork, view) in &self.views {
            for entry in view.ids().filter_map(|id| self.store.get(id)) {
                let stored = StoredTx {
                    fork: *fork,
                    tx_id: *entry.tx_id(),
                    tx: entry.to_assembled(),
                };
                txs.push((entry.sequence(), stored));
            }
        }
        txs.sort_by_key(|(sequence, _)| *sequence);
        txs.into_iter().map(|(_, stored)| stored).collect()
    }

    fn load(&mut self, stored: Vec<StoredTx>) -> Result<usize, Error> {
        let statuses = self.ledger.fork_statuses()?;

        let mut loaded = 0;
        for StoredTx { fork, tx_id, tx } in stored {
            let Some(status) = statuses.get(&fork) else {
                log::error!("Skipping stored transaction {tx_id}: fork {fork} is unknown");
                continue;
            };
            if self.store.contains(&tx_id) {
                log::debug!("Stored transaction {tx_id} is already pooled");
                continue;
            }
            match self.add_new(fork, tx.tx, status.last_height.next_height()) {
                Ok(_) => loaded += 1,
                Err(e) => log::warn!("Failed to restore transaction {tx_id}: {e}"),
            }
        }

        for (fork, status) in &statuses {
            self.view_mut(*fork);
            let arranged = self
                .arrange(
                    fork,
                    status.last_block,
                    status.last_time + 1,
                    status.last_height.next_height(),
                    self.config.max_block_size,
                )
                .log_err_pfx("Arranging restored transactions");
            if let Ok(arranged) = arranged {
                self.arrange_cache.insert(
                    *fork,
                    status.last_block,
                    status.last_height.next_height(),
                    arranged.block,
                );
            }
            self.view_mut(*fork).set_last_block(status.last_block, status.last_time);
        }

        log::info!("Restored {loaded} pooled transactions");
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests;
