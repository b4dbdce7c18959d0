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

//! Reconciling a fork view with a change of the fork's best chain

use std::cmp::Reverse;

use common::{
    chain::{ForkId, OutPoint, Transaction, TxType},
    primitives::Id,
};
use logging::log;
use utils::tap_log::TapLog;

use super::{entry::PooledTx, PoolState};
use crate::{
    error::Error,
    interface::{BlockEx, ChainUpdate},
    types::{AssembledTx, TxSetChange},
};

/// Collects what a chain update did to the pool.
struct Reconciliation {
    change: TxSetChange,
    /// Entries evicted because something they depended on went away.
    evicted: Vec<PooledTx>,
    /// Transactions of disconnected blocks that could not return to the pool.
    dropped: Vec<(Id<Transaction>, Vec<OutPoint>)>,
}

impl Reconciliation {
    fn into_change(mut self) -> TxSetChange {
        self.evicted.sort_by_key(|entry| Reverse(entry.sequence()));
        self.change.removed = self
            .evicted
            .iter()
            .map(|entry| (*entry.tx_id(), entry.transaction().inputs().to_vec()))
            .chain(self.dropped.into_iter().rev())
            .collect();
        self.change
    }
}

impl PoolState {
    pub(super) fn synchronize(&mut self, update: &ChainUpdate) -> Result<TxSetChange, Error> {
        let fork = update.fork;
        self.view_mut(fork);

        let mut rec = Reconciliation {
            change: TxSetChange::new(fork),
            evicted: Vec::new(),
            dropped: Vec::new(),
        };

        // Block lists come newest first, replay them oldest first
        for block in update.blocks_added.iter().rev() {
            self.connect_block(update, block, &mut rec);
        }
        for block in update.blocks_removed.iter().rev() {
            self.disconnect_block(update, block, &mut rec);
        }

        let next_height = update.last_height.next_height();
        let arranged = self
            .arrange(
                &fork,
                update.last_block,
                update.last_time,
                next_height,
                self.config.max_block_size,
            )
            .log_err_pfx("Arranging the next block");
        let to_remove = match arranged {
            Ok(arranged) => {
                self.arrange_cache.insert(fork, update.last_block, next_height, arranged.block);
                arranged.to_remove
            }
            Err(_) => Vec::new(),
        };
        self.view_mut(fork).set_last_block(update.last_block, update.last_time);

        for (tx_id, inputs) in to_remove {
            log::debug!("Dropping {tx_id} which can no longer be mined");
            for input in inputs {
                self.invalidate(&fork, input, &mut rec);
            }
        }

        let change = rec.into_change();
        log::debug!(
            "Synchronized fork {fork} to {} at {}: {} added, {} updated, {} removed",
            update.last_block,
            update.last_height,
            change.added.len(),
            change.updated.len(),
            change.removed.len(),
        );
        Ok(change)
    }

    fn connect_block(&mut self, update: &ChainUpdate, block: &BlockEx, rec: &mut Reconciliation) {
        let fork = update.fork;
        if let Some(mint) = &block.mint {
            rec.change.added.push(AssembledTx::confirmed(mint.clone(), block.height));
        }

        for (tx, ctx) in &block.txs {
            if tx.tx_type().is_defi_payout() {
                rec.change.added.push(AssembledTx::confirmed(tx.clone(), block.height));
                continue;
            }
            if tx.tx_type() == TxType::DefiMintHeight {
                self.refresh_profile(&fork);
            }

            let tx_id = tx.get_id();
            if update.updated_txs.contains(&tx_id) {
                rec.change.updated.insert(tx_id, Some(block.height));
                continue;
            }

            let confirmed = self
                .views
                .get_mut(&fork)
                .is_some_and(|view| view.remove_transaction(&self.store, &tx_id));
            if confirmed {
                self.drop_entry(&tx_id);
                rec.change.updated.insert(tx_id, Some(block.height));
            } else {
                // Pooled spends of the same outputs lost the race
                for input in tx.inputs() {
                    self.invalidate(&fork, *input, rec);
                }
                rec.change.added.push(AssembledTx {
                    tx: tx.clone(),
                    block_height: Some(block.height),
                    dest_in: Some(ctx.dest_in),
                    value_in: ctx.value_in,
                });
            }
        }
    }

    fn disconnect_block(
        &mut self,
        update: &ChainUpdate,
        block: &BlockEx,
        rec: &mut Reconciliation,
    ) {
        let fork = update.fork;
        for (tx, _) in &block.txs {
            let tx_id = tx.get_id();

            if tx.tx_type().is_defi_payout() {
                self.invalidate(&fork, OutPoint::new(tx_id, Transaction::PAYMENT_OUTPUT), rec);
                rec.dropped.push((tx_id, tx.inputs().to_vec()));
                continue;
            }
            if tx.tx_type() == TxType::DefiMintHeight {
                self.refresh_profile(&fork);
            }
            if update.updated_txs.contains(&tx_id) {
                continue;
            }

            match self.add_new(fork, tx.clone(), update.last_height) {
                Ok(admitted) => {
                    log::trace!("Transaction {tx_id} returned to the pool");
                    rec.evicted.extend(admitted.evicted);
                    rec.change.updated.insert(tx_id, None);
                }
                Err(e) => {
                    log::debug!("Transaction {tx_id} of a disconnected block is dropped: {e}");
                    for index in [Transaction::PAYMENT_OUTPUT, Transaction::CHANGE_OUTPUT] {
                        self.invalidate(&fork, OutPoint::new(tx_id, index), rec);
                    }
                    rec.dropped.push((tx_id, tx.inputs().to_vec()));
                }
            }
        }

        if let Some(mint) = &block.mint {
            let mint_id = mint.get_id();
            self.invalidate(&fork, OutPoint::new(mint_id, Transaction::PAYMENT_OUTPUT), rec);
            rec.dropped.push((mint_id, mint.inputs().to_vec()));
        }
    }

    /// Cascade-evict everything spending `outpoint` in `fork`.
    fn invalidate(&mut self, fork: &ForkId, outpoint: OutPoint, rec: &mut Reconciliation) {
        let Some(view) = self.views.get_mut(fork) else {
            return;
        };
        let evicted = view.invalidate_spent(&self.store, outpoint);
        rec.evicted.extend(self.take_entries(evicted));
    }

    fn refresh_profile(&mut self, fork: &ForkId) {
        if let Ok(profile) = self.ledger.fork_profile(fork).log_err_pfx("Refreshing fork profile") {
            self.view_mut(*fork).set_profile(profile);
        }
    }
}
