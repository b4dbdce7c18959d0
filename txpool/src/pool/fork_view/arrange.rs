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

//! Selection of pooled transactions for the next block.

use std::collections::{BTreeMap, BTreeSet};

use common::{
    chain::{Block, Destination, OutPoint, TemplateKind, Transaction, TxType},
    primitives::{Amount, BlockHeight, Id},
};
use logging::log;
use utils::tap_log::TapLog;

use super::ForkView;
use crate::{
    config::min_tx_fee,
    interface::TxVerifier,
    pool::{entry::PooledTx, entry::TxStore, SequenceNumber},
    tx_accumulator::{DefaultTxAccumulator, TransactionAccumulator},
    types::ArrangedBlock,
};

/// Delegate certificate limits taken from the ledger at the anchor block.
#[derive(Debug, Clone, Default)]
pub struct CertPolicy {
    /// Certificates each delegate may still put on chain. Delegates not listed are not
    /// limited.
    pub remaining: BTreeMap<Destination, u32>,
    /// Vote tally per delegate. When not empty, only listed delegates with at least
    /// `min_enroll` can certify.
    pub votes: BTreeMap<Destination, Amount>,
    pub min_enroll: Amount,
}

pub struct ArrangeParams<'a> {
    pub last_block: Id<Block>,
    pub block_time: u64,
    pub height: BlockHeight,
    pub max_size: usize,
    pub min_tx_fee: Amount,
    pub cert_policy: Option<CertPolicy>,
    pub verifier: &'a dyn TxVerifier,
}

#[derive(Debug, Default)]
pub struct ArrangeResult {
    pub block: ArrangedBlock,
    /// Transactions that can never make it into a block, with their inputs.
    pub to_remove: Vec<(Id<Transaction>, Vec<OutPoint>)>,
}

enum Verdict {
    Include,
    Skip,
    SkipAndRemove,
    Stop,
}

struct Arrangement<'a> {
    params: ArrangeParams<'a>,
    acc: DefaultTxAccumulator,
    skipped: BTreeSet<Id<Transaction>>,
    to_remove: Vec<(Id<Transaction>, Vec<OutPoint>)>,
}

impl ForkView {
    /// Arrange the pooled transactions for the block following `params.last_block`.
    ///
    /// Certificates and everything they depend on go first, followed by the remaining
    /// transactions, both in label order. A transaction depending on a skipped one is
    /// skipped as well.
    pub fn build_block_tx_list(&self, store: &TxStore, params: ArrangeParams) -> ArrangeResult {
        let cert_related = self.cert_related(store);

        let mut cert_first: Vec<(SequenceNumber, &PooledTx)> = cert_related
            .iter()
            .filter_map(|id| store.get(id))
            .map(|entry| (entry.sequence(), entry))
            .collect();
        cert_first.sort_by_key(|(sequence, _)| *sequence);

        let rest = self
            .ids_by_sequence()
            .filter(|id| !cert_related.contains(*id))
            .filter_map(|id| store.get(id));

        let mut arrangement = Arrangement {
            acc: DefaultTxAccumulator::new(params.max_size),
            params,
            skipped: BTreeSet::new(),
            to_remove: Vec::new(),
        };

        for entry in cert_first.into_iter().map(|(_, entry)| entry).chain(rest) {
            match arrangement.check(self, entry) {
                Verdict::Include => {
                    let tx = entry.transaction().clone();
                    let added = arrangement
                        .acc
                        .add_tx(tx, entry.size(), entry.fee())
                        .log_err_pfx("Arranging block");
                    if added.is_err() {
                        arrangement.skipped.insert(*entry.tx_id());
                    }
                }
                Verdict::Skip => {
                    arrangement.skipped.insert(*entry.tx_id());
                }
                Verdict::SkipAndRemove => {
                    arrangement.skipped.insert(*entry.tx_id());
                    arrangement
                        .to_remove
                        .push((*entry.tx_id(), entry.transaction().inputs().to_vec()));
                }
                Verdict::Stop => break,
            }
        }

        log::debug!(
            "Arranged {} of {} transactions of fork {}, {} marked for removal",
            arrangement.acc.transactions().len(),
            self.len(),
            self.fork,
            arrangement.to_remove.len(),
        );

        ArrangeResult {
            block: arrangement.acc.into_block(),
            to_remove: arrangement.to_remove,
        }
    }

    /// Certificate transactions together with all their pooled ancestors.
    fn cert_related(&self, store: &TxStore) -> BTreeSet<Id<Transaction>> {
        let mut related = BTreeSet::new();
        let mut worklist: Vec<Id<Transaction>> =
            self.ids_of_type(TxType::Certification).copied().collect();
        while let Some(tx_id) = worklist.pop() {
            if !related.insert(tx_id) {
                continue;
            }
            let Some(entry) = store.get(&tx_id) else {
                continue;
            };
            worklist.extend(
                entry
                    .transaction()
                    .inputs()
                    .iter()
                    .map(OutPoint::tx_id)
                    .filter(|prev| self.contains(prev) && !related.contains(prev)),
            );
        }
        related
    }
}

impl Arrangement<'_> {
    fn check(&mut self, view: &ForkView, entry: &PooledTx) -> Verdict {
        let tx = entry.transaction();
        let params = &self.params;

        if tx.timestamp() > params.block_time {
            return Verdict::Skip;
        }
        if tx.inputs().iter().any(|input| self.skipped.contains(&input.tx_id())) {
            return Verdict::Skip;
        }

        if tx.is_certification() {
            if let Some(policy) = self.params.cert_policy.as_mut() {
                if let Some(remaining) = policy.remaining.get_mut(tx.send_to()) {
                    if *remaining == 0 {
                        return Verdict::Skip;
                    }
                    *remaining -= 1;
                }
                if !policy.votes.is_empty() {
                    match policy.votes.get(tx.send_to()) {
                        Some(votes) if *votes >= policy.min_enroll => (),
                        _ => return Verdict::Skip,
                    }
                }
            }
        }

        let params = &self.params;
        let fork = view.fork();
        let dest_in = entry.dest_in();

        if tx.tx_type() == TxType::DefiMintHeight
            && params.verifier.verify_mint_height_tx(tx, dest_in, fork, params.height).is_err()
        {
            return Verdict::SkipAndRemove;
        }

        let spend_check = match dest_in.template_kind() {
            Some(TemplateKind::DexMatch) => {
                params.verifier.verify_dex_match(tx, dest_in, fork, params.height)
            }
            Some(TemplateKind::Fork) => params.verifier.verify_fork_redeem(
                tx,
                dest_in,
                fork,
                &params.last_block,
                entry.value_in(),
            ),
            _ => Ok(()),
        };
        if spend_check.log_warn_pfx("Spend check failed during arrangement").is_err() {
            return Verdict::SkipAndRemove;
        }

        match tx.send_to().template_kind() {
            Some(TemplateKind::Fork) => {
                if params.verifier.verify_fork_creation(tx, dest_in, fork, params.height).is_err() {
                    return Verdict::SkipAndRemove;
                }
            }
            Some(TemplateKind::Vote) => {
                let duplicate = self
                    .acc
                    .transactions()
                    .iter()
                    .any(|included| included.send_to() == tx.send_to());
                if duplicate
                    || params.verifier.verify_dest_activated(tx, &params.last_block).is_err()
                {
                    return Verdict::SkipAndRemove;
                }
            }
            _ => (),
        }

        if !self.acc.fits(entry.size()) {
            return Verdict::Stop;
        }

        if tx.is_certification() || tx.tx_fee() >= min_tx_fee(tx.data().len(), params.min_tx_fee)
        {
            Verdict::Include
        } else {
            Verdict::Skip
        }
    }
}
