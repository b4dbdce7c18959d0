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
    sync::{atomic::AtomicU64, Arc},
};

use parking_lot::Mutex;

use common::{
    chain::{
        Block, Destination, ForkId, ForkProfile, ForkStatus, ForkType, OutPoint, TemplateKind,
        Transaction, TxOutput, TxType,
    },
    primitives::{Amount, BlockHeight, Id, H256},
};

pub use logging::log;
pub use rand::Rng;
pub use rstest::rstest;
pub use test_utils::{
    mock_time_getter::mocked_time_getter_seconds,
    random::{make_seedable_rng, Seed},
};

use crate::{
    config::TxPoolConfig,
    error::{StorageError, VerifyError},
    interface::{BlockEx, BlockLocation, ChainUpdate, Ledger, MockTxVerifier, TxContext},
    storage::InMemoryTxPoolStorage,
};

use crate::pool::TxPool;

/// Plenty to pass the minimum fee for transactions without data.
pub const FEE: u128 = 100_000;

pub fn dest(n: u8) -> Destination {
    Destination::PubKey(H256::repeat_byte(n))
}

pub fn template(kind: TemplateKind, n: u8) -> Destination {
    Destination::Template(kind, H256::repeat_byte(n))
}

pub fn block_id(n: u64) -> Id<Block> {
    Id::new(H256::from_low_u64_be(n))
}

pub fn fork_id(n: u8) -> ForkId {
    Id::new(H256::repeat_byte(0xf0 | n))
}

/// An outpoint of some confirmed transaction.
pub fn chain_outpoint(n: u64) -> OutPoint {
    OutPoint::new(Id::new(H256::from_low_u64_be(0xc0de_0000 + n)), 0)
}

pub fn output(to: Destination, atoms: u128) -> TxOutput {
    TxOutput {
        dest_to: to,
        amount: Amount::from_atoms(atoms),
        tx_time: 0,
        lock_until: 0,
    }
}

pub fn transfer(
    anchor: Id<Block>,
    inputs: Vec<OutPoint>,
    to: Destination,
    atoms: u128,
    fee: u128,
) -> Transaction {
    Transaction::new(
        TxType::Token,
        anchor,
        inputs,
        to,
        Amount::from_atoms(atoms),
        Amount::from_atoms(fee),
    )
}

pub fn payment(tx: &Transaction) -> OutPoint {
    OutPoint::new(tx.get_id(), Transaction::PAYMENT_OUTPUT)
}

pub fn change(tx: &Transaction) -> OutPoint {
    OutPoint::new(tx.get_id(), Transaction::CHANGE_OUTPUT)
}

/// A verifier accepting everything.
pub fn permissive_verifier() -> MockTxVerifier {
    let mut verifier = MockTxVerifier::new();
    verifier.expect_verify_transaction().returning(|_, _, _, _, _| Ok(()));
    verifier.expect_verify_mint_height_tx().returning(|_, _, _, _| Ok(()));
    verifier.expect_verify_fork_redeem().returning(|_, _, _, _, _| Ok(()));
    verifier.expect_verify_fork_creation().returning(|_, _, _, _| Ok(()));
    verifier.expect_verify_dex_match().returning(|_, _, _, _| Ok(()));
    verifier.expect_verify_dest_activated().returning(|_, _| Ok(()));
    verifier
}

pub fn rejected(rule: &str) -> VerifyError {
    VerifyError::Rule(rule.to_owned())
}

#[derive(Default)]
struct LedgerState {
    blocks: BTreeMap<Id<Block>, BlockLocation>,
    statuses: BTreeMap<ForkId, ForkStatus>,
    profiles: BTreeMap<ForkId, ForkProfile>,
    unspent: BTreeMap<ForkId, BTreeMap<OutPoint, TxOutput>>,
    cert_counts: BTreeMap<Destination, u32>,
    votes: BTreeMap<Destination, Amount>,
    min_enroll: Amount,
    rejected_relations: BTreeSet<Destination>,
    unavailable: bool,
}

/// Confirmed chain state kept in memory, edited directly by the tests.
pub struct TestLedger {
    primary: ForkId,
    state: Mutex<LedgerState>,
}

impl TestLedger {
    pub fn new(primary: ForkId) -> Self {
        Self {
            primary,
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub fn add_fork(&self, fork: ForkId, fork_type: ForkType) {
        let profile = ForkProfile {
            name: format!("fork-{fork}"),
            fork_type,
            parent: None,
        };
        self.state.lock().profiles.insert(fork, profile);
    }

    /// Make `block` the tip of `fork`.
    pub fn set_tip(&self, fork: ForkId, block: Id<Block>, height: u64, time: u64) {
        let mut state = self.state.lock();
        let height = BlockHeight::new(height);
        state.blocks.insert(block, BlockLocation { fork, height });
        state.statuses.insert(
            fork,
            ForkStatus {
                last_block: block,
                last_height: height,
                last_time: time,
            },
        );
    }

    pub fn add_unspent(&self, fork: ForkId, outpoint: OutPoint, output: TxOutput) {
        self.state.lock().unspent.entry(fork).or_default().insert(outpoint, output);
    }

    pub fn spend(&self, fork: ForkId, outpoint: &OutPoint) {
        if let Some(unspent) = self.state.lock().unspent.get_mut(&fork) {
            unspent.remove(outpoint);
        }
    }

    /// Apply the UTXO effect of confirming `tx`.
    pub fn confirm(&self, fork: ForkId, tx: &Transaction, dest_in: Destination, value_in: u128) {
        for input in tx.inputs() {
            self.spend(fork, input);
        }
        for index in [Transaction::PAYMENT_OUTPUT, Transaction::CHANGE_OUTPUT] {
            if let Some(out) = tx.output(index, &dest_in, Amount::from_atoms(value_in)) {
                self.add_unspent(fork, OutPoint::new(tx.get_id(), index), out);
            }
        }
    }

    /// Undo `confirm`. `inputs` are the outputs `tx` had spent.
    pub fn unconfirm(&self, fork: ForkId, tx: &Transaction, inputs: &[(OutPoint, TxOutput)]) {
        for index in [Transaction::PAYMENT_OUTPUT, Transaction::CHANGE_OUTPUT] {
            self.spend(fork, &OutPoint::new(tx.get_id(), index));
        }
        for (outpoint, out) in inputs {
            self.add_unspent(fork, *outpoint, out.clone());
        }
    }

    pub fn set_cert_counts(&self, counts: BTreeMap<Destination, u32>) {
        self.state.lock().cert_counts = counts;
    }

    pub fn set_votes(&self, votes: BTreeMap<Destination, Amount>, min_enroll: Amount) {
        let mut state = self.state.lock();
        state.votes = votes;
        state.min_enroll = min_enroll;
    }

    pub fn reject_relations_under(&self, root: Destination) {
        self.state.lock().rejected_relations.insert(root);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    fn check_available(&self) -> Result<(), StorageError> {
        utils::ensure!(
            !self.state.lock().unavailable,
            StorageError::LedgerUnavailable("test ledger switched off".into())
        );
        Ok(())
    }
}

impl Ledger for TestLedger {
    fn block_location(&self, block: &Id<Block>) -> Result<Option<BlockLocation>, StorageError> {
        self.check_available()?;
        Ok(self.state.lock().blocks.get(block).copied())
    }

    fn last_block_status(&self, fork: &ForkId) -> Result<ForkStatus, StorageError> {
        self.check_available()?;
        self.state
            .lock()
            .statuses
            .get(fork)
            .cloned()
            .ok_or(StorageError::LastBlockMissing(*fork))
    }

    fn resolve_unspent(
        &self,
        fork: &ForkId,
        inputs: &[OutPoint],
    ) -> Result<Vec<Option<TxOutput>>, StorageError> {
        self.check_available()?;
        let state = self.state.lock();
        let unspent = state.unspent.get(fork);
        Ok(inputs
            .iter()
            .map(|input| unspent.and_then(|u| u.get(input)).cloned())
            .collect())
    }

    fn fork_profile(&self, fork: &ForkId) -> Result<ForkProfile, StorageError> {
        self.check_available()?;
        self.state
            .lock()
            .profiles
            .get(fork)
            .cloned()
            .ok_or(StorageError::ForkProfileMissing(*fork))
    }

    fn fork_statuses(&self) -> Result<BTreeMap<ForkId, ForkStatus>, StorageError> {
        self.check_available()?;
        Ok(self.state.lock().statuses.clone())
    }

    fn delegate_cert_tx_counts(
        &self,
        _block: &Id<Block>,
    ) -> Result<BTreeMap<Destination, u32>, StorageError> {
        self.check_available()?;
        Ok(self.state.lock().cert_counts.clone())
    }

    fn delegate_votes(
        &self,
        _block: &Id<Block>,
    ) -> Result<BTreeMap<Destination, Amount>, StorageError> {
        self.check_available()?;
        Ok(self.state.lock().votes.clone())
    }

    fn min_enroll_amount(&self, _block: &Id<Block>) -> Result<Amount, StorageError> {
        self.check_available()?;
        Ok(self.state.lock().min_enroll)
    }

    fn check_add_relation(
        &self,
        _fork: &ForkId,
        _dest: &Destination,
        root: &Destination,
    ) -> Result<bool, StorageError> {
        self.check_available()?;
        Ok(!self.state.lock().rejected_relations.contains(root))
    }

    fn primary_fork(&self) -> ForkId {
        self.primary
    }
}

/// A pool on a primary fork at height 10 with block 10 as the tip.
pub struct TestSetup {
    pub fork: ForkId,
    pub tip: Id<Block>,
    pub ledger: Arc<TestLedger>,
    pub storage: Arc<InMemoryTxPoolStorage>,
    pub clock: Arc<AtomicU64>,
    pub pool: TxPool,
}

pub const TIP_HEIGHT: u64 = 10;
pub const TIP_TIME: u64 = 1_000_000;

impl TestSetup {
    pub fn new() -> Self {
        Self::with_verifier(permissive_verifier())
    }

    pub fn with_verifier(verifier: MockTxVerifier) -> Self {
        Self::with_config(verifier, TxPoolConfig::default())
    }

    pub fn with_config(verifier: MockTxVerifier, config: TxPoolConfig) -> Self {
        let fork = fork_id(0);
        let tip = block_id(TIP_HEIGHT);
        let ledger = Arc::new(TestLedger::new(fork));
        ledger.add_fork(fork, ForkType::Common);
        ledger.set_tip(fork, tip, TIP_HEIGHT, TIP_TIME);

        let storage = Arc::new(InMemoryTxPoolStorage::new());
        let clock = Arc::new(AtomicU64::new(TIP_TIME));
        let pool = TxPool::new(
            config,
            Arc::clone(&ledger) as Arc<dyn Ledger>,
            Arc::new(verifier),
            Arc::clone(&storage) as Arc<dyn crate::storage::TxPoolStorage>,
            mocked_time_getter_seconds(Arc::clone(&clock)),
        );
        // Picks up the tip of every fork, the way a node starts its pool
        pool.load().unwrap();
        Self {
            fork,
            tip,
            ledger,
            storage,
            clock,
            pool,
        }
    }

    /// A confirmed output of `atoms` owned by `owner`, spendable by pool transactions.
    pub fn fund(&self, n: u64, owner: Destination, atoms: u128) -> OutPoint {
        let outpoint = chain_outpoint(n);
        self.ledger.add_unspent(self.fork, outpoint, output(owner, atoms));
        outpoint
    }

    /// Move the tip forward by connecting `txs` in a new block at `height`.
    pub fn connect(&mut self, height: u64, txs: Vec<(Transaction, TxContext)>) -> ChainUpdate {
        for (tx, ctx) in &txs {
            self.ledger.confirm(self.fork, tx, ctx.dest_in, ctx.value_in.into_atoms());
        }
        let block = block_ex(height, txs);
        self.ledger.set_tip(self.fork, block.id, height, block.time);
        self.tip = block.id;
        ChainUpdate {
            fork: self.fork,
            last_block: block.id,
            last_height: block.height,
            last_time: block.time,
            blocks_added: vec![block],
            blocks_removed: Vec::new(),
            updated_txs: BTreeSet::new(),
        }
    }

    /// Roll back the block at `height`. `spent` are the outputs its transactions had
    /// consumed.
    pub fn disconnect(
        &mut self,
        height: u64,
        txs: Vec<(Transaction, TxContext)>,
        spent: &[(OutPoint, TxOutput)],
    ) -> ChainUpdate {
        for (tx, _) in &txs {
            self.ledger.unconfirm(self.fork, tx, spent);
        }
        let tip = height - 1;
        self.ledger.set_tip(self.fork, block_id(tip), tip, block_time(tip));
        self.tip = block_id(tip);
        ChainUpdate {
            fork: self.fork,
            last_block: block_id(tip),
            last_height: BlockHeight::new(tip),
            last_time: block_time(tip),
            blocks_added: Vec::new(),
            blocks_removed: vec![block_ex(height, txs)],
            updated_txs: BTreeSet::new(),
        }
    }
}

pub fn block_time(height: u64) -> u64 {
    TIP_TIME + height - TIP_HEIGHT
}

pub fn block_ex(height: u64, txs: Vec<(Transaction, TxContext)>) -> BlockEx {
    BlockEx {
        id: block_id(height),
        height: BlockHeight::new(height),
        time: block_time(height),
        mint: None,
        txs,
    }
}

pub fn ctx(dest_in: Destination, value_in: u128) -> TxContext {
    TxContext {
        dest_in,
        value_in: Amount::from_atoms(value_in),
    }
}
