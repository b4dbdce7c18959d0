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

use std::sync::atomic::{AtomicBool, Ordering};

use super::*;

fn aggregates(pool: &TxPool, dests: &[Destination]) -> Vec<AddressAggregate> {
    dests.iter().map(|d| pool.address_aggregate(d)).collect()
}

fn overlay(setup: &TestSetup, dests: &[Destination]) -> Vec<BTreeMap<OutPoint, TxOutput>> {
    dests
        .iter()
        .map(|d| {
            let mut unspent = BTreeMap::new();
            setup.pool.address_unspent(&setup.fork, d, &setup.tip, &mut unspent).unwrap();
            unspent
        })
        .collect()
}

#[test]
fn confirmed_tx_leaves_and_returns_on_rollback() {
    let mut setup = TestSetup::new();
    let funds = setup.fund(1, dest(1), 1_000_000);
    let tx = transfer(setup.tip, vec![funds], dest(2), 400_000, FEE);
    let tx_id = tx.get_id();
    setup.pool.push(tx.clone()).unwrap();

    let dests = [dest(1), dest(2)];
    let pooled = aggregates(&setup.pool, &dests);

    let update = setup.connect(11, vec![(tx.clone(), ctx(dest(1), 1_000_000))]);
    let change = setup.pool.synchronize(&update).unwrap();
    assert_eq!(change.updated, BTreeMap::from([(tx_id, Some(BlockHeight::new(11)))]));
    assert!(change.added.is_empty());
    assert!(change.removed.is_empty());
    assert!(!setup.pool.exists(&tx_id));
    assert_eq!(aggregates(&setup.pool, &dests), vec![AddressAggregate::default(); 2]);

    let update = setup.disconnect(
        11,
        vec![(tx.clone(), ctx(dest(1), 1_000_000))],
        &[(funds, output(dest(1), 1_000_000))],
    );
    let change = setup.pool.synchronize(&update).unwrap();
    assert_eq!(change.updated, BTreeMap::from([(tx_id, None)]));
    assert!(change.removed.is_empty());
    assert!(setup.pool.exists(&tx_id));
    assert_eq!(aggregates(&setup.pool, &dests), pooled);
}

#[test]
fn round_trip_reorg_restores_overlay() {
    let mut setup = TestSetup::new();
    let funds = setup.fund(1, dest(1), 1_000_000);
    let parent = transfer(setup.tip, vec![funds], dest(2), 500_000, FEE);
    let child = transfer(setup.tip, vec![payment(&parent)], dest(3), 200_000, FEE);
    setup.pool.push(parent.clone()).unwrap();
    setup.pool.push(child.clone()).unwrap();

    let dests = [dest(1), dest(2), dest(3)];
    let before = overlay(&setup, &dests);
    let stats_before = aggregates(&setup.pool, &dests);

    let block = vec![(parent.clone(), ctx(dest(1), 1_000_000))];
    let update = setup.connect(11, block.clone());
    setup.pool.synchronize(&update).unwrap();
    let update = setup.disconnect(11, block, &[(funds, output(dest(1), 1_000_000))]);
    setup.pool.synchronize(&update).unwrap();

    assert_eq!(overlay(&setup, &dests), before);
    assert_eq!(aggregates(&setup.pool, &dests), stats_before);
    let listed: Vec<_> = setup.pool.list_tx(&setup.fork).into_iter().map(|(id, _)| id).collect();
    assert_eq!(listed, vec![parent.get_id(), child.get_id()]);
}

#[test]
fn conflicting_confirmation_evicts_pooled_spends() {
    let mut setup = TestSetup::new();
    let funds = setup.fund(1, dest(1), 1_000_000);
    let pooled = transfer(setup.tip, vec![funds], dest(2), 500_000, FEE);
    let pooled_child = transfer(setup.tip, vec![payment(&pooled)], dest(3), 200_000, FEE);
    let other_funds = setup.fund(2, dest(1), 1_000_000);
    let bystander = transfer(setup.tip, vec![other_funds], dest(2), 1000, FEE);
    for tx in [&pooled, &pooled_child, &bystander] {
        setup.pool.push(tx.clone()).unwrap();
    }

    let rival = transfer(setup.tip, vec![funds], dest(4), 900_000, FEE);
    let update = setup.connect(11, vec![(rival.clone(), ctx(dest(1), 1_000_000))]);
    let change = setup.pool.synchronize(&update).unwrap();

    assert_eq!(
        change.added,
        vec![AssembledTx {
            tx: rival,
            block_height: Some(BlockHeight::new(11)),
            dest_in: Some(dest(1)),
            value_in: Amount::from_atoms(1_000_000),
        }]
    );
    // Highest label first
    assert_eq!(
        change.removed,
        vec![
            (pooled_child.get_id(), vec![payment(&pooled)]),
            (pooled.get_id(), vec![funds]),
        ]
    );
    assert_eq!(setup.pool.count(&setup.fork), 1);
    assert!(setup.pool.exists(&bystander.get_id()));
    assert_eq!(setup.pool.address_aggregate(&dest(3)), AddressAggregate::default());
}

#[test]
fn payouts_are_reported_and_invalidated() {
    let mut setup = TestSetup::new();
    let reward = Transaction::new(
        TxType::DefiReward,
        setup.tip,
        Vec::new(),
        dest(4),
        Amount::from_atoms(500_000),
        Amount::ZERO,
    );
    let block = vec![(reward.clone(), ctx(dest(4), 500_000))];
    let update = setup.connect(11, block.clone());
    let change = setup.pool.synchronize(&update).unwrap();
    assert_eq!(
        change.added,
        vec![AssembledTx::confirmed(reward.clone(), BlockHeight::new(11))]
    );

    let spend = transfer(setup.tip, vec![payment(&reward)], dest(5), 100_000, FEE);
    setup.pool.push(spend.clone()).unwrap();

    let update = setup.disconnect(11, block, &[]);
    let change = setup.pool.synchronize(&update).unwrap();
    assert_eq!(
        change.removed,
        vec![(spend.get_id(), vec![payment(&reward)]), (reward.get_id(), Vec::new())]
    );
    assert_eq!(setup.pool.count(&setup.fork), 0);
}

#[test]
fn txs_on_both_branches_only_get_a_new_height() {
    let mut setup = TestSetup::new();
    let shared = transfer(setup.tip, vec![setup.fund(1, dest(1), 1_000_000)], dest(2), 1000, FEE);

    let mut update = setup.connect(11, vec![(shared.clone(), ctx(dest(1), 1_000_000))]);
    update.updated_txs.insert(shared.get_id());
    let change = setup.pool.synchronize(&update).unwrap();

    assert!(change.added.is_empty());
    assert_eq!(
        change.updated,
        BTreeMap::from([(shared.get_id(), Some(BlockHeight::new(11)))])
    );
}

#[test]
fn rollback_of_now_invalid_tx_drops_dependants() {
    let strict = Arc::new(AtomicBool::new(false));
    let mut verifier = MockTxVerifier::new();
    let strict_check = Arc::clone(&strict);
    verifier.expect_verify_transaction().returning(move |tx, _, _, _, _| {
        if strict_check.load(Ordering::SeqCst) && tx.amount() == Amount::from_atoms(777_000) {
            Err(rejected("no longer valid"))
        } else {
            Ok(())
        }
    });
    verifier.expect_verify_mint_height_tx().returning(|_, _, _, _| Ok(()));
    verifier.expect_verify_fork_redeem().returning(|_, _, _, _, _| Ok(()));
    verifier.expect_verify_fork_creation().returning(|_, _, _, _| Ok(()));
    verifier.expect_verify_dex_match().returning(|_, _, _, _| Ok(()));
    verifier.expect_verify_dest_activated().returning(|_, _| Ok(()));
    let mut setup = TestSetup::with_verifier(verifier);

    let funds = setup.fund(1, dest(1), 1_000_000);
    let parent = transfer(setup.tip, vec![funds], dest(2), 777_000, FEE);
    let child = transfer(setup.tip, vec![payment(&parent)], dest(3), 500_000, FEE);
    setup.pool.push(parent.clone()).unwrap();
    setup.pool.push(child.clone()).unwrap();

    let block = vec![(parent.clone(), ctx(dest(1), 1_000_000))];
    let update = setup.connect(11, block.clone());
    setup.pool.synchronize(&update).unwrap();

    strict.store(true, Ordering::SeqCst);
    let update = setup.disconnect(11, block, &[(funds, output(dest(1), 1_000_000))]);
    let change = setup.pool.synchronize(&update).unwrap();

    assert_eq!(
        change.removed,
        vec![
            (child.get_id(), vec![payment(&parent)]),
            (parent.get_id(), vec![funds]),
        ]
    );
    assert_eq!(setup.pool.count(&setup.fork), 0);
    assert_eq!(setup.pool.address_aggregate(&dest(3)), AddressAggregate::default());
}

const FUNDS: u128 = 10_000_000;

/// A pool that cannot search for free labels.
fn no_scan_setup(config: TxPoolConfig) -> TestSetup {
    let config = TxPoolConfig {
        max_free_label_scan: 0,
        ..config
    };
    TestSetup::with_config(permissive_verifier(), config)
}

/// Confirm the pooled `first` (spending `chain_outpoint(1)` of `dest(1)`) together with a
/// family built on its change, then roll both blocks back. The family returns below a
/// spend that is then removed, so returning `first` needs a label scan.
fn roll_back_without_free_label(setup: &mut TestSetup, first: &Transaction) {
    let first_change = first
        .output(Transaction::CHANGE_OUTPUT, &dest(1), Amount::from_atoms(FUNDS))
        .unwrap();
    let child = transfer(setup.tip, vec![change(first)], dest(2), 5_000_000, FEE);
    let grandchild = transfer(setup.tip, vec![payment(&child)], dest(3), 4_000_000, FEE);
    let sibling_funds = setup.fund(2, dest(1), FUNDS);
    let sibling = transfer(setup.tip, vec![sibling_funds], dest(3), 4_000_000, FEE);
    let joint = transfer(
        setup.tip,
        vec![payment(&grandchild), payment(&sibling)],
        dest(4),
        7_000_000,
        FEE,
    );
    for tx in [&child, &grandchild, &sibling, &joint] {
        setup.pool.push(tx.clone()).unwrap();
    }

    let first_block = vec![(first.clone(), ctx(dest(1), FUNDS))];
    let update = setup.connect(11, first_block.clone());
    setup.pool.synchronize(&update).unwrap();
    let block = vec![
        (child.clone(), ctx(dest(1), first_change.amount.into_atoms())),
        (grandchild.clone(), ctx(dest(2), 5_000_000)),
        (sibling.clone(), ctx(dest(1), FUNDS)),
    ];
    let update = setup.connect(12, block.clone());
    setup.pool.synchronize(&update).unwrap();

    let spent = [(change(first), first_change), (sibling_funds, output(dest(1), FUNDS))];
    let update = setup.disconnect(12, block, &spent);
    setup.pool.synchronize(&update).unwrap();
    let joint_label = setup.pool.sequence_of(&joint.get_id()).unwrap().into_int();
    assert_eq!(
        setup.pool.sequence_of(&sibling.get_id()).unwrap().into_int(),
        joint_label - 3
    );
    setup.pool.remove(&joint.get_id()).unwrap();

    let update = setup.disconnect(11, first_block, &[(chain_outpoint(1), output(dest(1), FUNDS))]);
    let change = setup.pool.synchronize(&update).unwrap();
    assert!(!setup.pool.exists(&first.get_id()));
    assert!(change.removed.iter().any(|(id, _)| *id == first.get_id()));
}

#[test]
fn failed_return_of_a_certificate_keeps_the_expired_one() {
    let config = TxPoolConfig {
        cert_tx_timeout_secs: 100,
        max_cert_tx_per_destination: 2,
        ..TxPoolConfig::default()
    };
    let mut setup = no_scan_setup(config);
    let anchor = setup.tip;
    let delegate = template(TemplateKind::Delegate, 9);
    let certificate = move |input: OutPoint| {
        Transaction::new(
            TxType::Certification,
            anchor,
            vec![input],
            delegate,
            Amount::from_atoms(1),
            Amount::ZERO,
        )
    };
    let stale = certificate(setup.fund(5, dest(1), 1_000_000));
    let first = certificate(setup.fund(1, dest(1), FUNDS));
    setup.pool.push(stale.clone()).unwrap();
    setup.pool.push(first.clone()).unwrap();

    setup.clock.fetch_add(200, Ordering::SeqCst);
    roll_back_without_free_label(&mut setup, &first);

    // The stale certificate only gives way to one that got back in
    assert!(setup.pool.exists(&stale.get_id()));
    assert_eq!(setup.pool.count(&setup.fork), 2);
}

fn relation_parent(setup: &TestSetup, dest: &Destination) -> Option<Destination> {
    let state = setup.pool.state.read();
    state.views.get(&setup.fork)?.relations().parent(dest).copied()
}

#[test]
fn failed_return_of_a_relation_leaves_no_link() {
    let mut setup = no_scan_setup(TxPoolConfig::default());
    setup.ledger.add_fork(setup.fork, ForkType::Defi);
    let anchor = setup.tip;
    let relation = move |input: OutPoint| {
        Transaction::new(
            TxType::DefiRelation,
            anchor,
            vec![input],
            dest(7),
            Amount::from_atoms(1000),
            Amount::from_atoms(FEE),
        )
    };
    let first = relation(setup.fund(1, dest(1), FUNDS));
    setup.pool.push(first.clone()).unwrap();
    assert_eq!(relation_parent(&setup, &dest(7)), Some(dest(1)));

    roll_back_without_free_label(&mut setup, &first);
    assert_eq!(relation_parent(&setup, &dest(7)), None);

    let again = relation(setup.fund(8, dest(1), 1_000_000));
    setup.pool.push(again).unwrap();
    assert_eq!(relation_parent(&setup, &dest(7)), Some(dest(1)));
}
