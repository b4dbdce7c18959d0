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

use common::{chain::Destination, primitives::Amount};

use super::entry::PooledTx;

/// Net effect of the pooled transactions on one destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressAggregate {
    pub amount_delta: i128,
    pub tx_count: u64,
}

impl AddressAggregate {
    fn is_empty(&self) -> bool {
        self.amount_delta == 0 && self.tx_count == 0
    }
}

#[derive(Debug, Default)]
pub struct AddressStats {
    by_dest: BTreeMap<Destination, AddressAggregate>,
}

fn signed(amount: Amount) -> i128 {
    i128::try_from(amount.into_atoms()).unwrap_or(i128::MAX)
}

impl AddressStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_admit(&mut self, entry: &PooledTx) {
        let tx = entry.transaction();
        let spent = signed(tx.amount()).saturating_add(signed(tx.tx_fee()));
        self.apply(*tx.send_to(), signed(tx.amount()), 1);
        self.apply(*entry.dest_in(), -spent, 1);
    }

    pub fn on_remove(&mut self, entry: &PooledTx) {
        let tx = entry.transaction();
        let spent = signed(tx.amount()).saturating_add(signed(tx.tx_fee()));
        self.apply(*tx.send_to(), -signed(tx.amount()), -1);
        self.apply(*entry.dest_in(), spent, -1);
    }

    fn apply(&mut self, dest: Destination, amount: i128, count: i64) {
        let aggregate = self.by_dest.entry(dest).or_default();
        aggregate.amount_delta = aggregate.amount_delta.saturating_add(amount);
        aggregate.tx_count = aggregate.tx_count.saturating_add_signed(count);
        if aggregate.is_empty() {
            self.by_dest.remove(&dest);
        }
    }

    pub fn get(&self, dest: &Destination) -> AddressAggregate {
        self.by_dest.get(dest).copied().unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.by_dest.clear()
    }
}
