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

//! Bookkeeping of pooled delegate certificate transactions.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use common::{
    chain::{Destination, Transaction},
    primitives::Id,
    time_getter::TimeGetter,
};

pub struct CertTxCache {
    /// Destinations exempt from the quota.
    delegates: BTreeSet<Destination>,
    by_dest: BTreeMap<Destination, BTreeMap<Id<Transaction>, Duration>>,
    timeout: Duration,
    max_per_dest: usize,
    time_getter: TimeGetter,
}

impl CertTxCache {
    pub fn new(timeout: Duration, max_per_dest: usize, time_getter: TimeGetter) -> Self {
        Self {
            delegates: BTreeSet::new(),
            by_dest: BTreeMap::new(),
            timeout,
            max_per_dest,
            time_getter,
        }
    }

    pub fn register_delegate(&mut self, dest: Destination) {
        self.by_dest.remove(&dest);
        self.delegates.insert(dest);
    }

    pub fn is_delegate(&self, dest: &Destination) -> bool {
        self.delegates.contains(dest)
    }

    /// Start tracking a certificate, or refresh its admission time.
    pub fn record(&mut self, dest: Destination, tx_id: Id<Transaction>) {
        if self.is_delegate(&dest) {
            return;
        }
        let now = self.time_getter.get_time();
        self.by_dest.entry(dest).or_default().insert(tx_id, now);
    }

    pub fn forget(&mut self, dest: &Destination, tx_id: &Id<Transaction>) {
        if let Some(txs) = self.by_dest.get_mut(dest) {
            txs.remove(tx_id);
            if txs.is_empty() {
                self.by_dest.remove(dest);
            }
        }
    }

    /// The certificate of `dest` admitted earliest, provided it has timed out.
    pub fn oldest_expired(&self, dest: &Destination) -> Option<Id<Transaction>> {
        let now = self.time_getter.get_time();
        self.by_dest
            .get(dest)?
            .iter()
            .min_by_key(|(_, admitted)| **admitted)
            .filter(|(_, admitted)| now.saturating_sub(**admitted) >= self.timeout)
            .map(|(tx_id, _)| *tx_id)
    }

    pub fn count(&self, dest: &Destination) -> usize {
        self.by_dest.get(dest).map_or(0, BTreeMap::len)
    }

    pub fn is_over_quota(&self, dest: &Destination) -> bool {
        !self.is_delegate(dest) && self.count(dest) >= self.max_per_dest
    }

    pub fn clear(&mut self) {
        self.by_dest.clear();
    }
}
