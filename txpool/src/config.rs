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

use std::time::Duration;

use common::primitives::Amount;

/// Each fresh transaction owns a bucket of `2^SEQUENCE_BUCKET_BITS` order labels.
pub const SEQUENCE_BUCKET_BITS: u32 = 24;

/// How long a delegate certificate may stay pooled before a newer one can evict it.
pub const CERT_TX_TIMEOUT: Duration = Duration::from_secs(60 * 60);

pub const MAX_CERT_TX_PER_DESTINATION: usize = 16;

/// Number of block heights an arranged transaction list is kept for.
pub const ARRANGE_CACHE_DEPTH: u64 = 24;

pub const MAX_BLOCK_SIZE: usize = 2_000_000;

pub const MIN_TX_FEE: Amount = Amount::from_atoms(10_000);

/// Upper bound on occupied labels scanned while looking for a free label below a child.
pub const MAX_FREE_LABEL_SCAN: usize = 4096;

// Fee steps are charged per started chunk of attached data
const FEE_DATA_CHUNK: usize = 200;
const FEE_CHEAP_CHUNKS: u128 = 5;

/// Minimum fee for a transaction carrying `data_len` bytes of data.
///
/// The first five chunks cost `2 * base` each, every further chunk costs `4 * base`.
pub fn min_tx_fee(data_len: usize, base: Amount) -> Amount {
    if data_len == 0 {
        return base;
    }
    let chunks = data_len.div_ceil(FEE_DATA_CHUNK) as u128;
    let base = base.into_atoms();
    let atoms = if chunks > FEE_CHEAP_CHUNKS {
        base.saturating_add(base.saturating_mul(FEE_CHEAP_CHUNKS * 2))
            .saturating_add((chunks - FEE_CHEAP_CHUNKS).saturating_mul(base).saturating_mul(4))
    } else {
        base.saturating_add(chunks.saturating_mul(base).saturating_mul(2))
    };
    Amount::from_atoms(atoms)
}

/// Tunables of the pool. Missing fields in a config file fall back to the defaults above.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TxPoolConfig {
    pub cert_tx_timeout_secs: u64,
    pub max_cert_tx_per_destination: usize,
    pub arrange_cache_depth: u64,
    pub max_block_size: usize,
    pub min_tx_fee_atoms: u64,
    pub max_free_label_scan: usize,
}

impl TxPoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cert_tx_timeout(&self) -> Duration {
        Duration::from_secs(self.cert_tx_timeout_secs)
    }

    pub fn min_tx_fee(&self) -> Amount {
        Amount::from_atoms(self.min_tx_fee_atoms.into())
    }
}

impl Default for TxPoolConfig {
    fn default() -> Self {
        Self {
            cert_tx_timeout_secs: CERT_TX_TIMEOUT.as_secs(),
            max_cert_tx_per_destination: MAX_CERT_TX_PER_DESTINATION,
            arrange_cache_depth: ARRANGE_CACHE_DEPTH,
            max_block_size: MAX_BLOCK_SIZE,
            min_tx_fee_atoms: MIN_TX_FEE.into_atoms() as u64,
            max_free_label_scan: MAX_FREE_LABEL_SCAN,
        }
    }
}
