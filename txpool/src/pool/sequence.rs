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

//! Order labels for pooled transactions.
//!
//! Labels are grouped into buckets of `2^SEQUENCE_BUCKET_BITS`. A transaction entering the
//! pool gets the top label of a fresh bucket (its root); labels below a root are handed out
//! when a parent has to be ordered in front of a transaction that is already pooled.

use parity_scale_codec::{Decode, Encode};
use static_assertions::const_assert;

use crate::{config::SEQUENCE_BUCKET_BITS, error::SequenceError};

const_assert!(SEQUENCE_BUCKET_BITS > 0 && SEQUENCE_BUCKET_BITS < 64);

const BUCKET_SIZE: u64 = 1 << SEQUENCE_BUCKET_BITS;
const BUCKET_MASK: u64 = BUCKET_SIZE - 1;
const MAX_BUCKET: u64 = u64::MAX >> SEQUENCE_BUCKET_BITS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct SequenceNumber(u64);

impl SequenceNumber {
    pub const fn new(label: u64) -> Self {
        Self(label)
    }

    pub const fn into_int(self) -> u64 {
        self.0
    }

    pub fn is_bucket_root(&self) -> bool {
        self.0 & BUCKET_MASK == 0
    }

    /// The root label of the bucket this label belongs to.
    pub fn bucket_root(&self) -> Option<SequenceNumber> {
        if self.is_bucket_root() {
            return Some(*self);
        }
        ((self.0 >> SEQUENCE_BUCKET_BITS) + 1)
            .checked_mul(BUCKET_SIZE)
            .map(SequenceNumber)
    }

    /// Labels of this bucket are strictly greater than the floor.
    pub fn bucket_floor(&self) -> Option<u64> {
        self.bucket_root().and_then(|root| root.0.checked_sub(BUCKET_SIZE))
    }
}

impl std::fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}",
            self.0 >> SEQUENCE_BUCKET_BITS,
            self.0 & BUCKET_MASK
        )
    }
}

/// Hands out bucket roots in increasing order.
#[derive(Debug, Default)]
pub struct SequenceAllocator {
    last_bucket: u64,
}

impl SequenceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_root(&mut self) -> Result<SequenceNumber, SequenceError> {
        utils::ensure!(self.last_bucket < MAX_BUCKET, SequenceError::LabelSpaceExhausted);
        self.last_bucket += 1;
        Ok(SequenceNumber(self.last_bucket << SEQUENCE_BUCKET_BITS))
    }

    pub fn reset(&mut self) {
        self.last_bucket = 0;
    }
}
