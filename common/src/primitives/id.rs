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

// TODO: consider removing this in the future when fixed-hash fixes this problem
#![allow(clippy::non_canonical_clone_impl)]

use std::{
    cmp::Ordering,
    fmt::{Debug, Display},
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use blake2::{Blake2b512, Digest};
use parity_scale_codec::{Decode, Encode};

fixed_hash::construct_fixed_hash! {
    #[derive(Encode, Decode)]
    pub struct H256(32);
}

/// BLAKE2b digest of the SCALE encoding of `value`, cropped to 32 bytes.
pub fn hash_encoded<T: Encode>(value: &T) -> H256 {
    let mut hasher = Blake2b512::new();
    value.using_encoded(|bytes| hasher.update(bytes));
    let digest = hasher.finalize();
    H256::from_slice(&digest[..32])
}

/// A typed 256-bit identifier. The type parameter only tags what the hash refers to.
#[derive(Encode, Decode)]
pub struct Id<T> {
    hash: H256,
    _shadow: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub const fn new(hash: H256) -> Self {
        Self {
            hash,
            _shadow: PhantomData,
        }
    }

    pub const fn to_hash(&self) -> H256 {
        self.hash
    }

    pub fn zero() -> Self {
        Self::new(H256::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.hash.is_zero()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hash.cmp(&other.hash)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state)
    }
}

impl<T> Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Id{{{:x}}}", self.hash)
    }
}

impl<T> Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:x}", self.hash)
    }
}

impl<T> From<H256> for Id<T> {
    fn from(hash: H256) -> Self {
        Self::new(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Tag {}

    #[test]
    fn hashing_is_deterministic() {
        let a = hash_encoded(&(1u32, vec![7u8; 40]));
        let b = hash_encoded(&(1u32, vec![7u8; 40]));
        let c = hash_encoded(&(2u32, vec![7u8; 40]));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn id_ordering_follows_hash() {
        let low: Id<Tag> = Id::new(H256::from_low_u64_be(1));
        let high: Id<Tag> = Id::new(H256::from_low_u64_be(2));
        assert!(low < high);
        assert_eq!(Id::<Tag>::decode(&mut &low.encode()[..]).unwrap(), low);
        assert!(Id::<Tag>::zero().is_zero());
    }
}
