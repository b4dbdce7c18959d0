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

use parity_scale_codec::{Decode, Encode};

/// A coin amount in atoms. Arithmetic is checked and yields `None` on overflow.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Default, Encode, Decode)]
pub struct Amount {
    #[codec(compact)]
    val: u128,
}

impl Amount {
    pub const MAX: Self = Self::from_atoms(u128::MAX);
    pub const ZERO: Self = Self::from_atoms(0);

    pub const fn from_atoms(v: u128) -> Self {
        Amount { val: v }
    }

    pub const fn into_atoms(&self) -> u128 {
        self.val
    }

    pub fn checked_mul_u128(&self, rhs: u128) -> Option<Self> {
        self.val.checked_mul(rhs).map(Self::from_atoms)
    }

    /// Sum of an iterator of amounts, `None` on overflow.
    pub fn sum<I: IntoIterator<Item = Amount>>(iter: I) -> Option<Self> {
        iter.into_iter().try_fold(Self::ZERO, |acc, a| acc + a)
    }
}

impl std::ops::Add for Amount {
    type Output = Option<Self>;

    fn add(self, other: Self) -> Option<Self> {
        self.val.checked_add(other.val).map(|n| Amount { val: n })
    }
}

impl std::ops::Sub for Amount {
    type Output = Option<Self>;

    fn sub(self, other: Self) -> Option<Self> {
        self.val.checked_sub(other.val).map(|n| Amount { val: n })
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.val)
    }
}
