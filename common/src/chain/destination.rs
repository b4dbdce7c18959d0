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

use crate::primitives::H256;

/// Script templates an address can be bound to.
///
/// Some templates carry consensus-level meaning during block assembly:
/// a `Fork` destination creates or redeems a fork, a `Vote` destination
/// must be activated before it can receive, `DexMatch` spends need their
/// matching record checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub enum TemplateKind {
    #[codec(index = 0)]
    Delegate,
    #[codec(index = 1)]
    Vote,
    #[codec(index = 2)]
    Fork,
    #[codec(index = 3)]
    Multisig,
    #[codec(index = 4)]
    Exchange,
    #[codec(index = 5)]
    DexOrder,
    #[codec(index = 6)]
    DexMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub enum Destination {
    #[codec(index = 0)]
    PubKey(H256),
    #[codec(index = 1)]
    Template(TemplateKind, H256),
}

impl Destination {
    pub fn template_kind(&self) -> Option<TemplateKind> {
        match self {
            Destination::PubKey(_) => None,
            Destination::Template(kind, _) => Some(*kind),
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::PubKey(key) => write!(f, "pubkey:{key:x}"),
            Destination::Template(kind, id) => write!(f, "{kind:?}:{id:x}"),
        }
    }
}
