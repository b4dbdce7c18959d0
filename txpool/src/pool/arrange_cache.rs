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

use common::{
    chain::{Block, ForkId},
    primitives::{BlockHeight, Id},
};

use crate::types::ArrangedBlock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArrangement {
    /// Height of the block the arrangement is meant for.
    pub height: BlockHeight,
    pub block: ArrangedBlock,
}

/// Arranged next-block transaction lists, per fork and per anchor block.
///
/// Entries more than `depth` heights below the newest insertion are dropped.
#[derive(Debug)]
pub struct ArrangeCache {
    depth: u64,
    forks: BTreeMap<ForkId, BTreeMap<Id<Block>, CachedArrangement>>,
}

impl ArrangeCache {
    pub fn new(depth: u64) -> Self {
        Self {
            depth,
            forks: BTreeMap::new(),
        }
    }

    pub fn insert(
        &mut self,
        fork: ForkId,
        anchor: Id<Block>,
        height: BlockHeight,
        block: ArrangedBlock,
    ) {
        let depth = self.depth;
        let entries = self.forks.entry(fork).or_default();
        entries.retain(|_, cached| {
            cached.height.into_int().saturating_add(depth) > height.into_int()
        });
        entries.insert(anchor, CachedArrangement { height, block });
    }

    pub fn get(&self, fork: &ForkId, anchor: &Id<Block>) -> Option<&CachedArrangement> {
        self.forks.get(fork)?.get(anchor)
    }

    pub fn len(&self, fork: &ForkId) -> usize {
        self.forks.get(fork).map_or(0, BTreeMap::len)
    }

    pub fn clear(&mut self) {
        self.forks.clear()
    }
}
