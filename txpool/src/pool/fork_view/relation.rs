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

use common::chain::{Destination, Transaction};
use common::primitives::Id;

use crate::error::RelationError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct RelationNode {
    parent: Destination,
    tx_id: Id<Transaction>,
}

/// Parent links declared by pooled relation transactions of one fork.
///
/// Each destination has at most one parent and the links never form a cycle.
#[derive(Debug, Default)]
pub struct RelationTree {
    nodes: BTreeMap<Destination, RelationNode>,
}

impl RelationTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `dest` may be linked under `parent` and return the root the link would
    /// end up under.
    pub fn check_insert(
        &self,
        dest: &Destination,
        parent: &Destination,
    ) -> Result<Destination, RelationError> {
        utils::ensure!(dest != parent, RelationError::SelfReference(*dest));
        utils::ensure!(
            !self.nodes.contains_key(dest),
            RelationError::AlreadyLinked(*dest)
        );

        let mut root = *parent;
        while let Some(node) = self.nodes.get(&root) {
            utils::ensure!(
                node.parent != *dest,
                RelationError::Cycle {
                    dest: *dest,
                    parent: *parent,
                }
            );
            root = node.parent;
        }
        Ok(root)
    }

    pub fn insert(
        &mut self,
        dest: Destination,
        parent: Destination,
        tx_id: Id<Transaction>,
    ) -> Result<Destination, RelationError> {
        let root = self.check_insert(&dest, &parent)?;
        self.nodes.insert(dest, RelationNode { parent, tx_id });
        Ok(root)
    }

    /// Drop the link of `dest`. Links of its children stay in place.
    pub fn remove(&mut self, dest: &Destination) -> Option<Id<Transaction>> {
        self.nodes.remove(dest).map(|node| node.tx_id)
    }

    pub fn parent(&self, dest: &Destination) -> Option<&Destination> {
        self.nodes.get(dest).map(|node| &node.parent)
    }

    pub fn clear(&mut self) {
        self.nodes.clear()
    }
}
