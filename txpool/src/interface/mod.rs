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

//! Collaborators the pool consults but does not own.

mod chain_update;

use std::collections::BTreeMap;

use common::{
    chain::{Block, Destination, ForkId, ForkProfile, ForkStatus, OutPoint, Transaction, TxOutput},
    primitives::{Amount, BlockHeight, Id},
};

use crate::error::{StorageError, VerifyError};

pub use chain_update::{BlockEx, ChainUpdate, TxContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLocation {
    pub fork: ForkId,
    pub height: BlockHeight,
}

/// Read access to confirmed chain state.
pub trait Ledger: Send + Sync {
    /// Fork and height of a confirmed block, `None` if the block is unknown.
    fn block_location(&self, block: &Id<Block>) -> Result<Option<BlockLocation>, StorageError>;

    fn last_block_status(&self, fork: &ForkId) -> Result<ForkStatus, StorageError>;

    /// Confirmed unspent outputs for `inputs`, position by position; `None` where the
    /// output is spent or does not exist.
    fn resolve_unspent(
        &self,
        fork: &ForkId,
        inputs: &[OutPoint],
    ) -> Result<Vec<Option<TxOutput>>, StorageError>;

    fn fork_profile(&self, fork: &ForkId) -> Result<ForkProfile, StorageError>;

    fn fork_statuses(&self) -> Result<BTreeMap<ForkId, ForkStatus>, StorageError>;

    /// Remaining certificate allowance per delegate at `block`.
    fn delegate_cert_tx_counts(
        &self,
        block: &Id<Block>,
    ) -> Result<BTreeMap<Destination, u32>, StorageError>;

    fn delegate_votes(&self, block: &Id<Block>)
        -> Result<BTreeMap<Destination, Amount>, StorageError>;

    fn min_enroll_amount(&self, block: &Id<Block>) -> Result<Amount, StorageError>;

    /// Whether `dest` may be linked into the relation tree rooted at `root`.
    fn check_add_relation(
        &self,
        fork: &ForkId,
        dest: &Destination,
        root: &Destination,
    ) -> Result<bool, StorageError>;

    /// The fork delegate certificates are tracked on.
    fn primary_fork(&self) -> ForkId;
}

/// Consensus checks. Implementations are stateless with respect to the pool.
#[cfg_attr(test, mockall::automock)]
pub trait TxVerifier: Send + Sync {
    fn verify_transaction(
        &self,
        tx: &Transaction,
        inputs: &[TxOutput],
        height: BlockHeight,
        fork: &ForkId,
        profile: &ForkProfile,
    ) -> Result<(), VerifyError>;

    fn verify_mint_height_tx(
        &self,
        tx: &Transaction,
        dest_in: &Destination,
        fork: &ForkId,
        height: BlockHeight,
    ) -> Result<(), VerifyError>;

    fn verify_fork_redeem(
        &self,
        tx: &Transaction,
        dest_in: &Destination,
        fork: &ForkId,
        last_block: &Id<Block>,
        value_in: Amount,
    ) -> Result<(), VerifyError>;

    fn verify_fork_creation(
        &self,
        tx: &Transaction,
        dest_in: &Destination,
        fork: &ForkId,
        height: BlockHeight,
    ) -> Result<(), VerifyError>;

    fn verify_dex_match(
        &self,
        tx: &Transaction,
        dest_in: &Destination,
        fork: &ForkId,
        height: BlockHeight,
    ) -> Result<(), VerifyError>;

    fn verify_dest_activated(
        &self,
        tx: &Transaction,
        last_block: &Id<Block>,
    ) -> Result<(), VerifyError>;
}
