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

use thiserror::Error;

use common::{
    chain::{Block, Destination, ForkId, OutPoint, Transaction},
    primitives::Id,
};

use crate::pool::SequenceNumber;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Transaction {0} is already in the pool")]
    AlreadyPresent(Id<Transaction>),

    #[error(transparent)]
    Invalid(#[from] TxValidationError),

    #[error("Transaction {tx_id} spends {outpoint} which is already spent or does not exist")]
    ConflictingInput {
        tx_id: Id<Transaction>,
        outpoint: OutPoint,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Quota(#[from] QuotaError),

    #[error("Transaction {0} not found in the pool")]
    NotFound(Id<Transaction>),

    #[error("Ordering error: {0}")]
    Ordering(#[from] SequenceError),

    #[error("Chain tip mismatch: pool is at {pool}, caller is at {caller}")]
    TipMismatch { pool: Id<Block>, caller: Id<Block> },

    #[error("No arrangement cached for block {anchor} of fork {fork}")]
    ArrangementUnavailable { fork: ForkId, anchor: Id<Block> },

    #[error("Fork {0} is unknown to the pool")]
    UnknownFork(ForkId),
}

/// Reasons a transaction is rejected on its own merits.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TxValidationError {
    #[error("Reward transactions are not accepted into the pool")]
    RewardTransaction,

    #[error("Anchor block {0} is not known to the ledger")]
    UnknownAnchor(Id<Block>),

    #[error("Transaction has no inputs")]
    NoInputs,

    #[error("Sum of input values overflows")]
    InputValueOverflow,

    #[error("Inputs belong to different destinations: {first} and {other}")]
    MixedInputDestinations {
        first: Destination,
        other: Destination,
    },

    #[error("Relation transactions are only allowed on DeFi forks")]
    RelationNotAllowed,

    #[error(transparent)]
    Relation(#[from] RelationError),

    #[error("Ledger rejected relation of {dest} under root {root}")]
    RelationRejected { dest: Destination, root: Destination },

    #[error("Verification failed: {0}")]
    Verifier(#[from] VerifyError),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelationError {
    #[error("Destination {0} cannot be its own parent")]
    SelfReference(Destination),

    #[error("Destination {0} already has a parent")]
    AlreadyLinked(Destination),

    #[error("Linking {dest} under {parent} would create a cycle")]
    Cycle {
        dest: Destination,
        parent: Destination,
    },
}

/// Rejection reported by the transaction verifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Rule violated: {0}")]
    Rule(String),

    #[error("Destination {0} is not activated")]
    NotActivated(Destination),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("No profile recorded for fork {0}")]
    ForkProfileMissing(ForkId),

    #[error("No last block recorded for fork {0}")]
    LastBlockMissing(ForkId),

    #[error("Failed to access pool data file {path:?}: {message}")]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Corrupted pool data: {0}")]
    Format(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuotaError {
    #[error("Too many pooled certificate transactions for {0}")]
    TooManyCertTxs(Destination),

    #[error("Fork {fork} already has a pooled mint height transaction {existing}")]
    DuplicateMintHeightTx {
        fork: ForkId,
        existing: Id<Transaction>,
    },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("Sequence label space exhausted")]
    LabelSpaceExhausted,

    #[error("No free label left in the bucket below {0}")]
    BucketExhausted(SequenceNumber),

    #[error("Label {0} is already taken")]
    LabelCollision(SequenceNumber),

    #[error("Gave up looking for a free label below {label} after scanning {scanned} labels")]
    ScanLimitExceeded { label: SequenceNumber, scanned: usize },
}

impl From<VerifyError> for Error {
    fn from(e: VerifyError) -> Self {
        TxValidationError::from(e).into()
    }
}

impl From<RelationError> for Error {
    fn from(e: RelationError) -> Self {
        TxValidationError::from(e).into()
    }
}
