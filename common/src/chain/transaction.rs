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

use super::{Block, Destination};
use crate::primitives::{hash_encoded, Amount, Id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub enum TxType {
    #[codec(index = 0)]
    Token,
    #[codec(index = 1)]
    Certification,
    #[codec(index = 2)]
    Genesis,
    #[codec(index = 3)]
    Stake,
    #[codec(index = 4)]
    Work,
    #[codec(index = 5)]
    DefiReward,
    #[codec(index = 6)]
    InvestReward,
    #[codec(index = 7)]
    DefiMintHeight,
    #[codec(index = 8)]
    DefiRelation,
}

impl TxType {
    /// Block rewards never travel through the pool.
    pub fn is_reward(&self) -> bool {
        matches!(self, TxType::Genesis | TxType::Stake | TxType::Work)
    }

    /// Fork-level payouts that appear in blocks without being pooled first.
    pub fn is_defi_payout(&self) -> bool {
        matches!(self, TxType::DefiReward | TxType::InvestReward)
    }
}

/// Reference to an output of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct OutPoint {
    tx_id: Id<Transaction>,
    index: u8,
}

impl OutPoint {
    pub fn new(tx_id: Id<Transaction>, index: u8) -> Self {
        Self { tx_id, index }
    }

    pub fn tx_id(&self) -> Id<Transaction> {
        self.tx_id
    }

    pub fn index(&self) -> u8 {
        self.index
    }
}

impl std::fmt::Display for OutPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct TxOutput {
    pub dest_to: Destination,
    pub amount: Amount,
    pub tx_time: u64,
    pub lock_until: u64,
}

/// A single-recipient transaction.
///
/// Outputs are not stored explicitly. Output 0 pays `amount` to `send_to`,
/// output 1 returns whatever the inputs hold beyond `amount + tx_fee` to the
/// spending destination, and is absent when there is no change.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Transaction {
    version: u16,
    tx_type: TxType,
    timestamp: u64,
    lock_until: u64,
    anchor: Id<Block>,
    inputs: Vec<OutPoint>,
    send_to: Destination,
    amount: Amount,
    tx_fee: Amount,
    data: Vec<u8>,
    signature: Vec<u8>,
}

impl Transaction {
    pub const CURRENT_VERSION: u16 = 1;

    pub const PAYMENT_OUTPUT: u8 = 0;
    pub const CHANGE_OUTPUT: u8 = 1;

    pub fn new(
        tx_type: TxType,
        anchor: Id<Block>,
        inputs: Vec<OutPoint>,
        send_to: Destination,
        amount: Amount,
        tx_fee: Amount,
    ) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            tx_type,
            timestamp: 0,
            lock_until: 0,
            anchor,
            inputs,
            send_to,
            amount,
            tx_fee,
            data: Vec::new(),
            signature: Vec::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_lock_until(mut self, lock_until: u64) -> Self {
        self.lock_until = lock_until;
        self
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn with_signature(mut self, signature: Vec<u8>) -> Self {
        self.signature = signature;
        self
    }

    pub fn get_id(&self) -> Id<Transaction> {
        Id::new(hash_encoded(self))
    }

    pub fn encoded_size(&self) -> usize {
        Encode::encoded_size(self)
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn tx_type(&self) -> TxType {
        self.tx_type
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn lock_until(&self) -> u64 {
        self.lock_until
    }

    pub fn anchor(&self) -> Id<Block> {
        self.anchor
    }

    pub fn inputs(&self) -> &[OutPoint] {
        &self.inputs
    }

    pub fn send_to(&self) -> &Destination {
        &self.send_to
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn tx_fee(&self) -> Amount {
        self.tx_fee
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn is_reward(&self) -> bool {
        self.tx_type.is_reward()
    }

    pub fn is_certification(&self) -> bool {
        self.tx_type == TxType::Certification
    }

    pub fn is_defi_relation(&self) -> bool {
        self.tx_type == TxType::DefiRelation
    }

    /// The output at `index`, given the spending destination and total input value.
    pub fn output(&self, index: u8, dest_in: &Destination, value_in: Amount) -> Option<TxOutput> {
        match index {
            Self::PAYMENT_OUTPUT => Some(TxOutput {
                dest_to: self.send_to,
                amount: self.amount,
                tx_time: self.timestamp,
                lock_until: self.lock_until,
            }),
            Self::CHANGE_OUTPUT => {
                let spent = (self.amount + self.tx_fee)?;
                let change = (value_in - spent).filter(|c| *c > Amount::ZERO)?;
                Some(TxOutput {
                    dest_to: *dest_in,
                    amount: change,
                    tx_time: self.timestamp,
                    lock_until: 0,
                })
            }
            _ => None,
        }
    }
}
