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

use common::{chain::Transaction, primitives::Amount};

use crate::types::ArrangedBlock;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TxAccumulatorError {
    #[error("Fee overflow: {0} + {1} failed")]
    FeeAccumulationError(Amount, Amount),
}

pub trait TransactionAccumulator {
    /// Add a transaction if it fits into the remaining size budget, otherwise mark the
    /// accumulator as done. On error the accumulator is left unchanged.
    fn add_tx(&mut self, tx: Transaction, size: usize, fee: Amount)
        -> Result<(), TxAccumulatorError>;
    fn fits(&self, size: usize) -> bool;
    fn done(&self) -> bool;
    fn transactions(&self) -> &[Transaction];
    fn total_fees(&self) -> Amount;
    fn total_size(&self) -> usize;
}

pub struct DefaultTxAccumulator {
    txs: Vec<Transaction>,
    total_size: usize,
    target_size: usize,
    done: bool,
    total_fees: Amount,
}

impl DefaultTxAccumulator {
    pub fn new(target_size: usize) -> Self {
        Self {
            txs: Vec::new(),
            total_size: 0,
            target_size,
            done: false,
            total_fees: Amount::ZERO,
        }
    }

    pub fn into_block(self) -> ArrangedBlock {
        ArrangedBlock {
            txs: self.txs,
            total_fee: self.total_fees,
            total_size: self.total_size,
        }
    }
}

impl TransactionAccumulator for DefaultTxAccumulator {
    fn add_tx(
        &mut self,
        tx: Transaction,
        size: usize,
        fee: Amount,
    ) -> Result<(), TxAccumulatorError> {
        if self.fits(size) {
            self.total_fees = (self.total_fees + fee)
                .ok_or(TxAccumulatorError::FeeAccumulationError(self.total_fees, fee))?;
            self.total_size += size;
            self.txs.push(tx);
        } else {
            self.done = true
        };
        Ok(())
    }

    fn fits(&self, size: usize) -> bool {
        !self.done && self.total_size.saturating_add(size) <= self.target_size
    }

    fn done(&self) -> bool {
        self.done
    }

    fn transactions(&self) -> &[Transaction] {
        &self.txs
    }

    fn total_fees(&self) -> Amount {
        self.total_fees
    }

    fn total_size(&self) -> usize {
        self.total_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{
        chain::{Destination, OutPoint, TxType},
        primitives::{Id, H256},
    };

    fn tx(n: u64) -> Transaction {
        Transaction::new(
            TxType::Token,
            Id::zero(),
            vec![OutPoint::new(Id::new(H256::from_low_u64_be(n)), 0)],
            Destination::PubKey(H256::from_low_u64_be(n)),
            Amount::from_atoms(1),
            Amount::from_atoms(n.into()),
        )
    }

    #[test]
    fn stops_at_budget() {
        let mut acc = DefaultTxAccumulator::new(250);
        acc.add_tx(tx(1), 100, Amount::from_atoms(1)).unwrap();
        acc.add_tx(tx(2), 100, Amount::from_atoms(2)).unwrap();
        assert!(!acc.done());
        acc.add_tx(tx(3), 100, Amount::from_atoms(3)).unwrap();
        assert!(acc.done());
        // nothing is accepted after the budget was hit, even if it would fit
        acc.add_tx(tx(4), 10, Amount::from_atoms(4)).unwrap();

        assert_eq!(acc.transactions(), &[tx(1), tx(2)]);
        let block = acc.into_block();
        assert_eq!(block.total_size, 200);
        assert_eq!(block.total_fee, Amount::from_atoms(3));
    }

    #[test]
    fn fee_overflow_leaves_state_untouched() {
        let mut acc = DefaultTxAccumulator::new(1000);
        acc.add_tx(tx(1), 10, Amount::MAX).unwrap();
        assert_eq!(
            acc.add_tx(tx(2), 10, Amount::from_atoms(1)),
            Err(TxAccumulatorError::FeeAccumulationError(
                Amount::MAX,
                Amount::from_atoms(1)
            ))
        );
        assert_eq!(acc.transactions().len(), 1);
        assert_eq!(acc.total_size(), 10);
    }
}
