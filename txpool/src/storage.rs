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

use std::path::{Path, PathBuf};

use parity_scale_codec::{DecodeAll, Encode};
use parking_lot::Mutex;

use logging::log;

use crate::{error::StorageError, types::StoredTx};

pub const TXPOOL_DATA_FILENAME: &str = "txpool.dat";

const FORMAT_VERSION: u32 = 1;

/// Flat persistence of the pooled transaction list.
///
/// `save` receives the transactions in label order and `load` must return them in the
/// same order.
pub trait TxPoolStorage: Send + Sync {
    fn load(&self) -> Result<Vec<StoredTx>, StorageError>;
    fn save(&self, txs: &[StoredTx]) -> Result<(), StorageError>;
}

/// SCALE-encoded pool snapshot in a single file.
pub struct FileTxPoolStorage {
    path: PathBuf,
}

impl FileTxPoolStorage {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(TXPOOL_DATA_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, path: &Path, e: std::io::Error) -> StorageError {
        StorageError::Io {
            path: path.to_owned(),
            message: e.to_string(),
        }
    }
}

impl TxPoolStorage for FileTxPoolStorage {
    fn load(&self) -> Result<Vec<StoredTx>, StorageError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No pool data at {:?}, starting empty", self.path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(&self.path, e)),
        };

        let (version, txs) = <(u32, Vec<StoredTx>)>::decode_all(&mut bytes.as_slice())
            .map_err(|e| StorageError::Format(e.to_string()))?;
        if version != FORMAT_VERSION {
            return Err(StorageError::Format(format!(
                "unsupported format version {version}"
            )));
        }
        log::debug!("Loaded {} pool entries from {:?}", txs.len(), self.path);
        Ok(txs)
    }

    fn save(&self, txs: &[StoredTx]) -> Result<(), StorageError> {
        // Written aside and renamed into place
        let tmp_path = self.path.with_extension("dat.tmp");
        let encoded = (FORMAT_VERSION, txs).encode();
        std::fs::write(&tmp_path, encoded).map_err(|e| self.io_error(&tmp_path, e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(&self.path, e))?;
        log::debug!("Saved {} pool entries to {:?}", txs.len(), self.path);
        Ok(())
    }
}

/// Keeps the snapshot in memory; for tests and nodes running without a data directory.
#[derive(Default)]
pub struct InMemoryTxPoolStorage {
    txs: Mutex<Vec<StoredTx>>,
}

impl InMemoryTxPoolStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_txs(txs: Vec<StoredTx>) -> Self {
        Self {
            txs: Mutex::new(txs),
        }
    }

    pub fn stored(&self) -> Vec<StoredTx> {
        self.txs.lock().clone()
    }
}

impl TxPoolStorage for InMemoryTxPoolStorage {
    fn load(&self) -> Result<Vec<StoredTx>, StorageError> {
        Ok(self.txs.lock().clone())
    }

    fn save(&self, txs: &[StoredTx]) -> Result<(), StorageError> {
        *self.txs.lock() = txs.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssembledTx;
    use common::{
        chain::{Destination, OutPoint, Transaction, TxType},
        primitives::{Amount, Id, H256},
    };

    fn stored(n: u64) -> StoredTx {
        let tx = Transaction::new(
            TxType::Token,
            Id::new(H256::from_low_u64_be(100)),
            vec![OutPoint::new(Id::new(H256::from_low_u64_be(n)), 0)],
            Destination::PubKey(H256::from_low_u64_be(n + 1)),
            Amount::from_atoms(n.into()),
            Amount::from_atoms(10_000),
        );
        StoredTx {
            fork: Id::new(H256::from_low_u64_be(1)),
            tx_id: tx.get_id(),
            tx: AssembledTx {
                tx,
                block_height: None,
                dest_in: Some(Destination::PubKey(H256::from_low_u64_be(7))),
                value_in: Amount::from_atoms(1_000_000),
            },
        }
    }

    #[test]
    fn file_storage_keeps_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = FileTxPoolStorage::new(dir.path());
        assert_eq!(storage.load().unwrap(), Vec::new());

        let txs = vec![stored(3), stored(1), stored(2)];
        storage.save(&txs).unwrap();
        assert_eq!(storage.load().unwrap(), txs);
        assert!(!storage.path().with_extension("dat.tmp").exists());

        storage.save(&txs[..1]).unwrap();
        assert_eq!(storage.load().unwrap(), txs[..1].to_vec());
    }

    #[test]
    fn file_storage_rejects_garbage() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = FileTxPoolStorage::new(dir.path());
        std::fs::write(storage.path(), [1u8, 2, 3]).unwrap();
        assert!(matches!(storage.load(), Err(StorageError::Format(_))));

        std::fs::write(storage.path(), (7u32, Vec::<StoredTx>::new()).encode()).unwrap();
        assert!(matches!(storage.load(), Err(StorageError::Format(_))));
    }
}
