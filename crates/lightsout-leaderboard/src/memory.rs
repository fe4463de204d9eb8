//! In-process [`ScoreStore`] for tests and embedders that do not need
//! durability.

use lightsout_types::ScoreRecord;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::store::{LoadOutcome, ScoreStore};

/// A store that keeps records in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ScoreRecord>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `records`, kept in the given order.
    pub fn with_records(records: Vec<ScoreRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Copy of the stored records.
    pub async fn records(&self) -> Vec<ScoreRecord> {
        self.records.lock().await.clone()
    }
}

impl ScoreStore for MemoryStore {
    async fn load(&self) -> Result<LoadOutcome, StoreError> {
        Ok(LoadOutcome::clean(self.records.lock().await.clone()))
    }

    async fn save(&self, records: &[ScoreRecord]) -> Result<(), StoreError> {
        let mut guard = self.records.lock().await;
        guard.clear();
        guard.extend_from_slice(records);
        Ok(())
    }
}
