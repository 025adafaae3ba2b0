//! In-memory journal implementation
//!
//! Used for testing and dry runs without touching the filesystem.
//! Thread-safe using RwLock for concurrent access.

use crate::error::StoreError;
use crate::journal::TradeJournal;
use async_trait::async_trait;
use std::sync::RwLock;
use trailbot_domain::TradeRecord;

/// In-memory trade journal
#[derive(Debug, Default)]
pub struct MemoryJournal {
    records: RwLock<Vec<TradeRecord>>,
}

impl MemoryJournal {
    /// Create a new empty journal
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all appended records, oldest first
    pub fn records(&self) -> Result<Vec<TradeRecord>, StoreError> {
        Ok(self.records.read().map_err(|_| StoreError::Poisoned)?.clone())
    }

    /// Rendered journal lines, oldest first
    pub fn lines(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.records()?.iter().map(TradeRecord::journal_line).collect())
    }
}

#[async_trait]
impl TradeJournal for MemoryJournal {
    async fn append(&self, record: &TradeRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .push(record.clone());
        Ok(())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().map_err(|_| StoreError::Poisoned)?.len())
    }
}
