//! Trade journal trait (Port)
//!
//! Closed trades are appended, never updated. Implementations can be a
//! plain text file, an in-memory list, or a mock for testing.

use crate::error::StoreError;
use async_trait::async_trait;
use trailbot_domain::TradeRecord;

/// Append-only sink for completed trades
#[async_trait]
pub trait TradeJournal: Send + Sync {
    /// Append one closed trade
    async fn append(&self, record: &TradeRecord) -> Result<(), StoreError>;

    /// Number of trades appended through this journal
    async fn len(&self) -> Result<usize, StoreError>;

    /// Whether no trade has been appended yet
    async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len().await? == 0)
    }
}
