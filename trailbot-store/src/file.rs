//! Plain-text trade journal
//!
//! One rendered line per closed trade, appended to a file that is created on
//! first use. Existing content is never rewritten.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;
use trailbot_domain::TradeRecord;

use crate::error::StoreError;
use crate::journal::TradeJournal;

/// Default journal file name.
pub const DEFAULT_TRADE_LOG: &str = "trade_log.txt";

/// Appends journal lines to a text file.
#[derive(Debug)]
pub struct FileJournal {
    path: PathBuf,
    // Serializes appends so concurrent lines never interleave
    write_lock: Mutex<()>,
    appended: AtomicUsize,
}

impl FileJournal {
    /// Journal writing to `path`. Nothing is touched until the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            appended: AtomicUsize::new(0),
        }
    }

    /// Journal file location
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TradeJournal for FileJournal {
    async fn append(&self, record: &TradeRecord) -> Result<(), StoreError> {
        let mut line = record.journal_line();
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let path = self.path.display().to_string();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        file.flush().await.map_err(|e| StoreError::io(&path, e))?;

        self.appended.fetch_add(1, Ordering::SeqCst);
        debug!(path = %path, position_id = %record.position_id, "Trade appended to journal");
        Ok(())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.appended.load(Ordering::SeqCst))
    }
}
