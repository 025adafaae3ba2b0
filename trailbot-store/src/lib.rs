//! Trailbot Storage Layer
//!
//! Persists closed trades.
//!
//! # Architecture
//!
//! - **Journal trait**: the append-only storage interface (port)
//! - **File journal**: one text line per trade, the production sink
//! - **In-memory journal**: fast implementation for testing
//!
//! # Usage
//!
//! ```rust
//! use trailbot_store::{MemoryJournal, TradeJournal};
//!
//! #[tokio::main]
//! async fn main() {
//!     let journal = MemoryJournal::new();
//!     assert_eq!(journal.len().await.unwrap(), 0);
//! }
//! ```

#![warn(clippy::all)]

// Modules
mod error;
mod file;
mod journal;
mod memory;

// Re-exports
pub use error::StoreError;
pub use file::{FileJournal, DEFAULT_TRADE_LOG};
pub use journal::TradeJournal;
pub use memory::MemoryJournal;
