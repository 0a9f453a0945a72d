//! Batch orchestration: uploaded documents in, differential report out.
//!
//! Wires the NF-e parser, the record store and the aggregator together.
//! Processing is synchronous and request-scoped; each document is handled
//! independently and alerts accumulate in processing order.
//!
//! # Example
//!
//! ```
//! use difal::batch::*;
//!
//! let mut store = MemoryStore::new();
//! let docs = vec![Document::new("readme.txt", b"ignored".to_vec())];
//!
//! let failure = process_batch(&mut store, &docs, &BatchConfig::default()).unwrap_err();
//! assert!(matches!(failure.error, BatchError::NoQualifyingItems));
//! ```

mod config;
mod process;
mod store;

pub use config::{BatchConfig, BatchConfigBuilder};
pub use process::{BatchError, BatchFailure, BatchReport, Document, process_batch};
pub use store::{MemoryStore, RecordStore, ensure_client};
