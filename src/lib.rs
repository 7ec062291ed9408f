//! JotDB: an embedded, collection-oriented JSON key-value store built on
//! append-only logs.
//!
//! Each collection owns one `.jsonl` log file and the in-memory index derived
//! from it. Writes append a record to the log and update the index; reads are
//! index lookups that never touch disk. A buffered flush policy trades
//! durability for throughput, and background compaction rewrites a log down
//! to its live keys while the store keeps serving.
//!
//! # Features
//!
//! * Crash-safe recovery by log replay, skipping corrupt lines
//! * Last-write-wins puts and tombstone-based deletes
//! * Deterministic prefix listing with offset/limit pagination
//! * Online compaction behind a single-slot background trigger
//! * Any number of collections sharing one store directory
//!
//! # Basic Usage
//!
//! ```
//! use jotdb::{option::Options, store::Store};
//!
//! let mut opts = Options::default();
//! opts.dir_path = std::env::temp_dir().join("jotdb-doc");
//! let store = Store::open(opts).expect("failed to open store");
//!
//! store
//!   .put("default", "greeting", r#"{"message":"hello"}"#.into())
//!   .expect("failed to put");
//!
//! let value = store.get("default", "greeting");
//! assert!(value.is_some());
//! ```

pub mod collection;
pub mod compact;
pub mod data;
pub mod errors;
pub mod option;
pub mod store;
pub mod util;
