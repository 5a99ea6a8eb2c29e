//! Storage layer for redisugar
//!
//! This crate implements the in-process store engine:
//! - MemoryStore: `Gateway` implementation with the remote store's semantics
//! - StoredValue / Entry: per-key values with optional expiry
//! - ZSetValue: dual-indexed ordered-score set
//! - TtlIndex: expiry index swept before each command
//! - Dump payloads and snapshot files (versioned, CRC32-checked frames)
//! - Glob matching for key scans

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod format;
pub mod glob;
pub mod range;
pub mod store;
pub mod ttl;
pub mod value;
pub mod zset;

pub use format::{decode_dump, encode_dump, read_snapshot, write_snapshot};
pub use glob::glob_match;
pub use store::MemoryStore;
pub use ttl::TtlIndex;
pub use value::{Entry, StoredValue};
pub use zset::ZSetValue;
