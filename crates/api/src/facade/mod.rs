//! Facade API - the key space as a mapping
//!
//! `Namespace` maps namespace keys to adapters:
//! - Reads introspect the key's remote type and return the matching
//!   `Entry` variant
//! - Writes take a `LocalValue` and dispatch on its shape
//! - Maintenance operations (flush, persist, rename, dump/restore) act on
//!   the whole database
//!
//! ## Module Structure
//!
//! - `types`: `Entry` and `LocalValue`
//! - `namespace`: the `Namespace` facade

pub mod namespace;
pub mod types;

pub use namespace::Namespace;
pub use types::{Entry, LocalValue};
