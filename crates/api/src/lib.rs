//! Public API layer for redisugar
//!
//! This crate provides the top-level interface:
//! - **Namespace**: mapping-like view of a whole store database
//! - **Entry**: the adapter a key resolves to, by remote type
//! - **LocalValue**: in-process values written to and popped from keys
//!
//! ## Quick Start
//!
//! ```ignore
//! use sugar_api::{LocalValue, Namespace};
//! use sugar_engine::Sugar;
//!
//! let ns = Namespace::new(Sugar::in_memory());
//! ns.set("fruits", LocalValue::set(["apple", "pear"]))?;
//! let fruits = ns.get("fruits")?.into_set()?;
//! assert!(fruits.contains("apple")?);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod facade;

pub use facade::{Entry, LocalValue, Namespace};
