//! Adapter layer for redisugar
//!
//! Container facades over the store's native values:
//! - **RList**: mutable, sliceable sequence over a list
//! - **RDict**: string mapping over a field table
//! - **RSet**: set algebra over a set
//! - **SortedSet**: rank- and score-addressable collection over a sorted set
//! - **RStr**: in-place scalar mutation over a string
//!
//! ## Design Principle: Stateless Facades
//!
//! An adapter holds only the shared gateway and its namespace key. Nothing
//! is cached: every read is a round trip, and results documented as
//! snapshots (`copy`, `items`, algebra results) are independent of later
//! mutation. Dropping an adapter never touches remote data; `clear` deletes
//! the key.
//!
//! ## Batching
//!
//! Structural mutations that need several dependent writes (slice
//! assignment and deletion, middle insertion, reversal, mixed set updates)
//! send them as one atomic batch.
//!
//! ```rust,ignore
//! use sugar_engine::Sugar;
//! use sugar_primitives::RList;
//!
//! let sugar = Sugar::in_memory();
//! let list = RList::<i64>::typed(&sugar, "numbers");
//! list.extend([0, 1, 2, 3])?;
//! list.insert(1, 100)?;
//! assert_eq!(list.copy()?, vec![0, 100, 1, 2, 3]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dict;
pub mod list;
pub mod set;
pub mod sorted_set;
pub mod string;
mod support;

pub use dict::{DictUpdate, RDict};
pub use list::{ListIter, ListOperand, RList};
pub use set::{RSet, SetOperand};
pub use sorted_set::{SortedSet, SortedSetIter};
pub use string::RStr;
