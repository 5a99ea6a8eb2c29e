//! redisugar - native collection adapters over a Redis-compatible store
//!
//! Every adapter is a thin, stateless handle bound to one key. All reads and
//! writes go to the store, so two handles on the same key always agree.
//!
//! # Quick Start
//!
//! ```ignore
//! use redisugar::{Namespace, LocalValue, Sugar};
//!
//! // In-process store with the remote store's semantics
//! let ns = Namespace::new(Sugar::in_memory());
//!
//! ns.set("queue", vec!["a", "b", "c"])?;
//! let queue = ns.list("queue");
//! queue.set_slice(1..2, ["x", "y"])?;
//! assert_eq!(queue.copy()?, vec!["a", "x", "y", "c"]);
//! ```
//!
//! # Architecture
//!
//! - `sugar-core`: errors, slices, commands and the `Gateway` seam
//! - `sugar-storage`: in-process `MemoryStore` and snapshot files
//! - `sugar-wire`: RESP2 client gateway
//! - `sugar-engine`: the `Sugar` handle and `redisugar.toml` config
//! - `sugar-primitives`: `RList`, `RDict`, `RSet`, `SortedSet`, `RStr`
//! - `sugar-api`: the `Namespace` facade

pub use sugar_api::{Entry, LocalValue, Namespace};
pub use sugar_core::{
    Aggregate, End, Error, InsertPosition, KeyType, Number, Result, ScoreBound, SetOptions, Slice,
};
pub use sugar_engine::{Endpoint, GatewayRegistry, Sugar, SugarConfig};
pub use sugar_primitives::{
    DictUpdate, ListIter, ListOperand, RDict, RList, RSet, RStr, SetOperand, SortedSet,
    SortedSetIter,
};
pub use sugar_storage::MemoryStore;
pub use sugar_wire::{RespGateway, WireOptions};
