//! Core types and traits for redisugar
//!
//! This crate defines the vocabulary shared by every layer:
//! - Error: the failure taxonomy and `Result` alias
//! - KeyType, End, ScoreBound, SetOptions, Number: primitive argument types
//! - Slice: index and slice normalization
//! - FromStored / Decoder: projection of stored strings into typed values
//! - Command / Reply: the primitive command set and its replies
//! - Gateway / GatewayExt: the execution seam and typed helpers
//! - Batch: scoped atomic command batches
//! - KeyScan, FieldScan, MemberScan: lazy cursor iterators

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod command;
pub mod error;
pub mod scan;
pub mod slice;
pub mod traits;
pub mod types;
pub mod value;

pub use batch::Batch;
pub use command::{Command, Reply};
pub use error::{Error, Result};
pub use scan::{FieldScan, KeyScan, MemberScan, SCAN_PAGE};
pub use slice::{check_index, normalize_index, ResolvedSlice, Slice};
pub use traits::{Gateway, GatewayExt};
pub use types::{
    format_score, parse_score, Aggregate, End, InsertPosition, KeyType, Number, ScoreBound,
    SetOptions,
};
pub use value::{default_decoder, Decoder, FromStored};
