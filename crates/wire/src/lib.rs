//! RESP2 transport for redisugar
//!
//! - `resp`: reply parser and request encoder
//! - `args`: `Command` to argument-vector translation
//! - `Connection`: one blocking TCP session
//! - `RespGateway`: pooled `Gateway` implementation with `MULTI`/`EXEC` batches

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod args;
pub mod connection;
pub mod gateway;
pub mod resp;

pub use args::command_args;
pub use connection::Connection;
pub use gateway::{RespGateway, WireOptions};
pub use resp::{encode_request, parse_reply, Parsed};
