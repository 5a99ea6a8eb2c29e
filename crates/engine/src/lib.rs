//! Engine layer for redisugar
//!
//! This crate wires gateways to callers:
//! - Sugar: opened handle owning the shared gateway (in-memory, snapshot-backed or remote)
//! - SugarConfig: `redisugar.toml` endpoint, pool and timeout settings
//! - Endpoint / GatewayRegistry: one remote gateway per `(host, port, db)`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod registry;
pub mod sugar;

pub use config::{SugarConfig, CONFIG_FILE_NAME};
pub use registry::{Endpoint, GatewayRegistry};
pub use sugar::Sugar;
