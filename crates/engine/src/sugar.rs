//! `Sugar`: an opened handle to one store
//!
//! The handle owns the gateway every adapter shares. It is created in one of
//! three ways:
//!
//! ```ignore
//! use sugar_engine::{Sugar, SugarConfig};
//!
//! // 1. In-process store (tests, embedding)
//! let sugar = Sugar::in_memory();
//!
//! // 2. In-process store reloaded from and saved to a snapshot file
//! let sugar = Sugar::open("/data/sugar.snapshot")?;
//!
//! // 3. Remote store over TCP
//! let sugar = Sugar::connect(&SugarConfig::default())?;
//! ```
//!
//! Opening a remote handle pings the store once; an unreachable store is
//! reported as `Error::Connection` and never retried.

use std::path::Path;
use std::sync::Arc;
use sugar_core::{Batch, Gateway, GatewayExt, Reply, Result};
use sugar_storage::MemoryStore;
use tracing::info;

use crate::config::SugarConfig;
use crate::registry::GatewayRegistry;

/// Shared handle to a gateway
#[derive(Clone)]
pub struct Sugar {
    gateway: Arc<dyn Gateway>,
}

impl std::fmt::Debug for Sugar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sugar").finish_non_exhaustive()
    }
}

impl Sugar {
    /// Wrap an existing gateway
    pub fn from_gateway(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    /// Fresh in-process store with no persistence
    pub fn in_memory() -> Self {
        Self::from_gateway(Arc::new(MemoryStore::new()))
    }

    /// In-process store backed by a snapshot file
    ///
    /// The snapshot is loaded if it exists; `save`/`bgsave` write to it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let store = MemoryStore::open(path)?;
        info!(
            target: "sugar::store",
            path = %path.display(),
            keys = store.len(),
            "Opened snapshot-backed store"
        );
        Ok(Self::from_gateway(Arc::new(store)))
    }

    /// Connect to the remote store described by `config`
    ///
    /// Each call builds a private gateway. Use `connect_shared` to reuse one
    /// gateway per endpoint.
    pub fn connect(config: &SugarConfig) -> Result<Self> {
        config.validate()?;
        let gateway = sugar_wire::RespGateway::connect(config.wire_options())?;
        Ok(Self::from_gateway(Arc::new(gateway)))
    }

    /// Connect through `registry`, reusing its gateway for the endpoint
    pub fn connect_shared(registry: &GatewayRegistry, config: &SugarConfig) -> Result<Self> {
        let gateway: Arc<dyn Gateway> = registry.get_or_connect(config)?;
        Ok(Self::from_gateway(gateway))
    }

    /// The shared gateway
    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    /// Round trip to the store
    pub fn ping(&self) -> Result<()> {
        self.gateway.ping()
    }

    /// Build a batch in `f` and apply it atomically
    ///
    /// If `f` fails, nothing is sent and the error is returned.
    pub fn batch<T, F>(&self, f: F) -> Result<(T, Vec<Reply>)>
    where
        F: FnOnce(&mut Batch) -> Result<T>,
    {
        Batch::run(Arc::clone(&self.gateway), f)
    }
}
