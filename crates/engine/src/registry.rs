//! Caller-owned registry of gateways keyed by endpoint
//!
//! One `RespGateway` exists per distinct `(host, port, db)` for the lifetime
//! of the registry. Gateways are created on first use and never torn down
//! while the registry lives.

use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use sugar_core::Result;
use sugar_wire::RespGateway;
use tracing::info;

use crate::config::SugarConfig;

/// Identity of one logical store database
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Host name or address
    pub host: String,
    /// TCP port
    pub port: u16,
    /// Logical database index
    pub db: u32,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.port, self.db)
    }
}

/// Gateways by endpoint
#[derive(Debug, Default)]
pub struct GatewayRegistry {
    gateways: DashMap<Endpoint, Arc<RespGateway>>,
}

impl GatewayRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway for the config's endpoint, connecting on first use
    ///
    /// # Errors
    ///
    /// `Connection` if the endpoint cannot be reached; nothing is registered
    /// in that case.
    pub fn get_or_connect(&self, config: &SugarConfig) -> Result<Arc<RespGateway>> {
        config.validate()?;
        let endpoint = config.endpoint();
        if let Some(existing) = self.gateways.get(&endpoint) {
            return Ok(Arc::clone(existing.value()));
        }
        let entry = self
            .gateways
            .entry(endpoint.clone())
            .or_try_insert_with(|| RespGateway::connect(config.wire_options()).map(Arc::new))?;
        info!(target: "sugar::gateway", %endpoint, "Gateway registered");
        Ok(Arc::clone(entry.value()))
    }

    /// Registered gateway, if any
    pub fn get(&self, endpoint: &Endpoint) -> Option<Arc<RespGateway>> {
        self.gateways.get(endpoint).map(|g| Arc::clone(g.value()))
    }

    /// Number of registered endpoints
    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    /// No endpoint registered yet
    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sugar_core::Error;

    #[test]
    fn endpoint_identity() {
        let a = SugarConfig::default().endpoint();
        let b = SugarConfig {
            db: 1,
            ..SugarConfig::default()
        }
        .endpoint();
        assert_ne!(a, b);
        assert_eq!(a, SugarConfig::default().endpoint());
    }

    #[test]
    fn failed_connect_registers_nothing() {
        let registry = GatewayRegistry::new();
        let config = SugarConfig {
            port: 1,
            connect_timeout_ms: 200,
            ..SugarConfig::default()
        };
        let err = registry.get_or_connect(&config).unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
        assert!(registry.is_empty());
        assert!(registry.get(&config.endpoint()).is_none());
    }

    #[test]
    fn invalid_config_is_rejected_before_connecting() {
        let registry = GatewayRegistry::new();
        let config = SugarConfig {
            pool_size: 0,
            ..SugarConfig::default()
        };
        assert!(matches!(
            registry.get_or_connect(&config),
            Err(Error::InvalidArgument(_))
        ));
    }
}
