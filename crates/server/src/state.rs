//! Application state shared across handlers.

use locker_core::GatewaySecret;
use locker_core::config::AppConfig;
use locker_storage::ObjectStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Object storage backend.
    pub storage: Arc<dyn ObjectStore>,
    /// Envelope secret shared with the grant issuer.
    pub secret: GatewaySecret,
    /// Verifier secret, resolved at startup when /v1/verify is configured.
    pub verify_secret: Option<Arc<str>>,
    /// Outbound HTTP client for the verification proxy.
    pub http: reqwest::Client,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn ObjectStore>,
        secret: GatewaySecret,
        verify_secret: Option<String>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            secret,
            verify_secret: verify_secret.map(Arc::from),
            http: reqwest::Client::new(),
        }
    }
}
