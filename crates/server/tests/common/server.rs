//! Server test utilities.

use locker_core::GatewaySecret;
use locker_core::config::{AppConfig, SecretConfig, StorageConfig, VerifyConfig};
use locker_core::envelope;
use locker_core::grant::Grant;
use locker_server::{AppState, create_router};
use locker_storage::{FilesystemBackend, ObjectStore};
use std::sync::Arc;
use tempfile::TempDir;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: Option<TempDir>,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a test server backed by temporary filesystem storage.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with config modifications applied before
    /// the state is built.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let storage_path = temp_dir.path().join("storage");
        std::fs::create_dir_all(&storage_path).expect("Failed to create storage directory");
        let storage: Arc<dyn ObjectStore> = Arc::new(
            FilesystemBackend::new(&storage_path)
                .await
                .expect("Failed to create storage backend"),
        );

        let mut config = AppConfig::for_testing();
        config.storage = StorageConfig::Filesystem {
            path: storage_path,
        };
        modifier(&mut config);

        Self::build(config, storage, Some(temp_dir))
    }

    /// Create a test server around an injected object store.
    pub fn with_store(storage: Arc<dyn ObjectStore>) -> Self {
        Self::build(AppConfig::for_testing(), storage, None)
    }

    /// Create a test server around an injected store with config
    /// modifications.
    pub fn with_store_and_config<F>(storage: Arc<dyn ObjectStore>, modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = AppConfig::for_testing();
        modifier(&mut config);
        Self::build(config, storage, None)
    }

    fn build(config: AppConfig, storage: Arc<dyn ObjectStore>, temp_dir: Option<TempDir>) -> Self {
        let material = config
            .secret
            .load()
            .expect("Failed to load test gateway secret");
        let secret =
            GatewaySecret::from_material(&material).expect("Invalid test gateway secret");

        let verify_secret = config
            .verify
            .as_ref()
            .map(|v| v.secret.load().expect("Failed to load test verifier secret"));

        let state = AppState::new(config, storage, secret, verify_secret);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Seal a grant under the server's secret, exactly as the issuer
    /// would.
    pub fn seal_grant(&self, grant: &Grant) -> String {
        envelope::seal_json(&self.state.secret, grant).expect("Failed to seal grant")
    }

    /// Open an envelope produced by the server (e.g. a returned key).
    pub fn open(&self, sealed: &str) -> Vec<u8> {
        envelope::open(&self.state.secret, sealed).expect("Failed to open envelope")
    }

    /// Verify config pointing at a verifier that cannot be reached,
    /// for exercising the transport failure path offline.
    pub fn unreachable_verify_config() -> VerifyConfig {
        VerifyConfig {
            secret: SecretConfig::Value {
                secret: "verifier-secret".to_string(),
            },
            siteverify_url: "http://127.0.0.1:1/siteverify".to_string(),
        }
    }
}
