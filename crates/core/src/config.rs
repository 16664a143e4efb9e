//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Enable request tracing.
    #[serde(default)]
    pub enable_tracing: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_body_bytes() -> usize {
    32 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            enable_tracing: false,
        }
    }
}

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Root directory for storage.
        path: PathBuf,
    },
    /// S3-compatible storage (AWS, R2, MinIO).
    S3 {
        /// Bucket name.
        bucket: String,
        /// Optional endpoint URL (for R2, MinIO, etc.).
        endpoint: Option<String>,
        /// Region.
        region: Option<String>,
        /// Optional key prefix.
        prefix: Option<String>,
        /// Access key ID. Falls back to the ambient credential chain if not set.
        /// WARNING: Prefer env vars or IAM roles over storing secrets in config files.
        access_key_id: Option<String>,
        /// Secret access key. Falls back to the ambient credential chain if not set.
        /// WARNING: Prefer env vars or IAM roles over storing secrets in config files.
        secret_access_key: Option<String>,
        /// Force path-style URLs (e.g., `endpoint/bucket/key`).
        /// Required for MinIO and some S3-compatible services.
        #[serde(default)]
        force_path_style: bool,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/storage"),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration invariants.
    pub fn validate(&self) -> Result<()> {
        match self {
            StorageConfig::S3 {
                access_key_id,
                secret_access_key,
                ..
            } => match (access_key_id.as_ref(), secret_access_key.as_ref()) {
                (Some(_), Some(_)) | (None, None) => Ok(()),
                _ => Err(Error::Config(
                    "s3 config requires both access_key_id and secret_access_key when either is set"
                        .to_string(),
                )),
            },
            _ => Ok(()),
        }
    }
}

/// Secret source configuration.
///
/// Used for the gateway envelope secret and for the verifier secret;
/// the material is resolved once at startup and never re-read.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SecretConfig {
    /// Secret stored in a file.
    File {
        /// Path to the secret file. Trailing newline is stripped.
        path: PathBuf,
    },
    /// Secret stored in an environment variable.
    Env {
        /// Environment variable name.
        var: String,
    },
    /// Secret provided directly as a value (NOT recommended for production).
    Value {
        /// The secret material.
        secret: String,
    },
}

impl SecretConfig {
    /// Resolve the secret material from its configured source.
    pub fn load(&self) -> Result<String> {
        match self {
            SecretConfig::File { path } => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("failed to read secret file {}: {e}", path.display()))
                })?;
                Ok(raw.trim_end_matches(['\n', '\r']).to_string())
            }
            SecretConfig::Env { var } => std::env::var(var)
                .map_err(|_| Error::Config(format!("secret env var {var} is not set"))),
            SecretConfig::Value { secret } => Ok(secret.clone()),
        }
    }
}

/// Cross-origin policy.
///
/// An `Origin` header is echoed back when it matches an entry in
/// `allowed_origins` exactly, or ends with one of `allowed_suffixes`.
/// Everything else gets the wildcard.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Exact origins, scheme included (e.g., "https://app.example.com").
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Trusted domain suffixes (e.g., ".example.com").
    #[serde(default)]
    pub allowed_suffixes: Vec<String>,
}

/// CAPTCHA verification proxy configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Shared secret for the verification service.
    pub secret: SecretConfig,
    /// Verification endpoint URL.
    #[serde(default = "default_siteverify_url")]
    pub siteverify_url: String,
}

fn default_siteverify_url() -> String {
    "https://challenges.cloudflare.com/turnstile/v0/siteverify".to_string()
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Gateway envelope secret (required, must resolve to 32 bytes).
    pub secret: SecretConfig,
    /// Cross-origin policy.
    #[serde(default)]
    pub cors: CorsConfig,
    /// CAPTCHA verification proxy (optional; /v1/verify refuses requests
    /// when unset).
    pub verify: Option<VerifyConfig>,
}

impl AppConfig {
    /// Validate configuration invariants. Fail-fast at startup.
    pub fn validate(&self) -> Result<()> {
        self.storage.validate()
    }

    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Filesystem storage and an inline secret.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            secret: SecretConfig::Value {
                secret: "0123456789abcdef0123456789abcdef".to_string(),
            },
            cors: CorsConfig::default(),
            verify: None,
        }
    }
}
