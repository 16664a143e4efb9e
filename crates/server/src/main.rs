//! Locker server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use locker_core::GatewaySecret;
use locker_core::config::AppConfig;
use locker_server::{AppState, create_router};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Locker - capability-token gateway for a binary object store
#[derive(Parser, Debug)]
#[command(name = "lockerd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "LOCKER_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Locker v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override everything)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    let has_config_file = config_path.exists();

    if has_config_file {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    // LOCKER_CONFIG only points at the file, it is not configuration itself
    let has_env_config =
        std::env::vars().any(|(key, _)| key.starts_with("LOCKER_") && key != "LOCKER_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: lockerd --config /path/to/config.toml\n  \
             2. Environment variables: LOCKER_SERVER__BIND=0.0.0.0:8080 \
             LOCKER_SECRET__TYPE=env LOCKER_SECRET__VAR=LOCKER_GATEWAY_SECRET lockerd\n\n\
             Set LOCKER_CONFIG env var to specify a default config file path."
        );
    }

    if !has_config_file {
        tracing::info!("Using environment variables for configuration");
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("LOCKER_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    config.validate().context("invalid configuration")?;

    // Resolve the envelope secret before touching the network
    let material = config
        .secret
        .load()
        .context("failed to load gateway secret")?;
    let secret = GatewaySecret::from_material(&material).context("invalid gateway secret")?;
    tracing::info!("Gateway secret loaded");

    // Resolve the verifier secret, if the proxy is configured
    let verify_secret = match &config.verify {
        Some(verify) => {
            let secret = verify
                .secret
                .load()
                .context("failed to load verifier secret")?;
            tracing::info!(siteverify_url = %verify.siteverify_url, "Verification proxy enabled");
            Some(secret)
        }
        None => {
            tracing::warn!("No verifier secret configured, /v1/verify is disabled");
            None
        }
    };

    // Initialize storage backend
    let storage = locker_storage::from_config(&config.storage)
        .await
        .context("failed to initialize storage")?;
    tracing::info!(backend = storage.backend_name(), "Storage backend initialized");

    // Verify storage connectivity before accepting requests
    storage
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!("Storage backend connectivity verified");

    let bind = config.server.bind.clone();
    let state = AppState::new(config, storage, secret, verify_secret);
    let app = create_router(state);

    let addr: SocketAddr = bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
