use anyhow::{Context, Result};
use billing_resources::domain::InMemoryBilling;
use billing_resources::http::{self, AppState, DomainApis};
use billing_resources::plugins::{restore_remote_plugins, PluginRegistrationStore, PluginRegistry};
use billing_resources::GatewayConfig;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env for local dev (if present)
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    let config = match std::env::var("BILLING_CONFIG_FILE") {
        Ok(path) => GatewayConfig::from_file(&path)
            .with_context(|| format!("failed to load configuration from {}", path))?,
        Err(_) => GatewayConfig::from_env().context("failed to load configuration")?,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("billing_resources={}", config.server.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if dotenv_loaded {
        tracing::info!("Loaded .env");
    }
    tracing::info!("Starting billing resources server");
    tracing::info!(
        "Configuration loaded: port={}, plugin prefix={}, default limit={}",
        config.server.port,
        config.plugins.mount_prefix,
        config.pagination.default_limit
    );

    let sled_db = sled::open(&config.plugins.registry_path)
        .context("failed to open plugin registry database")?;
    let registrations = sled_db
        .open_tree("plugin_registrations")
        .context("failed to open plugin_registrations tree")?;
    let store = Arc::new(PluginRegistrationStore::new(registrations));

    // Domain services are not part of this layer; the in-memory store stands in for them.
    let billing = Arc::new(InMemoryBilling::new());
    let apis = DomainApis {
        payments: billing.clone(),
        accounts: billing.clone(),
        audit: billing,
    };

    let state = AppState::new(config, apis, Arc::new(PluginRegistry::new()), Some(store));
    let restored = restore_remote_plugins(&state).context("failed to restore plugins")?;
    tracing::info!("Restored {} remote plugin registrations", restored);

    http::run_http_server(state).await?;
    tracing::info!("Billing resources server shutting down");
    Ok(())
}
