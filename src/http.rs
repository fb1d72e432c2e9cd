use crate::config::GatewayConfig;
use crate::domain::{AccountApi, AuditApi, PaymentApi};
use crate::pagination::PageLinkBuilder;
use crate::plugins::{
    dispatch_plugin, list_plugins, register_plugin, unregister_plugin, PluginBridge,
    PluginRegistrationStore, PluginRegistry,
};
use crate::resources::{
    get_payment_methods, get_refunds, search_payment_methods, search_refunds,
};
use anyhow::Result;
use axum::{
    routing::{any, delete, get},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;

pub const PAYMENT_METHODS_PATH: &str = "/1.0/kb/paymentMethods";
pub const REFUNDS_PATH: &str = "/1.0/kb/refunds";
pub const PLUGIN_REGISTRY_PATH: &str = "/1.0/kb/pluginRegistry";
pub const PAGINATION: &str = "pagination";
pub const SEARCH: &str = "search";

/// Domain capabilities the resource handlers call into.
#[derive(Clone)]
pub struct DomainApis {
    pub payments: Arc<dyn PaymentApi>,
    pub accounts: Arc<dyn AccountApi>,
    pub audit: Arc<dyn AuditApi>,
}

#[derive(Clone)]
pub struct AppState {
    config: Arc<GatewayConfig>,
    apis: DomainApis,
    links: PageLinkBuilder,
    plugin_registry: Arc<PluginRegistry>,
    plugin_bridge: Arc<PluginBridge>,
    registration_store: Option<Arc<PluginRegistrationStore>>,
}

impl AppState {
    /// Wires the bridge to `plugin_registry` under the configured mount prefix.
    pub fn new(
        config: GatewayConfig,
        apis: DomainApis,
        plugin_registry: Arc<PluginRegistry>,
        registration_store: Option<Arc<PluginRegistrationStore>>,
    ) -> Self {
        let links = PageLinkBuilder::new(config.server.base_uri.clone());
        let plugin_bridge = Arc::new(PluginBridge::new(
            config.plugins.mount_prefix.clone(),
            plugin_registry.clone(),
        ));
        Self {
            config: Arc::new(config),
            apis,
            links,
            plugin_registry,
            plugin_bridge,
            registration_store,
        }
    }

    /// Replaces the bridge, e.g. to route every plugin path to a single handler.
    pub fn with_plugin_bridge(mut self, bridge: PluginBridge) -> Self {
        self.plugin_bridge = Arc::new(bridge);
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn apis(&self) -> &DomainApis {
        &self.apis
    }

    pub fn links(&self) -> &PageLinkBuilder {
        &self.links
    }

    pub fn plugin_registry(&self) -> &PluginRegistry {
        &self.plugin_registry
    }

    pub fn plugin_bridge(&self) -> &PluginBridge {
        &self.plugin_bridge
    }

    pub fn registration_store(&self) -> Option<&PluginRegistrationStore> {
        self.registration_store.as_deref()
    }
}

pub fn build_router(state: AppState) -> Router {
    let mount = state.plugin_bridge().mount_prefix().to_string();

    Router::new()
        .route(
            &format!("{}/{}", PAYMENT_METHODS_PATH, PAGINATION),
            get(get_payment_methods),
        )
        .route(
            &format!("{}/{}/:search_key", PAYMENT_METHODS_PATH, SEARCH),
            get(search_payment_methods),
        )
        .route(&format!("{}/{}", REFUNDS_PATH, PAGINATION), get(get_refunds))
        .route(
            &format!("{}/{}/:search_key", REFUNDS_PATH, SEARCH),
            get(search_refunds),
        )
        .route(
            PLUGIN_REGISTRY_PATH,
            get(list_plugins).post(register_plugin),
        )
        .route(
            &format!("{}/:name", PLUGIN_REGISTRY_PATH),
            delete(unregister_plugin),
        )
        .route(&mount, any(dispatch_plugin))
        .route(&format!("{}/*subresources", mount), any(dispatch_plugin))
        .with_state(state)
}

pub async fn run_http_server(state: AppState) -> Result<()> {
    let port = state.config().server.port;
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting billing resources server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
