use crate::error::{BillingError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub pagination: PaginationConfig,
    pub plugins: PluginConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub log_level: String,
    // Absolute base used when rendering next-page links
    pub base_uri: String,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: u64,
    pub max_limit: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    pub mount_prefix: String,
    pub registry_path: String,
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 8080,
                log_level: "info".to_string(),
                base_uri: "http://127.0.0.1:8080".to_string(),
                max_body_bytes: 2 * 1024 * 1024,
            },
            pagination: PaginationConfig {
                default_limit: 100,
                max_limit: 1000,
            },
            plugins: PluginConfig {
                mount_prefix: "/plugins".to_string(),
                registry_path: "billing_plugin_db".to_string(),
                request_timeout_secs: 30,
            },
        }
    }
}

impl PaginationConfig {
    /// Resolves the requested page size against the configured bounds.
    pub fn resolve_limit(&self, requested: Option<u64>) -> Result<u64> {
        match requested {
            None => Ok(self.default_limit),
            Some(0) => Err(BillingError::validation_error("limit must be positive")),
            Some(limit) => Ok(limit.min(self.max_limit)),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(port) = std::env::var("BILLING_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| BillingError::config_error("Invalid BILLING_PORT"))?;
        }

        if let Ok(log_level) = std::env::var("BILLING_LOG_LEVEL") {
            config.server.log_level = log_level;
        }

        if let Ok(base_uri) = std::env::var("BILLING_BASE_URI") {
            if !base_uri.trim().is_empty() {
                config.server.base_uri = base_uri.trim_end_matches('/').to_string();
            }
        }

        if let Ok(max_body) = std::env::var("BILLING_MAX_BODY_BYTES") {
            config.server.max_body_bytes = max_body
                .parse()
                .map_err(|_| BillingError::config_error("Invalid BILLING_MAX_BODY_BYTES"))?;
        }

        if let Ok(limit) = std::env::var("BILLING_DEFAULT_LIMIT") {
            config.pagination.default_limit = limit
                .parse()
                .map_err(|_| BillingError::config_error("Invalid BILLING_DEFAULT_LIMIT"))?;
        }

        if let Ok(limit) = std::env::var("BILLING_MAX_LIMIT") {
            config.pagination.max_limit = limit
                .parse()
                .map_err(|_| BillingError::config_error("Invalid BILLING_MAX_LIMIT"))?;
        }

        if let Ok(prefix) = std::env::var("BILLING_PLUGIN_PREFIX") {
            config.plugins.mount_prefix = normalize_prefix(&prefix)?;
        }

        if let Ok(path) = std::env::var("BILLING_PLUGIN_DB") {
            if !path.trim().is_empty() {
                config.plugins.registry_path = path;
            }
        }

        if let Ok(timeout) = std::env::var("BILLING_PLUGIN_TIMEOUT_SECS") {
            config.plugins.request_timeout_secs = timeout
                .parse()
                .map_err(|_| BillingError::config_error("Invalid BILLING_PLUGIN_TIMEOUT_SECS"))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BillingError::config_error(format!("Failed to read config file: {}", e))
        })?;

        let mut config: GatewayConfig = toml::from_str(&content).map_err(|e| {
            BillingError::config_error(format!("Failed to parse config file: {}", e))
        })?;
        config.plugins.mount_prefix = normalize_prefix(&config.plugins.mount_prefix)?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.pagination.default_limit == 0 || self.pagination.max_limit == 0 {
            return Err(BillingError::config_error(
                "Pagination limits must be positive",
            ));
        }
        if self.pagination.default_limit > self.pagination.max_limit {
            return Err(BillingError::config_error(
                "default_limit cannot exceed max_limit",
            ));
        }
        Ok(())
    }
}

/// Plugin prefixes are stored as `/name` with no trailing slash.
pub fn normalize_prefix(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(BillingError::config_error(
            "Plugin mount prefix cannot be empty or the root path",
        ));
    }
    if trimmed.starts_with('/') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("/{}", trimmed))
    }
}
