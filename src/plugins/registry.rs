use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{BillingError, Result};

use super::request::PluginRequest;
use super::response::PluginResponse;

/// An HTTP handler mounted under the plugin prefix.
#[async_trait]
pub trait PluginHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn service(&self, request: &mut PluginRequest, response: &mut PluginResponse)
        -> Result<()>;
}

/// Finds the handler responsible for a (prefix-stripped) plugin path.
pub trait PluginResolver: Send + Sync {
    fn resolve(&self, path_info: &str) -> Result<Arc<dyn PluginHandler>>;
}

/// Handlers keyed by the first segment of the plugin path.
#[derive(Default)]
pub struct PluginRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn PluginHandler>>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handler: Arc<dyn PluginHandler>) -> Result<()> {
        let name = handler.name().to_string();
        validate_plugin_name(&name)?;

        let mut guard = self
            .handlers
            .write()
            .map_err(|_| BillingError::internal("Plugin registry lock poisoned"))?;
        if guard.insert(name.clone(), handler).is_some() {
            tracing::info!("Replaced plugin handler {}", name);
        } else {
            tracing::info!("Registered plugin handler {}", name);
        }
        Ok(())
    }

    pub fn unregister(&self, name: &str) -> Result<()> {
        let mut guard = self
            .handlers
            .write()
            .map_err(|_| BillingError::internal("Plugin registry lock poisoned"))?;
        match guard.remove(name) {
            Some(_) => {
                tracing::info!("Unregistered plugin handler {}", name);
                Ok(())
            }
            None => Err(BillingError::plugin_not_found(name)),
        }
    }

    pub fn names(&self) -> Result<Vec<String>> {
        let guard = self
            .handlers
            .read()
            .map_err(|_| BillingError::internal("Plugin registry lock poisoned"))?;
        let mut names: Vec<String> = guard.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn PluginHandler>> {
        let guard = self
            .handlers
            .read()
            .map_err(|_| BillingError::internal("Plugin registry lock poisoned"))?;
        guard
            .get(name)
            .cloned()
            .ok_or_else(|| BillingError::plugin_not_found(name))
    }
}

impl PluginResolver for PluginRegistry {
    fn resolve(&self, path_info: &str) -> Result<Arc<dyn PluginHandler>> {
        let name = path_info
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default();
        if name.is_empty() {
            return Err(BillingError::plugin_not_found(path_info));
        }
        self.get(name)
    }
}

/// Sends every plugin path to the same handler.
pub struct SingletonResolver {
    handler: Arc<dyn PluginHandler>,
}

impl SingletonResolver {
    pub fn new(handler: Arc<dyn PluginHandler>) -> Self {
        Self { handler }
    }
}

impl PluginResolver for SingletonResolver {
    fn resolve(&self, _path_info: &str) -> Result<Arc<dyn PluginHandler>> {
        Ok(Arc::clone(&self.handler))
    }
}

pub fn validate_plugin_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(BillingError::validation_error("Plugin name cannot be empty"));
    }
    if name.contains('/') || name.chars().any(char::is_whitespace) {
        return Err(BillingError::validation_error(
            "Plugin name cannot contain '/' or whitespace",
        ));
    }
    Ok(())
}
