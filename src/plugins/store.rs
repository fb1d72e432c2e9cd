use chrono::Utc;

use crate::error::{BillingError, Result};

use super::dto::{PluginRegistration, PluginRegistrationRequest};
use super::registry::validate_plugin_name;

/// Remote plugin registrations, persisted as JSON records keyed by plugin name.
pub struct PluginRegistrationStore {
    tree: sled::Tree,
}

impl PluginRegistrationStore {
    pub fn new(tree: sled::Tree) -> Self {
        Self { tree }
    }

    pub fn save(&self, request: PluginRegistrationRequest) -> Result<PluginRegistration> {
        validate_plugin_name(&request.name)?;
        if request.endpoint_url.trim().is_empty() {
            return Err(BillingError::validation_error(
                "Plugin endpoint cannot be empty",
            ));
        }
        if !(request.endpoint_url.starts_with("http://")
            || request.endpoint_url.starts_with("https://"))
        {
            return Err(BillingError::validation_error(
                "Plugin endpoint must be an http(s) URL",
            ));
        }

        let now = Utc::now().timestamp();
        let created_at = self
            .get(&request.name)?
            .map(|existing| existing.created_at)
            .unwrap_or(now);

        let registration = PluginRegistration {
            name: request.name,
            description: request.description,
            endpoint_url: request.endpoint_url,
            created_at,
            updated_at: now,
        };

        let encoded = serde_json::to_vec(&registration).map_err(|e| {
            BillingError::internal(format!("Failed to encode plugin registration: {}", e))
        })?;
        self.tree.insert(registration.name.as_bytes(), encoded)?;
        self.tree.flush()?;

        Ok(registration)
    }

    pub fn get(&self, name: &str) -> Result<Option<PluginRegistration>> {
        match self.tree.get(name.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn list(&self) -> Result<Vec<PluginRegistration>> {
        let mut registrations = Vec::new();
        for item in self.tree.iter() {
            let (_key, value) = item?;
            registrations.push(Self::decode(&value)?);
        }
        Ok(registrations)
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let removed = self.tree.remove(name.as_bytes())?;
        if removed.is_none() {
            return Err(BillingError::plugin_not_found(name));
        }
        self.tree.flush()?;
        Ok(())
    }

    fn decode(bytes: &[u8]) -> Result<PluginRegistration> {
        serde_json::from_slice(bytes).map_err(|e| {
            BillingError::internal(format!("Failed to parse plugin registration: {}", e))
        })
    }
}
