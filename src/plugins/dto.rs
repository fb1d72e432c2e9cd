use serde::{Deserialize, Serialize};

use super::params::ParameterMap;

/// Parameters an upstream layer already read off the request before the bridge ran.
///
/// Middleware that consumes the body or query inserts this as a request extension.
#[derive(Debug, Clone, Default)]
pub struct ConsumedParameters(pub ParameterMap);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginRegistrationRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub endpoint_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginRegistration {
    pub name: String,
    pub description: String,
    pub endpoint_url: String,
    pub created_at: i64,
    pub updated_at: i64,
}
