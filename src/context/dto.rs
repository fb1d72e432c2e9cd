use serde::{Deserialize, Serialize};

/// Per-request context handed to every domain call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TenantContext {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}
