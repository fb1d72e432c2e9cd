use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BillingError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub account_id: Uuid,
    pub external_key: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentMethod {
    pub payment_method_id: Uuid,
    pub account_id: Uuid,
    pub external_key: String,
    pub plugin_name: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Refund {
    pub refund_id: Uuid,
    pub payment_id: Uuid,
    pub account_id: Uuid,
    pub plugin_name: String,
    pub amount: String,
    pub currency: String,
    pub effective_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditLevel {
    #[default]
    None,
    Minimal,
    Full,
}

impl AuditLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditLevel::None => "NONE",
            AuditLevel::Minimal => "MINIMAL",
            AuditLevel::Full => "FULL",
        }
    }
}

impl fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditLevel {
    type Err = BillingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "NONE" => Ok(AuditLevel::None),
            "MINIMAL" => Ok(AuditLevel::Minimal),
            "FULL" => Ok(AuditLevel::Full),
            other => Err(BillingError::validation_error(format!(
                "Unknown audit level: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditLog {
    pub object_id: Uuid,
    pub change_type: String,
    pub changed_by: String,
    pub change_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AccountAuditLogs {
    pub entries: Vec<AuditLog>,
}

impl AccountAuditLogs {
    /// Audit entries attached to one object of the account.
    pub fn for_object(&self, object_id: Uuid) -> Vec<AuditLog> {
        self.entries
            .iter()
            .filter(|entry| entry.object_id == object_id)
            .cloned()
            .collect()
    }
}

/// Free-form key/value handed through to payment plugins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginProperty {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
    pub is_updatable: bool,
}

impl PluginProperty {
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            key: key.into(),
            value,
            is_updatable: false,
        }
    }
}
