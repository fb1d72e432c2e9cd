use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PaginationConfig;
use crate::domain::{AuditLevel, AuditLog};
use crate::error::{BillingError, Result};
use crate::pagination::{QUERY_SEARCH_LIMIT, QUERY_SEARCH_OFFSET};
use crate::plugins::parse_urlencoded;

pub const QUERY_PLUGIN_NAME: &str = "pluginName";
pub const QUERY_PLUGIN_PROPERTY: &str = "pluginProperty";
pub const QUERY_AUDIT: &str = "audit";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodJson {
    pub payment_method_id: Uuid,
    pub external_key: String,
    pub account_id: Uuid,
    pub account_external_key: String,
    pub is_default: bool,
    pub plugin_name: String,
    #[serde(default)]
    pub audit_logs: Vec<AuditLog>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RefundJson {
    pub refund_id: Uuid,
    pub payment_id: Uuid,
    pub account_id: Uuid,
    pub amount: String,
    pub currency: String,
    pub effective_date: DateTime<Utc>,
    pub plugin_name: String,
    #[serde(default)]
    pub audit_logs: Vec<AuditLog>,
}

/// Query parameters shared by the listing and search endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub offset: u64,
    pub limit: u64,
    pub plugin_name: Option<String>,
    pub plugin_properties: Vec<String>,
    pub audit: AuditLevel,
}

impl ListingQuery {
    pub fn parse(raw: Option<&str>, pagination: &PaginationConfig) -> Result<Self> {
        let params = parse_urlencoded(raw.unwrap_or(""))?;

        let offset = match params.first(QUERY_SEARCH_OFFSET) {
            Some(value) => parse_number(QUERY_SEARCH_OFFSET, value)?,
            None => 0,
        };
        let limit = params
            .first(QUERY_SEARCH_LIMIT)
            .map(|value| parse_number(QUERY_SEARCH_LIMIT, value))
            .transpose()?;
        let limit = pagination.resolve_limit(limit)?;

        let plugin_name = params
            .first(QUERY_PLUGIN_NAME)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let audit = match params.first(QUERY_AUDIT) {
            Some(value) => value.parse()?,
            None => AuditLevel::None,
        };

        Ok(Self {
            offset,
            limit,
            plugin_name,
            plugin_properties: params.values(QUERY_PLUGIN_PROPERTY).to_vec(),
            audit,
        })
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| {
        BillingError::validation_error(format!("{} must be a non-negative integer", name))
    })
}
