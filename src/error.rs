use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, BillingError>;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] sled::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("Account not found: {account_id}")]
    AccountNotFound { account_id: Uuid },

    #[error("Plugin not found: {name}")]
    PluginNotFound { name: String },

    #[error("Plugin {plugin} failed: {message}")]
    PluginDispatch { plugin: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BillingError {
    pub fn api_error(msg: impl Into<String>) -> Self {
        BillingError::ApiError(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        BillingError::ConfigError(msg.into())
    }

    pub fn validation_error(msg: impl Into<String>) -> Self {
        BillingError::ValidationError {
            message: msg.into(),
        }
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        BillingError::Encoding(msg.into())
    }

    pub fn invalid_page(msg: impl Into<String>) -> Self {
        BillingError::InvalidPage(msg.into())
    }

    pub fn plugin_not_found(name: impl Into<String>) -> Self {
        BillingError::PluginNotFound { name: name.into() }
    }

    pub fn plugin_dispatch(plugin: impl Into<String>, msg: impl Into<String>) -> Self {
        BillingError::PluginDispatch {
            plugin: plugin.into(),
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        BillingError::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BillingError::ValidationError { .. }
            | BillingError::Encoding(_)
            | BillingError::InvalidPage(_)
            | BillingError::ConfigError(_) => StatusCode::BAD_REQUEST,
            BillingError::AccountNotFound { .. }
            | BillingError::PluginNotFound { .. } => StatusCode::NOT_FOUND,
            BillingError::ApiError(_) | BillingError::NetworkError(_) => StatusCode::BAD_GATEWAY,
            BillingError::StorageError(_) => StatusCode::SERVICE_UNAVAILABLE,
            BillingError::PluginDispatch { .. }
            | BillingError::SerializationError(_)
            | BillingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = ErrorResponse {
            error: self.to_string(),
            details: None,
        };
        (status, Json(body)).into_response()
    }
}
