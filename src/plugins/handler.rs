use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::Response,
    Json,
};
use bytes::Bytes;

use crate::error::{BillingError, Result};
use crate::http::AppState;

use super::dto::{PluginRegistration, PluginRegistrationRequest};
use super::params::parse_urlencoded;
use super::remote::RemotePluginHandler;
use super::store::PluginRegistrationStore;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Every verb under the mount prefix lands here.
pub(crate) async fn dispatch_plugin(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, state.config().server.max_body_bytes)
        .await
        .map_err(|e| BillingError::validation_error(format!("Failed to read request body: {}", e)))?;

    let bridge = state.plugin_bridge();
    if parts.method == Method::POST && is_form_encoded(&parts.headers) {
        let text = std::str::from_utf8(&body)
            .map_err(|e| BillingError::encoding(format!("Form body is not UTF-8: {}", e)))?;
        let form = parse_urlencoded(text)?;
        bridge.dispatch_form(parts, form, Bytes::new()).await
    } else {
        bridge.dispatch(parts, body).await
    }
}

pub(crate) async fn register_plugin(
    State(state): State<AppState>,
    Json(request): Json<PluginRegistrationRequest>,
) -> Result<(StatusCode, Json<PluginRegistration>)> {
    let store = require_store(&state)?;
    let registration = store.save(request)?;
    let handler = remote_handler(&state, &registration)?;
    state.plugin_registry().register(handler)?;
    Ok((StatusCode::CREATED, Json(registration)))
}

pub(crate) async fn list_plugins(
    State(state): State<AppState>,
) -> Result<Json<Vec<PluginRegistration>>> {
    let store = require_store(&state)?;
    Ok(Json(store.list()?))
}

pub(crate) async fn unregister_plugin(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode> {
    let store = require_store(&state)?;
    store.remove(&name)?;
    if let Err(err) = state.plugin_registry().unregister(&name) {
        tracing::warn!("Plugin {} was stored but not registered: {}", name, err);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Registers a remote handler for every persisted registration and returns how many succeeded.
///
/// A registration that cannot be turned into a handler is logged and skipped.
pub fn restore_remote_plugins(state: &AppState) -> Result<usize> {
    let Some(store) = state.registration_store() else {
        return Ok(0);
    };
    let mut restored = 0;
    for registration in store.list()? {
        let outcome = remote_handler(state, &registration)
            .and_then(|handler| state.plugin_registry().register(handler));
        match outcome {
            Ok(()) => restored += 1,
            Err(err) => tracing::warn!(
                "Skipping stored plugin {}: {}",
                registration.name,
                err
            ),
        }
    }
    Ok(restored)
}

fn remote_handler(
    state: &AppState,
    registration: &PluginRegistration,
) -> Result<Arc<RemotePluginHandler>> {
    let timeout = Duration::from_secs(state.config().plugins.request_timeout_secs);
    Ok(Arc::new(RemotePluginHandler::new(registration, timeout)?))
}

fn require_store(state: &AppState) -> Result<&PluginRegistrationStore> {
    state
        .registration_store()
        .ok_or_else(|| BillingError::config_error("Plugin registration store is not configured"))
}

fn is_form_encoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_lowercase().starts_with(FORM_CONTENT_TYPE))
        .unwrap_or(false)
}
