use std::sync::Arc;

use axum::{
    body::Body,
    http::{request::Parts, Method, StatusCode},
    response::Response,
};
use bytes::Bytes;

use crate::error::{BillingError, Result};

use super::dto::ConsumedParameters;
use super::params::ParameterMap;
use super::registry::PluginResolver;
use super::request::{PluginRequest, PluginRequestBuilder};
use super::response::PluginResponse;

/// Relays requests under the mount prefix to plugin handlers.
///
/// The plugin only ever writes into a [`PluginResponse`]; its status, headers and
/// body are copied to the real response once the handler has returned.
pub struct PluginBridge {
    mount_prefix: String,
    resolver: Arc<dyn PluginResolver>,
}

impl PluginBridge {
    pub fn new(mount_prefix: impl Into<String>, resolver: Arc<dyn PluginResolver>) -> Self {
        Self {
            mount_prefix: mount_prefix.into(),
            resolver,
        }
    }

    pub fn mount_prefix(&self) -> &str {
        &self.mount_prefix
    }

    pub async fn dispatch(&self, parts: Parts, body: Bytes) -> Result<Response> {
        let method = parts.method.clone();
        let request = self.builder(parts).body(body).build()?;
        self.service(method, request).await
    }

    /// Form-encoded POST: `form` holds the fields already parsed off the body and
    /// `remaining` whatever bytes were left unread.
    pub async fn dispatch_form(
        &self,
        parts: Parts,
        form: ParameterMap,
        remaining: Bytes,
    ) -> Result<Response> {
        let method = parts.method.clone();
        let request = self.builder(parts).form(form).body(remaining).build()?;
        self.service(method, request).await
    }

    fn builder(&self, parts: Parts) -> PluginRequestBuilder {
        let consumed = parts
            .extensions
            .get::<ConsumedParameters>()
            .map(|consumed| consumed.0.clone())
            .unwrap_or_default();
        PluginRequestBuilder::new(self.mount_prefix.clone(), parts.method, parts.uri)
            .headers(parts.headers)
            .consumed_parameters(consumed)
    }

    async fn service(&self, method: Method, mut request: PluginRequest) -> Result<Response> {
        let handler = self.resolver.resolve(request.path_info())?;
        let mut captured = PluginResponse::new();

        tracing::debug!(
            "Dispatching {} {} to plugin {}",
            method,
            request.path_info(),
            handler.name()
        );
        if let Err(err) = handler.service(&mut request, &mut captured).await {
            tracing::error!(
                "Plugin {} failed on {} {}: {}",
                handler.name(),
                method,
                request.path_info(),
                err
            );
            return Err(BillingError::plugin_dispatch(
                handler.name(),
                "request could not be completed",
            ));
        }

        if captured.status().as_u16() >= 400 {
            tracing::warn!("{} responded {}", request.path_info(), captured.status());
        }

        if method == Method::HEAD {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::NO_CONTENT;
            return Ok(response);
        }

        Ok(captured.into_http_response())
    }
}
