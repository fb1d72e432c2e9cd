use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, StatusCode};
use reqwest::Client;

use crate::error::{BillingError, Result};

use super::dto::PluginRegistration;
use super::registry::PluginHandler;
use super::request::PluginRequest;
use super::response::PluginResponse;

// Connection-scoped headers are re-derived by the outbound client.
const SKIPPED_HEADERS: &[&str] = &[
    "host",
    "content-length",
    "connection",
    "transfer-encoding",
    "keep-alive",
    "upgrade",
];

/// Plugin that lives behind an HTTP endpoint outside this process.
pub struct RemotePluginHandler {
    name: String,
    endpoint_url: String,
    http_client: Client,
}

impl RemotePluginHandler {
    pub fn new(registration: &PluginRegistration, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent("billing-resources/0.1.0")
            .build()?;
        Ok(Self {
            name: registration.name.clone(),
            endpoint_url: registration.endpoint_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Target URL: the endpoint plus whatever follows `/{name}` in the plugin path.
    pub fn target_url(&self, request: &PluginRequest) -> String {
        let own_root = format!("/{}", self.name);
        let rest = request
            .path_info()
            .strip_prefix(&own_root)
            .unwrap_or(request.path_info());
        let mut url = format!("{}{}", self.endpoint_url, rest);
        if let Some(query) = request.query_string() {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

#[async_trait]
impl PluginHandler for RemotePluginHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn service(
        &self,
        request: &mut PluginRequest,
        response: &mut PluginResponse,
    ) -> Result<()> {
        let url = self.target_url(request);
        let method = reqwest::Method::from_bytes(request.method().as_str().as_bytes())
            .map_err(|e| BillingError::internal(format!("Unsupported method: {}", e)))?;
        tracing::debug!("Forwarding {} {} to plugin {}", method, url, self.name);

        let mut outbound = self.http_client.request(method, &url);
        for (name, value) in request.headers() {
            if SKIPPED_HEADERS.contains(&name.as_str()) {
                continue;
            }
            outbound = outbound.header(name.as_str(), value.as_bytes());
        }
        let body = request.take_body();
        if !body.is_empty() {
            outbound = outbound.body(body);
        }

        let upstream = outbound.send().await?;
        let status = StatusCode::from_u16(upstream.status().as_u16()).map_err(|e| {
            BillingError::api_error(format!("Plugin {} returned invalid status: {}", self.name, e))
        })?;
        response.set_status(status);

        if let Some(content_type) = upstream
            .headers()
            .get(header::CONTENT_TYPE.as_str())
            .and_then(|value| value.to_str().ok())
        {
            response.set_content_type(content_type)?;
        }

        let bytes = upstream.bytes().await?;
        response.write_bytes(&bytes);
        Ok(())
    }
}
