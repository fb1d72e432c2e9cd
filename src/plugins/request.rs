use axum::http::{HeaderMap, Method, Uri};
use bytes::Bytes;

use crate::error::{BillingError, Result};

use super::params::{encode_first_values, parse_urlencoded, ParameterMap};

/// Request body that can be read exactly once.
#[derive(Debug, Default)]
pub struct PluginBody {
    bytes: Option<Bytes>,
}

impl PluginBody {
    pub fn new(bytes: Bytes) -> Self {
        Self { bytes: Some(bytes) }
    }

    /// Returns the whole body on first call and an empty buffer afterwards.
    pub fn take(&mut self) -> Bytes {
        self.bytes.take().unwrap_or_default()
    }

    pub fn is_finished(&self) -> bool {
        self.bytes.is_none()
    }
}

/// The request as a plugin sees it: rooted at `/`, with merged parameters and a rebuilt body.
#[derive(Debug)]
pub struct PluginRequest {
    method: Method,
    path_info: String,
    query_string: Option<String>,
    headers: HeaderMap,
    parameters: ParameterMap,
    body: PluginBody,
}

impl PluginRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path_info(&self) -> &str {
        &self.path_info
    }

    /// Plugins are mounted at the root, so there is no context path.
    pub fn context_path(&self) -> &str {
        ""
    }

    pub fn servlet_path(&self) -> &str {
        ""
    }

    /// First path segment, which is the name the plugin is registered under.
    pub fn plugin_name(&self) -> Option<&str> {
        self.path_info
            .trim_start_matches('/')
            .split('/')
            .next()
            .filter(|segment| !segment.is_empty())
    }

    pub fn query_string(&self) -> Option<&str> {
        self.query_string.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.first(name)
    }

    pub fn parameter_values(&self, name: &str) -> &[String] {
        self.parameters.values(name)
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys()
    }

    pub fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    pub fn take_body(&mut self) -> Bytes {
        self.body.take()
    }

    pub fn is_body_finished(&self) -> bool {
        self.body.is_finished()
    }

    /// Consumes the body and parses it as form data.
    pub fn read_form(&mut self) -> Result<ParameterMap> {
        let body = self.take_body();
        let text = std::str::from_utf8(&body)
            .map_err(|e| BillingError::encoding(format!("Form body is not UTF-8: {}", e)))?;
        parse_urlencoded(text)
    }
}

/// Assembles a [`PluginRequest`] from the pieces of an inbound request.
#[derive(Debug)]
pub struct PluginRequestBuilder {
    mount_prefix: String,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    raw_body: Bytes,
    form: Option<ParameterMap>,
    consumed: ParameterMap,
}

impl PluginRequestBuilder {
    pub fn new(mount_prefix: impl Into<String>, method: Method, uri: Uri) -> Self {
        Self {
            mount_prefix: mount_prefix.into(),
            method,
            uri,
            headers: HeaderMap::new(),
            raw_body: Bytes::new(),
            form: None,
            consumed: ParameterMap::new(),
        }
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Body bytes still unread when the request reached the bridge.
    pub fn body(mut self, body: Bytes) -> Self {
        self.raw_body = body;
        self
    }

    /// Form fields already parsed from a form-encoded POST.
    pub fn form(mut self, form: ParameterMap) -> Self {
        self.form = Some(form);
        self
    }

    pub fn consumed_parameters(mut self, consumed: ParameterMap) -> Self {
        self.consumed = consumed;
        self
    }

    pub fn build(self) -> Result<PluginRequest> {
        let path_info = strip_mount_prefix(&self.mount_prefix, self.uri.path())?;
        let query_string = self.uri.query().map(str::to_string);
        let query = parse_urlencoded(query_string.as_deref().unwrap_or(""))?;

        let mut parameters = ParameterMap::new();
        if let Some(form) = &self.form {
            parameters.extend_from(form);
        }
        parameters.extend_from(&query);
        parameters.extend_from(&self.consumed);

        let body = match &self.form {
            Some(form) => rebuild_form_body(&self.consumed, form, self.raw_body),
            None => self.raw_body,
        };

        Ok(PluginRequest {
            method: self.method,
            path_info,
            query_string,
            headers: self.headers,
            parameters,
            body: PluginBody::new(body),
        })
    }
}

/// `/plugins/foo/bar` under `/plugins` becomes `/foo/bar`; the bare prefix becomes `/`.
pub fn strip_mount_prefix(mount_prefix: &str, path: &str) -> Result<String> {
    let prefix = mount_prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some("") => Ok("/".to_string()),
        Some(rest) if rest.starts_with('/') => Ok(rest.to_string()),
        _ => Err(BillingError::validation_error(format!(
            "Path {} is not under plugin mount {}",
            path, prefix
        ))),
    }
}

// Upstream layers may have drained the body while reading parameters, so the
// parameters are serialized back in front of whatever bytes are left.
fn rebuild_form_body(consumed: &ParameterMap, form: &ParameterMap, remaining: Bytes) -> Bytes {
    let prefix = encode_first_values([consumed, form]);
    if remaining.is_empty() {
        return Bytes::from(prefix);
    }
    if prefix.is_empty() {
        return remaining;
    }

    let mut body = Vec::with_capacity(prefix.len() + 1 + remaining.len());
    body.extend_from_slice(prefix.as_bytes());
    body.push(b'&');
    body.extend_from_slice(&remaining);
    Bytes::from(body)
}
