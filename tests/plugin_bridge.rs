use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request, StatusCode, Uri};
use billing_resources::plugins::{
    ConsumedParameters, ParameterMap, PluginBridge, PluginHandler, PluginRegistry, PluginRequest,
    PluginRequestBuilder, PluginResolver, PluginResponse, SingletonResolver,
};
use billing_resources::{BillingError, Result};
use bytes::Bytes;
use serde_json::{json, Value};

/// Echoes back what it saw of the request.
struct EchoPlugin {
    calls: AtomicUsize,
}

impl EchoPlugin {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PluginHandler for EchoPlugin {
    fn name(&self) -> &str {
        "echo"
    }

    async fn service(&self, request: &mut PluginRequest, response: &mut PluginResponse) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let x_values = request.parameter_values("x").to_vec();
        let method = request.method().to_string();
        let path_info = request.path_info().to_string();
        let body = String::from_utf8_lossy(&request.take_body()).into_owned();
        let echoed = json!({
            "method": method,
            "pathInfo": path_info,
            "contextPath": request.context_path(),
            "servletPath": request.servlet_path(),
            "x": x_values,
            "body": body,
        });
        response.set_content_type("application/json")?;
        response.write_bytes(echoed.to_string().as_bytes());
        Ok(())
    }
}

/// Writes part of a response, then fails.
struct BrokenPlugin;

#[async_trait]
impl PluginHandler for BrokenPlugin {
    fn name(&self) -> &str {
        "broken"
    }

    async fn service(&self, _request: &mut PluginRequest, response: &mut PluginResponse) -> Result<()> {
        response
            .write_all(b"partial secret output")
            .map_err(|e| BillingError::internal(e.to_string()))?;
        Err(BillingError::internal("plugin crashed"))
    }
}

/// Reports a client error of its own.
struct RejectingPlugin;

#[async_trait]
impl PluginHandler for RejectingPlugin {
    fn name(&self) -> &str {
        "rejecting"
    }

    async fn service(&self, _request: &mut PluginRequest, response: &mut PluginResponse) -> Result<()> {
        response.set_status(StatusCode::UNPROCESSABLE_ENTITY);
        response.insert_header(
            header::HeaderName::from_static("x-plugin-reason"),
            HeaderValue::from_static("bad-input"),
        );
        response.write_bytes(b"nope");
        Ok(())
    }
}

fn parts(method: Method, uri: &str) -> axum::http::request::Parts {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(())
        .unwrap()
        .into_parts()
        .0
}

fn registry_bridge() -> (PluginBridge, Arc<EchoPlugin>) {
    let echo = EchoPlugin::new();
    let registry = Arc::new(PluginRegistry::new());
    registry.register(echo.clone()).unwrap();
    registry.register(Arc::new(BrokenPlugin)).unwrap();
    registry.register(Arc::new(RejectingPlugin)).unwrap();
    (PluginBridge::new("/plugins", registry), echo)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[test]
fn plugin_sees_path_without_mount_prefix() {
    let request = PluginRequestBuilder::new("/plugins", Method::GET, Uri::from_static("/plugins/foo/bar"))
        .build()
        .unwrap();
    assert_eq!(request.path_info(), "/foo/bar");
    assert_eq!(request.context_path(), "");
    assert_eq!(request.servlet_path(), "");
    assert_eq!(request.plugin_name(), Some("foo"));

    let root = PluginRequestBuilder::new("/plugins", Method::GET, Uri::from_static("/plugins"))
        .build()
        .unwrap();
    assert_eq!(root.path_info(), "/");
    assert_eq!(root.plugin_name(), None);
}

#[test]
fn paths_outside_the_mount_are_rejected() {
    let err = PluginRequestBuilder::new("/plugins", Method::GET, Uri::from_static("/pluginsfoo/bar"))
        .build()
        .unwrap_err();
    assert!(matches!(err, BillingError::ValidationError { .. }));
}

#[test]
fn merged_parameters_keep_form_then_query_then_consumed() {
    let request = PluginRequestBuilder::new("/plugins", Method::POST, Uri::from_static("/plugins/echo?x=2&y=q"))
        .form(ParameterMap::from_pairs([("x", "1")]))
        .consumed_parameters(ParameterMap::from_pairs([("x", "3")]))
        .build()
        .unwrap();
    assert_eq!(request.parameter_values("x"), &["1", "2", "3"]);
    assert_eq!(request.parameter("x"), Some("1"));
    assert_eq!(request.parameter("y"), Some("q"));
    assert_eq!(request.parameter_names().collect::<Vec<_>>(), vec!["x", "y"]);
}

#[test]
fn form_body_is_rebuilt_ahead_of_remaining_bytes() {
    let mut request = PluginRequestBuilder::new("/plugins", Method::POST, Uri::from_static("/plugins/echo"))
        .form(ParameterMap::from_pairs([("amount", "10.5"), ("user", "form-user")]))
        .consumed_parameters(ParameterMap::from_pairs([("user", "filter user")]))
        .body(Bytes::from_static(b"extra=1"))
        .build()
        .unwrap();

    assert!(!request.is_body_finished());
    let form = request.read_form().unwrap();
    assert_eq!(form.first("user"), Some("filter user"));
    assert_eq!(form.first("amount"), Some("10.5"));
    assert_eq!(form.first("extra"), Some("1"));
    assert!(request.is_body_finished());
    assert!(request.take_body().is_empty());
}

#[test]
fn non_form_body_is_passed_through_untouched() {
    let mut request = PluginRequestBuilder::new("/plugins", Method::PUT, Uri::from_static("/plugins/echo"))
        .consumed_parameters(ParameterMap::from_pairs([("ignored", "yes")]))
        .body(Bytes::from_static(br#"{"a":1}"#))
        .build()
        .unwrap();
    assert_eq!(request.take_body(), Bytes::from_static(br#"{"a":1}"#));
}

#[test]
fn malformed_query_encoding_fails_the_request() {
    let err = PluginRequestBuilder::new("/plugins", Method::GET, Uri::from_static("/plugins/echo?x=%FF"))
        .build()
        .unwrap_err();
    assert!(matches!(err, BillingError::Encoding(_)));
}

#[tokio::test]
async fn dispatch_relays_plugin_status_and_body() {
    let (bridge, echo) = registry_bridge();
    let response = bridge
        .dispatch(parts(Method::GET, "/plugins/echo/items?x=2"), Bytes::new())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let json = body_json(response).await;
    assert_eq!(json["method"], "GET");
    assert_eq!(json["pathInfo"], "/echo/items");
    assert_eq!(json["x"], json!(["2"]));
    assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dispatch_form_merges_consumed_parameters() {
    let (bridge, _echo) = registry_bridge();
    let mut request_parts = parts(Method::POST, "/plugins/echo?x=2");
    request_parts
        .extensions
        .insert(ConsumedParameters(ParameterMap::from_pairs([("x", "3")])));

    let response = bridge
        .dispatch_form(request_parts, ParameterMap::from_pairs([("x", "1")]), Bytes::new())
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["x"], json!(["1", "2", "3"]));
    assert_eq!(json["body"], "x=3");
}

#[tokio::test]
async fn head_always_yields_no_content() {
    let (bridge, echo) = registry_bridge();
    let response = bridge
        .dispatch(parts(Method::HEAD, "/plugins/echo"), Bytes::new())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.is_empty());
    assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failing_plugin_output_never_reaches_the_client() {
    let (bridge, _echo) = registry_bridge();
    let err = bridge
        .dispatch(parts(Method::POST, "/plugins/broken"), Bytes::new())
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::PluginDispatch { .. }));

    let response = axum::response::IntoResponse::into_response(err);
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(!text.contains("partial secret output"));
    assert!(!text.contains("plugin crashed"));
    assert!(text.contains("broken"));
}

#[tokio::test]
async fn plugin_error_status_is_relayed_as_is() {
    let (bridge, _echo) = registry_bridge();
    let response = bridge
        .dispatch(parts(Method::DELETE, "/plugins/rejecting/thing"), Bytes::new())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.headers()["x-plugin-reason"], "bad-input");
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"nope");
}

#[tokio::test]
async fn unknown_plugin_is_not_found() {
    let (bridge, _echo) = registry_bridge();
    let err = bridge
        .dispatch(parts(Method::OPTIONS, "/plugins/missing"), Bytes::new())
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::PluginNotFound { .. }));
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn singleton_resolver_serves_every_path() {
    let echo = EchoPlugin::new();
    let resolver: Arc<dyn PluginResolver> = Arc::new(SingletonResolver::new(echo.clone()));
    let bridge = PluginBridge::new("/plugins", resolver);

    for uri in ["/plugins", "/plugins/anything/else"] {
        let response = bridge
            .dispatch(parts(Method::GET, uri), Bytes::new())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(echo.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn registry_rejects_and_unregisters() {
    struct Named(&'static str);

    #[async_trait]
    impl PluginHandler for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn service(&self, _: &mut PluginRequest, _: &mut PluginResponse) -> Result<()> {
            Ok(())
        }
    }

    let registry = PluginRegistry::new();
    assert!(registry.register(Arc::new(Named("a/b"))).is_err());
    assert!(registry.register(Arc::new(Named(""))).is_err());

    registry.register(Arc::new(Named("billing"))).unwrap();
    assert_eq!(registry.names().unwrap(), vec!["billing".to_string()]);
    assert!(registry.resolve("/billing/x").is_ok());

    registry.unregister("billing").unwrap();
    assert!(matches!(
        registry.unregister("billing"),
        Err(BillingError::PluginNotFound { .. })
    ));
}

#[tokio::test]
async fn router_dispatches_form_posts_through_the_bridge() {
    use billing_resources::domain::InMemoryBilling;
    use billing_resources::{build_router, AppState, DomainApis, GatewayConfig};
    use tower::ServiceExt;

    let billing = Arc::new(InMemoryBilling::new());
    let apis = DomainApis {
        payments: billing.clone(),
        accounts: billing.clone(),
        audit: billing,
    };
    let registry = Arc::new(PluginRegistry::new());
    registry.register(EchoPlugin::new()).unwrap();
    let app = build_router(AppState::new(GatewayConfig::default(), apis, registry, None));

    let mut request = Request::builder()
        .method("POST")
        .uri("/plugins/echo/submit?x=2")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("x=1&note=hello+world"))
        .unwrap();
    request
        .extensions_mut()
        .insert(ConsumedParameters(ParameterMap::from_pairs([("x", "3")])));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["pathInfo"], "/echo/submit");
    assert_eq!(json["x"], json!(["1", "2", "3"]));
    assert_eq!(json["body"], "x=3&note=hello%20world");
}

#[tokio::test]
async fn router_can_mount_a_single_handler() {
    use billing_resources::domain::InMemoryBilling;
    use billing_resources::{build_router, AppState, DomainApis, GatewayConfig};
    use tower::ServiceExt;

    let billing = Arc::new(InMemoryBilling::new());
    let apis = DomainApis {
        payments: billing.clone(),
        accounts: billing.clone(),
        audit: billing,
    };
    let echo = EchoPlugin::new();
    let bridge = PluginBridge::new("/plugins", Arc::new(SingletonResolver::new(echo.clone())));
    let state = AppState::new(
        GatewayConfig::default(),
        apis,
        Arc::new(PluginRegistry::new()),
        None,
    )
    .with_plugin_bridge(bridge);

    let response = build_router(state)
        .oneshot(
            Request::builder()
                .method("HEAD")
                .uri("/plugins")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
}
