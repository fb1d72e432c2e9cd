use billing_resources::config::{normalize_prefix, PaginationConfig};
use billing_resources::{BillingError, GatewayConfig};

#[test]
fn defaults_are_usable() {
    let config = GatewayConfig::default();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.plugins.mount_prefix, "/plugins");
    assert!(config.pagination.default_limit <= config.pagination.max_limit);
}

#[test]
fn limit_resolution() {
    let pagination = PaginationConfig {
        default_limit: 100,
        max_limit: 1000,
    };
    assert_eq!(pagination.resolve_limit(None).unwrap(), 100);
    assert_eq!(pagination.resolve_limit(Some(25)).unwrap(), 25);
    assert_eq!(pagination.resolve_limit(Some(5000)).unwrap(), 1000);
    assert!(matches!(
        pagination.resolve_limit(Some(0)),
        Err(BillingError::ValidationError { .. })
    ));
}

#[test]
fn prefixes_are_normalized() {
    assert_eq!(normalize_prefix("plugins/").unwrap(), "/plugins");
    assert_eq!(normalize_prefix(" /ext/plugins ").unwrap(), "/ext/plugins");
    assert!(normalize_prefix("/").is_err());
    assert!(normalize_prefix("").is_err());
}

#[test]
fn loads_from_toml_file() {
    let path = std::env::temp_dir().join(format!("billing-config-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(
        &path,
        r#"
[server]
port = 9090
log_level = "debug"
base_uri = "https://billing.example.com"
max_body_bytes = 1024

[pagination]
default_limit = 20
max_limit = 200

[plugins]
mount_prefix = "ext/"
registry_path = "/tmp/plugins"
request_timeout_secs = 5
"#,
    )
    .unwrap();

    let config = GatewayConfig::from_file(path.to_str().unwrap()).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.base_uri, "https://billing.example.com");
    assert_eq!(config.pagination.max_limit, 200);
    assert_eq!(config.plugins.mount_prefix, "/ext");
}

#[test]
fn rejects_inconsistent_limits() {
    let path = std::env::temp_dir().join(format!("billing-config-{}.toml", uuid::Uuid::new_v4()));
    let mut config = GatewayConfig::default();
    config.pagination.default_limit = 500;
    config.pagination.max_limit = 50;
    std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

    let err = GatewayConfig::from_file(path.to_str().unwrap()).unwrap_err();
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(err, BillingError::ConfigError(_)));
}

#[test]
fn environment_overrides_defaults() {
    std::env::set_var("BILLING_PORT", "7070");
    std::env::set_var("BILLING_BASE_URI", "https://api.billing.test/");
    std::env::set_var("BILLING_PLUGIN_PREFIX", "ext");
    std::env::set_var("BILLING_MAX_LIMIT", "250");
    let config = tokio_test::assert_ok!(GatewayConfig::from_env());

    std::env::set_var("BILLING_PORT", "not-a-port");
    let err = tokio_test::assert_err!(GatewayConfig::from_env());

    for name in [
        "BILLING_PORT",
        "BILLING_BASE_URI",
        "BILLING_PLUGIN_PREFIX",
        "BILLING_MAX_LIMIT",
    ] {
        std::env::remove_var(name);
    }

    assert_eq!(config.server.port, 7070);
    assert_eq!(config.server.base_uri, "https://api.billing.test");
    assert_eq!(config.plugins.mount_prefix, "/ext");
    assert_eq!(config.pagination.max_limit, 250);
    assert!(matches!(err, BillingError::ConfigError(_)));
}
