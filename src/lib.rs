pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod http;
pub mod pagination;
pub mod plugins;
pub mod resources;

pub use config::GatewayConfig;
pub use error::{BillingError, ErrorResponse, Result};
pub use http::{build_router, AppState, DomainApis};
