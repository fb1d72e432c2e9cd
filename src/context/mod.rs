pub mod dto;
mod helpers;
mod request_context;

pub use dto::TenantContext;
pub use helpers::{extract_tenant_context, validate_api_key, HEADER_API_KEY, HEADER_REQUEST_ID};
pub use request_context::TenantContextExt;
