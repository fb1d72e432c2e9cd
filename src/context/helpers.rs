use axum::http::HeaderMap;

use crate::error::BillingError;

use super::dto::TenantContext;

pub const HEADER_API_KEY: &str = "x-billing-apikey";
pub const HEADER_REQUEST_ID: &str = "x-request-id";

pub fn extract_tenant_context(headers: &HeaderMap) -> Result<TenantContext, BillingError> {
    let api_key = header_value(headers, HEADER_API_KEY)?;
    let request_id = header_value(headers, HEADER_REQUEST_ID)?;

    if let Some(key) = api_key.as_deref() {
        validate_api_key(key)?;
    }

    Ok(TenantContext {
        api_key,
        request_id,
    })
}

pub fn validate_api_key(api_key: &str) -> Result<(), BillingError> {
    if api_key.chars().any(char::is_whitespace) {
        return Err(BillingError::validation_error(
            "Tenant api key cannot contain whitespace",
        ));
    }
    Ok(())
}

fn header_value(headers: &HeaderMap, name: &str) -> Result<Option<String>, BillingError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => {
            let value = value.to_str().map_err(|_| {
                BillingError::validation_error(format!("Invalid UTF-8 in {} header", name))
            })?;
            let value = value.trim();
            if value.is_empty() {
                Ok(None)
            } else {
                Ok(Some(value.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_tenant_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_API_KEY, HeaderValue::from_static(" acme "));
        headers.insert(HEADER_REQUEST_ID, HeaderValue::from_static(""));

        let context = extract_tenant_context(&headers).unwrap();
        assert_eq!(context.api_key.as_deref(), Some("acme"));
        assert_eq!(context.request_id, None);
    }

    #[test]
    fn rejects_api_key_with_inner_whitespace() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_API_KEY, HeaderValue::from_static("ac me"));
        assert!(extract_tenant_context(&headers).is_err());
    }
}
