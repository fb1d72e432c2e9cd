use super::dto::TenantContext;

pub trait TenantContextExt {
    fn label(&self) -> String;
}

impl TenantContextExt for TenantContext {
    fn label(&self) -> String {
        match (&self.api_key, &self.request_id) {
            (Some(key), Some(id)) => format!("tenant {} (request {})", key, id),
            (Some(key), None) => format!("tenant {}", key),
            (None, Some(id)) => format!("default tenant (request {})", id),
            (None, None) => "default tenant".to_string(),
        }
    }
}
