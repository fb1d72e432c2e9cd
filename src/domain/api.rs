use async_trait::async_trait;
use uuid::Uuid;

use crate::context::TenantContext;
use crate::error::Result;
use crate::pagination::PagedResult;

use super::dto::{Account, AccountAuditLogs, AuditLevel, PaymentMethod, PluginProperty, Refund};

#[async_trait]
pub trait PaymentApi: Send + Sync {
    async fn get_payment_methods(
        &self,
        offset: u64,
        limit: u64,
        plugin_name: Option<&str>,
        context: &TenantContext,
    ) -> Result<PagedResult<PaymentMethod>>;

    async fn search_payment_methods(
        &self,
        search_key: &str,
        offset: u64,
        limit: u64,
        plugin_name: Option<&str>,
        context: &TenantContext,
    ) -> Result<PagedResult<PaymentMethod>>;

    async fn get_refunds(
        &self,
        offset: u64,
        limit: u64,
        plugin_name: Option<&str>,
        properties: &[PluginProperty],
        context: &TenantContext,
    ) -> Result<PagedResult<Refund>>;

    async fn search_refunds(
        &self,
        search_key: &str,
        offset: u64,
        limit: u64,
        plugin_name: Option<&str>,
        properties: &[PluginProperty],
        context: &TenantContext,
    ) -> Result<PagedResult<Refund>>;
}

#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn get_account_by_id(&self, account_id: Uuid, context: &TenantContext)
        -> Result<Account>;
}

#[async_trait]
pub trait AuditApi: Send + Sync {
    async fn get_account_audit_logs(
        &self,
        account_id: Uuid,
        level: AuditLevel,
        context: &TenantContext,
    ) -> Result<AccountAuditLogs>;
}
