use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::context::TenantContext;
use crate::error::{BillingError, Result};
use crate::pagination::PagedResult;

use super::api::{AccountApi, AuditApi, PaymentApi};
use super::dto::{
    Account, AccountAuditLogs, AuditLevel, AuditLog, PaymentMethod, PluginProperty, Refund,
};

/// Process-local billing data, used by the development server and the tests.
#[derive(Default)]
pub struct InMemoryBilling {
    accounts: RwLock<HashMap<Uuid, Account>>,
    payment_methods: RwLock<Vec<PaymentMethod>>,
    refunds: RwLock<Vec<Refund>>,
    audit_logs: RwLock<HashMap<Uuid, Vec<AuditLog>>>,
    account_lookups: AtomicUsize,
    audit_lookups: AtomicUsize,
}

impl InMemoryBilling {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_account(&self, account: Account) -> Result<()> {
        let mut guard = self
            .accounts
            .write()
            .map_err(|_| BillingError::internal("Account store lock poisoned"))?;
        guard.insert(account.account_id, account);
        Ok(())
    }

    pub fn insert_payment_method(&self, payment_method: PaymentMethod) -> Result<()> {
        let mut guard = self
            .payment_methods
            .write()
            .map_err(|_| BillingError::internal("Payment method store lock poisoned"))?;
        guard.push(payment_method);
        Ok(())
    }

    pub fn insert_refund(&self, refund: Refund) -> Result<()> {
        let mut guard = self
            .refunds
            .write()
            .map_err(|_| BillingError::internal("Refund store lock poisoned"))?;
        guard.push(refund);
        Ok(())
    }

    pub fn insert_audit_log(&self, account_id: Uuid, entry: AuditLog) -> Result<()> {
        let mut guard = self
            .audit_logs
            .write()
            .map_err(|_| BillingError::internal("Audit store lock poisoned"))?;
        guard.entry(account_id).or_default().push(entry);
        Ok(())
    }

    pub fn account_lookups(&self) -> usize {
        self.account_lookups.load(Ordering::SeqCst)
    }

    pub fn audit_lookups(&self) -> usize {
        self.audit_lookups.load(Ordering::SeqCst)
    }

    fn payment_methods_matching<P>(&self, predicate: P) -> Result<Vec<PaymentMethod>>
    where
        P: Fn(&PaymentMethod) -> bool,
    {
        let guard = self
            .payment_methods
            .read()
            .map_err(|_| BillingError::internal("Payment method store lock poisoned"))?;
        Ok(guard.iter().filter(|pm| predicate(pm)).cloned().collect())
    }

    fn refunds_matching<P>(&self, predicate: P) -> Result<Vec<Refund>>
    where
        P: Fn(&Refund) -> bool,
    {
        let guard = self
            .refunds
            .read()
            .map_err(|_| BillingError::internal("Refund store lock poisoned"))?;
        Ok(guard.iter().filter(|refund| predicate(refund)).cloned().collect())
    }
}

fn plugin_matches(candidate: &str, plugin_name: Option<&str>) -> bool {
    plugin_name.map_or(true, |name| candidate == name)
}

fn key_matches(haystack: &[String], search_key: &str) -> bool {
    let needle = search_key.to_lowercase();
    haystack
        .iter()
        .any(|value| value.to_lowercase().contains(&needle))
}

#[async_trait]
impl PaymentApi for InMemoryBilling {
    async fn get_payment_methods(
        &self,
        offset: u64,
        limit: u64,
        plugin_name: Option<&str>,
        _context: &TenantContext,
    ) -> Result<PagedResult<PaymentMethod>> {
        let rows = self.payment_methods_matching(|pm| plugin_matches(&pm.plugin_name, plugin_name))?;
        PagedResult::from_window(&rows, offset, limit)
    }

    async fn search_payment_methods(
        &self,
        search_key: &str,
        offset: u64,
        limit: u64,
        plugin_name: Option<&str>,
        _context: &TenantContext,
    ) -> Result<PagedResult<PaymentMethod>> {
        let rows = self.payment_methods_matching(|pm| {
            plugin_matches(&pm.plugin_name, plugin_name)
                && key_matches(
                    &[
                        pm.payment_method_id.to_string(),
                        pm.external_key.clone(),
                        pm.plugin_name.clone(),
                    ],
                    search_key,
                )
        })?;
        PagedResult::from_window(&rows, offset, limit)
    }

    async fn get_refunds(
        &self,
        offset: u64,
        limit: u64,
        plugin_name: Option<&str>,
        _properties: &[PluginProperty],
        _context: &TenantContext,
    ) -> Result<PagedResult<Refund>> {
        let rows = self.refunds_matching(|refund| plugin_matches(&refund.plugin_name, plugin_name))?;
        PagedResult::from_window(&rows, offset, limit)
    }

    async fn search_refunds(
        &self,
        search_key: &str,
        offset: u64,
        limit: u64,
        plugin_name: Option<&str>,
        _properties: &[PluginProperty],
        _context: &TenantContext,
    ) -> Result<PagedResult<Refund>> {
        let rows = self.refunds_matching(|refund| {
            plugin_matches(&refund.plugin_name, plugin_name)
                && key_matches(
                    &[
                        refund.refund_id.to_string(),
                        refund.payment_id.to_string(),
                        refund.plugin_name.clone(),
                    ],
                    search_key,
                )
        })?;
        PagedResult::from_window(&rows, offset, limit)
    }
}

#[async_trait]
impl AccountApi for InMemoryBilling {
    async fn get_account_by_id(
        &self,
        account_id: Uuid,
        _context: &TenantContext,
    ) -> Result<Account> {
        self.account_lookups.fetch_add(1, Ordering::SeqCst);
        let guard = self
            .accounts
            .read()
            .map_err(|_| BillingError::internal("Account store lock poisoned"))?;
        guard
            .get(&account_id)
            .cloned()
            .ok_or(BillingError::AccountNotFound { account_id })
    }
}

#[async_trait]
impl AuditApi for InMemoryBilling {
    async fn get_account_audit_logs(
        &self,
        account_id: Uuid,
        level: AuditLevel,
        _context: &TenantContext,
    ) -> Result<AccountAuditLogs> {
        self.audit_lookups.fetch_add(1, Ordering::SeqCst);
        let guard = self
            .audit_logs
            .read()
            .map_err(|_| BillingError::internal("Audit store lock poisoned"))?;
        let entries = guard.get(&account_id).cloned().unwrap_or_default();

        let entries = match level {
            AuditLevel::None => Vec::new(),
            AuditLevel::Minimal => entries
                .into_iter()
                .filter(|entry| entry.change_type == "INSERT")
                .collect(),
            AuditLevel::Full => entries,
        };
        Ok(AccountAuditLogs { entries })
    }
}
