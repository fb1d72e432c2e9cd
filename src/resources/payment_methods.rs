use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Path, RawQuery, State},
    http::HeaderMap,
};
use uuid::Uuid;

use crate::context::{extract_tenant_context, TenantContext, TenantContextExt};
use crate::domain::{Account, AccountApi, AccountAuditLogs, AuditApi, AuditLevel, PaymentMethod};
use crate::error::{BillingError, Result};
use crate::http::{AppState, PAGINATION, PAYMENT_METHODS_PATH, SEARCH};
use crate::pagination::{
    build_filtered_page, build_search_page, FilterCriteria, PageResponse, PageScopedCache,
    RecordTransform,
};

use super::dto::{ListingQuery, PaymentMethodJson, QUERY_AUDIT, QUERY_PLUGIN_NAME};

/// Joins each payment method with its owning account and that account's audit trail.
pub struct PaymentMethodTransform {
    accounts_api: Arc<dyn AccountApi>,
    audit_api: Arc<dyn AuditApi>,
    audit_level: AuditLevel,
    context: TenantContext,
    accounts: PageScopedCache<Uuid, Account>,
    audit_logs: PageScopedCache<Uuid, AccountAuditLogs>,
}

impl PaymentMethodTransform {
    pub fn new(
        accounts_api: Arc<dyn AccountApi>,
        audit_api: Arc<dyn AuditApi>,
        audit_level: AuditLevel,
        context: TenantContext,
    ) -> Self {
        Self {
            accounts_api,
            audit_api,
            audit_level,
            context,
            accounts: PageScopedCache::new(),
            audit_logs: PageScopedCache::new(),
        }
    }

    pub fn account_fetches(&self) -> usize {
        self.accounts.fetches()
    }

    pub fn audit_fetches(&self) -> usize {
        self.audit_logs.fetches()
    }
}

#[async_trait]
impl RecordTransform<PaymentMethod> for PaymentMethodTransform {
    type View = PaymentMethodJson;

    async fn apply(&mut self, payment_method: PaymentMethod) -> Result<Option<PaymentMethodJson>> {
        let account_id = payment_method.account_id;

        let lookup = self
            .accounts
            .get_or_try_insert_with(&account_id, || {
                self.accounts_api.get_account_by_id(account_id, &self.context)
            })
            .await;
        let account = match lookup {
            Ok(account) => account,
            Err(BillingError::AccountNotFound { .. }) => {
                tracing::debug!(
                    "Payment method {} refers to missing account {}",
                    payment_method.payment_method_id,
                    account_id
                );
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let audit_logs = if self.audit_level == AuditLevel::None {
            Vec::new()
        } else {
            let logs = self
                .audit_logs
                .get_or_try_insert_with(&account_id, || {
                    self.audit_api
                        .get_account_audit_logs(account_id, self.audit_level, &self.context)
                })
                .await?;
            logs.for_object(payment_method.payment_method_id)
        };

        Ok(Some(PaymentMethodJson {
            payment_method_id: payment_method.payment_method_id,
            external_key: payment_method.external_key,
            account_id,
            account_external_key: account.external_key,
            is_default: payment_method.is_default,
            plugin_name: payment_method.plugin_name,
            audit_logs,
        }))
    }
}

pub(crate) async fn get_payment_methods(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<PageResponse<PaymentMethodJson>> {
    let context = extract_tenant_context(&headers)?;
    let query = ListingQuery::parse(query.as_deref(), &state.config().pagination)?;
    tracing::debug!(
        "Listing payment methods for {} at offset {}",
        context.label(),
        query.offset
    );

    let paged = state
        .apis()
        .payments
        .get_payment_methods(
            query.offset,
            query.limit,
            query.plugin_name.as_deref(),
            &context,
        )
        .await?;

    let criteria = listing_criteria(&query);
    let mut transform = transform_for(&state, query.audit, context);
    let path = format!("{}/{}", PAYMENT_METHODS_PATH, PAGINATION);
    build_filtered_page(paged, &mut transform, state.links(), &path, &criteria).await
}

pub(crate) async fn search_payment_methods(
    State(state): State<AppState>,
    Path(search_key): Path<String>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<PageResponse<PaymentMethodJson>> {
    let context = extract_tenant_context(&headers)?;
    let query = ListingQuery::parse(query.as_deref(), &state.config().pagination)?;

    let paged = state
        .apis()
        .payments
        .search_payment_methods(
            &search_key,
            query.offset,
            query.limit,
            query.plugin_name.as_deref(),
            &context,
        )
        .await?;

    let criteria = listing_criteria(&query);
    let mut transform = transform_for(&state, query.audit, context);
    let path = format!("{}/{}", PAYMENT_METHODS_PATH, SEARCH);
    build_search_page(
        paged,
        &mut transform,
        state.links(),
        &path,
        &search_key,
        &criteria,
    )
    .await
}

fn listing_criteria(query: &ListingQuery) -> FilterCriteria {
    FilterCriteria::new()
        .with_opt(QUERY_PLUGIN_NAME, query.plugin_name.clone())
        .with(QUERY_AUDIT, query.audit.as_str())
}

fn transform_for(
    state: &AppState,
    audit_level: AuditLevel,
    context: TenantContext,
) -> PaymentMethodTransform {
    PaymentMethodTransform::new(
        Arc::clone(&state.apis().accounts),
        Arc::clone(&state.apis().audit),
        audit_level,
        context,
    )
}
