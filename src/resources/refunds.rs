use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Path, RawQuery, State},
    http::HeaderMap,
};
use uuid::Uuid;

use crate::context::{extract_tenant_context, TenantContext};
use crate::domain::{AccountAuditLogs, AuditApi, AuditLevel, Refund};
use crate::error::Result;
use crate::http::{AppState, PAGINATION, REFUNDS_PATH, SEARCH};
use crate::pagination::{
    build_filtered_page, build_search_page, FilterCriteria, PageResponse, PageScopedCache,
    RecordTransform,
};

use super::dto::{ListingQuery, RefundJson, QUERY_AUDIT, QUERY_PLUGIN_NAME, QUERY_PLUGIN_PROPERTY};
use super::properties::extract_plugin_properties;

pub struct RefundTransform {
    audit_api: Arc<dyn AuditApi>,
    audit_level: AuditLevel,
    context: TenantContext,
    audit_logs: PageScopedCache<Uuid, AccountAuditLogs>,
}

impl RefundTransform {
    pub fn new(audit_api: Arc<dyn AuditApi>, audit_level: AuditLevel, context: TenantContext) -> Self {
        Self {
            audit_api,
            audit_level,
            context,
            audit_logs: PageScopedCache::new(),
        }
    }
}

#[async_trait]
impl RecordTransform<Refund> for RefundTransform {
    type View = RefundJson;

    async fn apply(&mut self, refund: Refund) -> Result<Option<RefundJson>> {
        let account_id = refund.account_id;
        let audit_logs = if self.audit_level == AuditLevel::None {
            Vec::new()
        } else {
            self.audit_logs
                .get_or_try_insert_with(&account_id, || {
                    self.audit_api
                        .get_account_audit_logs(account_id, self.audit_level, &self.context)
                })
                .await?
                .for_object(refund.refund_id)
        };

        Ok(Some(RefundJson {
            refund_id: refund.refund_id,
            payment_id: refund.payment_id,
            account_id,
            amount: refund.amount,
            currency: refund.currency,
            effective_date: refund.effective_date,
            plugin_name: refund.plugin_name,
            audit_logs,
        }))
    }
}

pub(crate) async fn get_refunds(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<PageResponse<RefundJson>> {
    let context = extract_tenant_context(&headers)?;
    let query = ListingQuery::parse(query.as_deref(), &state.config().pagination)?;
    let properties = extract_plugin_properties(&query.plugin_properties, []);

    let paged = state
        .apis()
        .payments
        .get_refunds(
            query.offset,
            query.limit,
            query.plugin_name.as_deref(),
            &properties,
            &context,
        )
        .await?;

    let criteria = refund_criteria(&query);
    let mut transform =
        RefundTransform::new(Arc::clone(&state.apis().audit), query.audit, context);
    let path = format!("{}/{}", REFUNDS_PATH, PAGINATION);
    build_filtered_page(paged, &mut transform, state.links(), &path, &criteria).await
}

pub(crate) async fn search_refunds(
    State(state): State<AppState>,
    Path(search_key): Path<String>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<PageResponse<RefundJson>> {
    let context = extract_tenant_context(&headers)?;
    let query = ListingQuery::parse(query.as_deref(), &state.config().pagination)?;
    let properties = extract_plugin_properties(&query.plugin_properties, []);

    let paged = state
        .apis()
        .payments
        .search_refunds(
            &search_key,
            query.offset,
            query.limit,
            query.plugin_name.as_deref(),
            &properties,
            &context,
        )
        .await?;

    let criteria = refund_criteria(&query);
    let mut transform =
        RefundTransform::new(Arc::clone(&state.apis().audit), query.audit, context);
    let path = format!("{}/{}", REFUNDS_PATH, SEARCH);
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

// Plugin properties reach the payment plugins and can change the result set,
// so they are echoed as well.
fn refund_criteria(query: &ListingQuery) -> FilterCriteria {
    let mut criteria = FilterCriteria::new().with_opt(QUERY_PLUGIN_NAME, query.plugin_name.clone());
    for property in &query.plugin_properties {
        criteria.push(QUERY_PLUGIN_PROPERTY, property.clone());
    }
    criteria.with(QUERY_AUDIT, query.audit.as_str())
}
