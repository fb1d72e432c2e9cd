use async_trait::async_trait;
use axum::{
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::{BillingError, Result};

use super::dto::{
    FilterCriteria, PageEnvelope, PagedResult, HDR_PAGINATION_CURRENT_OFFSET,
    HDR_PAGINATION_MAX_NB_RECORDS, HDR_PAGINATION_NEXT_OFFSET, HDR_PAGINATION_NEXT_PAGE_URI,
    HDR_PAGINATION_TOTAL_NB_RECORDS,
};
use super::link::PageLinkBuilder;

/// Maps one domain entity to its client-facing view.
///
/// Implementors hold whatever per-page state they need (typically
/// [`PageScopedCache`](super::PageScopedCache) maps) and are driven sequentially,
/// in item order, by [`build_page`].
///
/// `Ok(None)` drops the item from the page; an `Err` fails the whole page.
#[async_trait]
pub trait RecordTransform<T>: Send
where
    T: Send + 'static,
{
    type View: Send;

    async fn apply(&mut self, item: T) -> Result<Option<Self::View>>;
}

/// Adapts a synchronous closure into a [`RecordTransform`].
pub struct FnTransform<F>(pub F);

#[async_trait]
impl<T, V, F> RecordTransform<T> for FnTransform<F>
where
    T: Send + 'static,
    V: Send + 'static,
    F: FnMut(T) -> Result<Option<V>> + Send + 'static,
{
    type View = V;

    async fn apply(&mut self, item: T) -> Result<Option<V>> {
        (self.0)(item)
    }
}

/// A ready-to-send page: the envelope plus its pagination headers.
#[derive(Debug, Clone)]
pub struct PageResponse<V> {
    envelope: PageEnvelope<V>,
}

impl<V> PageResponse<V> {
    pub fn envelope(&self) -> &PageEnvelope<V> {
        &self.envelope
    }

    pub fn into_envelope(self) -> PageEnvelope<V> {
        self.envelope
    }

    pub fn headers(&self) -> HeaderMap {
        let envelope = &self.envelope;
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(HDR_PAGINATION_CURRENT_OFFSET),
            HeaderValue::from(envelope.current_offset),
        );
        if let Some(next) = envelope.next_offset {
            headers.insert(
                HeaderName::from_static(HDR_PAGINATION_NEXT_OFFSET),
                HeaderValue::from(next),
            );
        }
        if let Some(total) = envelope.total_count {
            headers.insert(
                HeaderName::from_static(HDR_PAGINATION_TOTAL_NB_RECORDS),
                HeaderValue::from(total),
            );
        }
        headers.insert(
            HeaderName::from_static(HDR_PAGINATION_MAX_NB_RECORDS),
            HeaderValue::from(envelope.max_records_per_page),
        );
        if let Some(link) = envelope.next_page_link.as_deref() {
            match HeaderValue::from_str(link) {
                Ok(value) => {
                    headers.insert(HeaderName::from_static(HDR_PAGINATION_NEXT_PAGE_URI), value);
                }
                Err(err) => tracing::warn!("Next page link is not a valid header value: {}", err),
            }
        }
        headers
    }
}

impl<V: Serialize> IntoResponse for PageResponse<V> {
    fn into_response(self) -> Response {
        let headers = self.headers();
        let body = match serde_json::to_vec(&self.envelope.records) {
            Ok(body) => body,
            Err(err) => return BillingError::from(err).into_response(),
        };
        let mut response = (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response();
        response.headers_mut().extend(headers);
        response
    }
}

/// Transforms every item of `paged`, dropping (and logging) the ones the transform skips.
///
/// `next_link` is only consulted when the domain reported a next offset.
pub async fn build_page<T, R, L>(
    paged: PagedResult<T>,
    transform: &mut R,
    next_link: L,
) -> Result<PageResponse<R::View>>
where
    T: Send + 'static,
    R: RecordTransform<T> + ?Sized,
    L: FnOnce(u64, u64) -> String,
{
    let current_offset = paged.offset();
    let limit = paged.limit();
    let next_offset = paged.next_offset();
    let total_count = paged.total_count();
    let next_page_link = next_offset.map(|next| next_link(next, limit));

    let mut records = Vec::with_capacity(paged.len());
    for (index, item) in paged.into_items().into_iter().enumerate() {
        match transform.apply(item).await? {
            Some(view) => records.push(view),
            None => tracing::warn!("Dropping record {} of page at offset {}", index, current_offset),
        }
    }

    Ok(PageResponse {
        envelope: PageEnvelope {
            records,
            next_page_link,
            current_offset,
            next_offset,
            total_count,
            max_records_per_page: limit,
        },
    })
}

/// [`build_page`] whose next link points back at `path` with `criteria` echoed.
pub async fn build_filtered_page<T, R>(
    paged: PagedResult<T>,
    transform: &mut R,
    links: &PageLinkBuilder,
    path: &str,
    criteria: &FilterCriteria,
) -> Result<PageResponse<R::View>>
where
    T: Send + 'static,
    R: RecordTransform<T> + ?Sized,
{
    build_page(paged, transform, |next_offset, limit| {
        links.next_page(path, next_offset, limit, criteria)
    })
    .await
}

/// [`build_filtered_page`] for search endpoints, where the key is the last path segment.
pub async fn build_search_page<T, R>(
    paged: PagedResult<T>,
    transform: &mut R,
    links: &PageLinkBuilder,
    path: &str,
    search_key: &str,
    criteria: &FilterCriteria,
) -> Result<PageResponse<R::View>>
where
    T: Send + 'static,
    R: RecordTransform<T> + ?Sized,
{
    build_page(paged, transform, |next_offset, limit| {
        links.next_search_page(path, search_key, next_offset, limit, criteria)
    })
    .await
}
