use serde::{Deserialize, Serialize};

use crate::error::{BillingError, Result};

pub const HDR_PAGINATION_CURRENT_OFFSET: &str = "x-billing-pagination-currentoffset";
pub const HDR_PAGINATION_NEXT_OFFSET: &str = "x-billing-pagination-nextoffset";
pub const HDR_PAGINATION_TOTAL_NB_RECORDS: &str = "x-billing-pagination-totalnbrecords";
pub const HDR_PAGINATION_MAX_NB_RECORDS: &str = "x-billing-pagination-maxnbrecords";
pub const HDR_PAGINATION_NEXT_PAGE_URI: &str = "x-billing-pagination-nextpageuri";

pub const QUERY_SEARCH_OFFSET: &str = "offset";
pub const QUERY_SEARCH_LIMIT: &str = "limit";

/// One page of a larger, offset-addressable domain collection.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult<T> {
    items: Vec<T>,
    offset: u64,
    limit: u64,
    next_offset: Option<u64>,
    total_count: Option<u64>,
}

impl<T> PagedResult<T> {
    pub fn new(
        items: Vec<T>,
        offset: u64,
        limit: u64,
        next_offset: Option<u64>,
        total_count: Option<u64>,
    ) -> Result<Self> {
        if items.len() as u64 > limit {
            return Err(BillingError::invalid_page(format!(
                "page holds {} items but limit is {}",
                items.len(),
                limit
            )));
        }
        if let Some(next) = next_offset {
            if next <= offset {
                return Err(BillingError::invalid_page(format!(
                    "next offset {} must be greater than offset {}",
                    next, offset
                )));
            }
        }
        Ok(Self {
            items,
            offset,
            limit,
            next_offset,
            total_count,
        })
    }

    /// Cuts the `[offset, offset + limit)` window out of a fully known collection.
    pub fn from_window(all: &[T], offset: u64, limit: u64) -> Result<Self>
    where
        T: Clone,
    {
        let total = all.len() as u64;
        let start = offset.min(total) as usize;
        let end = offset.saturating_add(limit).min(total) as usize;
        let items = all[start..end].to_vec();
        let next_offset = if (end as u64) < total && end > start {
            Some(end as u64)
        } else {
            None
        };
        Self::new(items, offset, limit, next_offset, Some(total))
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn next_offset(&self) -> Option<u64> {
        self.next_offset
    }

    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// Wire-level page built from a [`PagedResult`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageEnvelope<V> {
    pub records: Vec<V>,
    #[serde(default)]
    pub next_page_link: Option<String>,
    pub current_offset: u64,
    #[serde(default)]
    pub next_offset: Option<u64>,
    #[serde(default)]
    pub total_count: Option<u64>,
    pub max_records_per_page: u64,
}

/// Query parameters echoed into next-page links, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    entries: Vec<(String, String)>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn with_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
