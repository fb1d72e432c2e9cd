use super::dto::{FilterCriteria, QUERY_SEARCH_LIMIT, QUERY_SEARCH_OFFSET};

/// Renders next-page links against the public base URI of the service.
#[derive(Debug, Clone)]
pub struct PageLinkBuilder {
    base_uri: String,
}

impl PageLinkBuilder {
    pub fn new(base_uri: impl Into<String>) -> Self {
        let base_uri = base_uri.into();
        Self {
            base_uri: base_uri.trim_end_matches('/').to_string(),
        }
    }

    /// Builds `{base}{path}?offset=..&limit=..&k=v...`.
    ///
    /// Filters with an empty value did not narrow the result set and are left out.
    pub fn next_page(
        &self,
        path: &str,
        next_offset: u64,
        limit: u64,
        criteria: &FilterCriteria,
    ) -> String {
        let mut query = format!(
            "{}={}&{}={}",
            QUERY_SEARCH_OFFSET, next_offset, QUERY_SEARCH_LIMIT, limit
        );
        for (key, value) in criteria.entries() {
            if value.is_empty() {
                continue;
            }
            query.push('&');
            query.push_str(&urlencoding::encode(key));
            query.push('=');
            query.push_str(&urlencoding::encode(value));
        }

        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        format!("{}{}?{}", self.base_uri, path, query)
    }

    /// Same as [`next_page`](Self::next_page) with `search_key` appended as the last path segment.
    pub fn next_search_page(
        &self,
        path: &str,
        search_key: &str,
        next_offset: u64,
        limit: u64,
        criteria: &FilterCriteria,
    ) -> String {
        let path = format!(
            "{}/{}",
            path.trim_end_matches('/'),
            urlencoding::encode(search_key)
        );
        self.next_page(&path, next_offset, limit, criteria)
    }
}
