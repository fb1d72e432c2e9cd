mod cache;
pub mod dto;
mod link;
mod responder;

pub use cache::PageScopedCache;
pub use dto::{
    FilterCriteria, PageEnvelope, PagedResult, HDR_PAGINATION_CURRENT_OFFSET,
    HDR_PAGINATION_MAX_NB_RECORDS, HDR_PAGINATION_NEXT_OFFSET, HDR_PAGINATION_NEXT_PAGE_URI,
    HDR_PAGINATION_TOTAL_NB_RECORDS, QUERY_SEARCH_LIMIT, QUERY_SEARCH_OFFSET,
};
pub use link::PageLinkBuilder;
pub use responder::{
    build_filtered_page, build_page, build_search_page, FnTransform, PageResponse,
    RecordTransform,
};
