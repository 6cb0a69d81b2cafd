use serde::Serialize;
use utoipa::ToSchema;

/// Largest offset the database drivers bind (they take a signed 64-bit value).
const MAX_OFFSET: u64 = i64::MAX as u64;

/// Row window for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl PageWindow {
    /// True when the requested page starts after the last matching row.
    #[must_use]
    pub const fn is_past_end(&self, page: u64) -> bool {
        page > self.total_pages
    }
}

/// Compute the window for `page` of size `limit` over `total` rows.
///
/// Callers pass page and limit already defaulted to at least 1; an empty
/// result set has zero pages.
#[must_use]
pub fn paginate(total: u64, page: u64, limit: u64) -> PageWindow {
    let total_pages = if total == 0 || limit == 0 {
        0
    } else {
        total.div_ceil(limit)
    };

    PageWindow {
        offset: page.saturating_sub(1).saturating_mul(limit).min(MAX_OFFSET),
        limit,
        total_pages,
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationLinks {
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

impl PaginationLinks {
    /// `prev` exists past the first page and `next` before the last one.
    #[must_use]
    pub fn build(path: &str, page: u64, limit: u64, total_pages: u64) -> Self {
        let link = |target: u64| format!("{path}?page={target}&limit={limit}");
        Self {
            first: link(1),
            last: link(total_pages.max(1)),
            prev: (page > 1).then(|| link(page - 1)),
            next: (page < total_pages).then(|| link(page + 1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationResponse {
    pub current_page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub links: PaginationLinks,
}

impl PaginationResponse {
    #[must_use]
    pub fn new(path: &str, page: u64, total_items: u64, window: PageWindow) -> Self {
        Self {
            current_page: page,
            per_page: window.limit,
            total_items,
            total_pages: window.total_pages,
            links: PaginationLinks::build(path, page, window.limit, window.total_pages),
        }
    }
}
