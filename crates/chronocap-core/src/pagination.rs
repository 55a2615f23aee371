//! Page metadata for list responses.

use serde::{Deserialize, Serialize};

/// Pagination fields merged into list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// Derive page metadata from the total match count and the requested window.
///
/// `page` is not clamped. `has_next_page` is `page < total_pages`, so a page
/// past the end reports no next page.
pub fn calculate_pagination_data(total_items: i64, page: i64, per_page: i64) -> PaginationMeta {
    let total_pages = if per_page > 0 && total_items > 0 {
        // Quotient plus remainder; `total + per_page - 1` overflows for huge pages.
        total_items / per_page + i64::from(total_items % per_page != 0)
    } else {
        0
    };

    PaginationMeta {
        page,
        per_page,
        total_pages,
        total_items,
        has_next_page: page < total_pages,
        has_previous_page: page != 1,
    }
}
