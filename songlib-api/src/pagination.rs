//! Pagination for the song list
//!
//! Paging is opt-in: the list endpoint returns everything unless the client
//! sends `page` or `limit`.

use songlib_common::PageWindow;

/// Page size used when only `page` is given
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest accepted page size
pub const MAX_PAGE_SIZE: i64 = 100;

/// Turn requested page/limit into a LIMIT/OFFSET window
///
/// Page is clamped to >= 1 and limit to [1, MAX_PAGE_SIZE]. Returns `None`
/// when neither was requested.
///
/// # Examples
/// ```
/// use songlib_api::pagination::calculate_window;
///
/// let w = calculate_window(Some(3), Some(10)).unwrap();
/// assert_eq!(w.limit, 10);
/// assert_eq!(w.offset, 20);
///
/// assert!(calculate_window(None, None).is_none());
/// ```
pub fn calculate_window(requested_page: Option<i64>, requested_limit: Option<i64>) -> Option<PageWindow> {
    if requested_page.is_none() && requested_limit.is_none() {
        return None;
    }

    let page = requested_page.unwrap_or(1).max(1);
    let limit = requested_limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1).saturating_mul(limit);

    Some(PageWindow { limit, offset })
}
