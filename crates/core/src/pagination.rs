//! Page-window clamping for list endpoints.

/// Page size used when the requested limit is missing or out of range.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Clamp a user-provided limit into `(0, MAX_PAGE_LIMIT]`.
///
/// Out-of-range values fall back to [`DEFAULT_PAGE_LIMIT`] rather than being
/// pinned to the nearest bound.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(l) if l > 0 && l <= MAX_PAGE_LIMIT => l,
        _ => DEFAULT_PAGE_LIMIT,
    }
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
