use std::collections::HashMap;

pub const QUESTIONS_PER_PAGE: usize = 10;

/// Reads the 1-based `page` query parameter. Absent or non-numeric values fall back to page 1.
pub fn extract_page(params: &HashMap<String, String>) -> i64 {
    params
        .get("page")
        .and_then(|page| page.trim().parse::<i64>().ok())
        .unwrap_or(1)
}

/// Slice of `items` shown on the 1-based `page`. Out of range pages are empty.
pub fn page_slice<T>(items: &[T], page: i64) -> &[T] {
    if page < 1 {
        return &[];
    }
    let start = usize::try_from(page - 1)
        .ok()
        .and_then(|p| p.checked_mul(QUESTIONS_PER_PAGE))
        .unwrap_or(usize::MAX)
        .min(items.len());
    let end = start.saturating_add(QUESTIONS_PER_PAGE).min(items.len());
    &items[start..end]
}
