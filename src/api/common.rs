//! Common API utilities and shared types
//!
//! Page-window arithmetic and cursor-link building for the search endpoint.

use urlencoding::encode;

/// Default page number (1-indexed)
pub fn default_page() -> usize {
    1
}

/// A page window over a full result set.
#[derive(Debug, PartialEq)]
pub struct PageWindow {
    /// Total number of results
    pub count: usize,
    /// Index of the first item on this page
    pub start: usize,
    /// Index one past the last item on this page
    pub end: usize,
    /// Page number of the next page, if any
    pub next: Option<usize>,
    /// Page number of the previous page, if any
    pub previous: Option<usize>,
}

/// Compute the window for a 1-indexed page over `count` items.
pub fn paginate(count: usize, page: usize, page_size: usize) -> PageWindow {
    let page = page.max(1);
    let start = (page - 1).saturating_mul(page_size).min(count);
    let end = (start + page_size).min(count);
    let next = if end < count { Some(page + 1) } else { None };
    let previous = if page > 1 && start < count {
        Some(page - 1)
    } else {
        None
    };
    PageWindow {
        count,
        start,
        end,
        next,
        previous,
    }
}

/// Build an absolute-path link to `page`, preserving every other query
/// parameter in its original order.
pub fn page_link(path: &str, params: &[(String, String)], page: usize) -> String {
    let mut query = String::new();
    for (key, value) in params.iter().filter(|(key, _)| key != "page") {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(&encode(key));
        query.push('=');
        query.push_str(&encode(value));
    }
    if !query.is_empty() {
        query.push('&');
    }
    query.push_str(&format!("page={}", page));
    format!("{}?{}", path, query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_paginate_first_of_many() {
        let window = paginate(25, 1, 10);
        assert_eq!(window.start, 0);
        assert_eq!(window.end, 10);
        assert_eq!(window.next, Some(2));
        assert_eq!(window.previous, None);
    }

    #[test]
    fn test_paginate_middle_page() {
        let window = paginate(25, 2, 10);
        assert_eq!(window.start, 10);
        assert_eq!(window.end, 20);
        assert_eq!(window.next, Some(3));
        assert_eq!(window.previous, Some(1));
    }

    #[test]
    fn test_paginate_last_partial_page() {
        let window = paginate(25, 3, 10);
        assert_eq!(window.start, 20);
        assert_eq!(window.end, 25);
        assert_eq!(window.next, None);
        assert_eq!(window.previous, Some(2));
    }

    #[test]
    fn test_paginate_page_past_the_end() {
        let window = paginate(5, 4, 10);
        assert_eq!(window.start, 5);
        assert_eq!(window.end, 5);
        assert_eq!(window.next, None);
        assert_eq!(window.previous, None);
    }

    #[test]
    fn test_page_link_replaces_page_param() {
        let params = params(&[("type_property", "Casa"), ("page", "1"), ("rooms", "3")]);
        let link = page_link("/property/search/", &params, 2);
        assert_eq!(link, "/property/search/?type_property=Casa&rooms=3&page=2");
    }

    #[test]
    fn test_page_link_encodes_values() {
        let params = params(&[("availability_type", "Alquiler temporal")]);
        let link = page_link("/property/search/", &params, 1);
        assert_eq!(
            link,
            "/property/search/?availability_type=Alquiler%20temporal&page=1"
        );
    }
}
