// models/src/pagination.rs
use serde::{Deserialize, Serialize};

/// Paginated envelope for list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
}

/// A list response in either of its two wire shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Paginated(Page<T>),
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    pub fn into_results(self) -> Vec<T> {
        match self {
            Listing::Bare(items) => items,
            Listing::Paginated(page) => page.results,
        }
    }
}

/// Largest page a client may request; bigger `page_size` values are clamped.
pub const MAX_PAGE_SIZE: usize = 500;

/// Slices `items` into the requested 1-based page. Out-of-range pages yield
/// an empty `results` with the total `count` intact.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize, base_path: &str) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let count = items.len();
    let last_page = count.div_ceil(page_size);
    let start = (page - 1).saturating_mul(page_size);
    let results: Vec<T> = items.into_iter().skip(start).take(page_size).collect();

    let link = |p: usize| {
        let sep = if base_path.contains('?') { '&' } else { '?' };
        format!("{}{}page={}&page_size={}", base_path, sep, p, page_size)
    };
    let next = if page < last_page { Some(link(page + 1)) } else { None };
    let previous = if page > 1 && count > 0 { Some(link((page - 1).min(last_page))) } else { None };

    Page { results, count, next, previous }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_link_neighbouring_pages() {
        let page = paginate((1..=5).collect::<Vec<_>>(), 2, 2, "/api/wards");
        assert_eq!(page.results, vec![3, 4]);
        assert_eq!(page.count, 5);
        assert_eq!(page.next.as_deref(), Some("/api/wards?page=3&page_size=2"));
        assert_eq!(page.previous.as_deref(), Some("/api/wards?page=1&page_size=2"));
    }

    #[test]
    fn should_return_empty_results_past_the_end() {
        let page = paginate(vec![1, 2], 4, 10, "/api/beds?status=AVAILABLE");
        assert!(page.results.is_empty());
        assert_eq!(page.count, 2);
        assert!(page.next.is_none());
        assert_eq!(page.previous.as_deref(), Some("/api/beds?status=AVAILABLE&page=1&page_size=10"));
    }

    #[test]
    fn should_survive_extreme_page_parameters() {
        let far = paginate(vec![1, 2, 3], usize::MAX, 2, "/api/wards");
        assert!(far.results.is_empty());
        assert!(far.next.is_none());
        assert_eq!(far.previous.as_deref(), Some("/api/wards?page=2&page_size=2"));

        let huge = paginate(vec![1, 2, 3], 2, usize::MAX, "/api/wards");
        assert!(huge.results.is_empty());
        assert!(huge.next.is_none());
        assert_eq!(huge.previous.as_deref(), Some(format!("/api/wards?page=1&page_size={}", MAX_PAGE_SIZE).as_str()));

        let first = paginate(vec![1, 2, 3], 1, usize::MAX, "/api/wards");
        assert_eq!(first.results, vec![1, 2, 3]);
        assert!(first.next.is_none());
    }

    #[test]
    fn should_accept_both_listing_shapes() {
        let bare: Listing<u32> = serde_json::from_str("[1,2]").unwrap();
        assert_eq!(bare.into_results(), vec![1, 2]);

        let paged: Listing<u32> =
            serde_json::from_str(r#"{"results":[7],"count":1,"next":null,"previous":null}"#).unwrap();
        assert_eq!(paged.into_results(), vec![7]);
    }
}
