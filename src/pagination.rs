use serde::Serialize;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct PageParams {
    pub page: usize,
    pub limit: usize,
}

impl PageParams {
    /// Lenient parse: non-numeric, missing or zero values fall back to
    /// page=1, limit=10.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<usize>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .and_then(|l| l.trim().parse::<usize>().ok())
            .filter(|l| *l >= 1)
            .unwrap_or(DEFAULT_LIMIT);
        PageParams { page, limit }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

/// Window an already-assembled, ordered result set. Applied after view
/// assembly so computed counts always reflect the full joined data.
pub fn paginate<T>(items: Vec<T>, params: PageParams) -> Page<T> {
    let total_items = items.len();
    let total_pages = (total_items + params.limit - 1) / params.limit;
    let start = (params.page - 1).saturating_mul(params.limit);
    let items: Vec<T> = items.into_iter().skip(start).take(params.limit).collect();
    Page {
        items,
        total_items,
        page: params.page,
        limit: params.limit,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_default_when_missing_or_invalid() {
        let p = PageParams::from_raw(None, None);
        assert_eq!((p.page, p.limit), (1, 10));

        let p = PageParams::from_raw(Some("abc"), Some("-3"));
        assert_eq!((p.page, p.limit), (1, 10));

        let p = PageParams::from_raw(Some("0"), Some("0"));
        assert_eq!((p.page, p.limit), (1, 10));

        let p = PageParams::from_raw(Some("3"), Some("25"));
        assert_eq!((p.page, p.limit), (3, 25));
    }

    #[test]
    fn pages_cover_the_whole_set_without_overlap() {
        let data: Vec<i32> = (0..23).collect();
        let limit = 5;
        let mut seen = Vec::new();
        for page in 1..=5 {
            let p = paginate(data.clone(), PageParams { page, limit });
            assert_eq!(p.total_items, 23);
            assert_eq!(p.total_pages, 5);
            for item in &p.items {
                assert!(!seen.contains(item), "item {} appeared on two pages", item);
            }
            seen.extend(p.items);
        }
        assert_eq!(seen, data);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let p = paginate(vec![1, 2, 3], PageParams { page: 9, limit: 10 });
        assert!(p.items.is_empty());
        assert_eq!(p.total_items, 3);
        assert_eq!(p.total_pages, 1);
    }

    #[test]
    fn empty_set_has_zero_pages() {
        let p = paginate(Vec::<i32>::new(), PageParams { page: 1, limit: 10 });
        assert!(p.items.is_empty());
        assert_eq!(p.total_pages, 0);
    }
}
