use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

/// One page of results plus the navigation state around it.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_num: Option<i64>,
    pub next_num: Option<i64>,
    /// Page links for navigation; `None` marks an elided run of pages.
    pub page_links: Vec<Option<i64>>,
    pub items: Vec<T>,
}

/// Number of pages for `total` rows. An empty result still has one page.
pub fn page_count(total: i64, per_page: i64) -> i64 {
    if total > 0 && per_page > 0 {
        (total - 1) / per_page + 1
    } else {
        1
    }
}

/// Clamps a requested page into `[1, pages]`.
pub fn clamp_page(requested: Option<i64>, total: i64, per_page: i64) -> i64 {
    requested.unwrap_or(1).clamp(1, page_count(total, per_page))
}

/// Row offset of `page` for the `LIMIT/OFFSET` query.
pub fn page_offset(page: i64, per_page: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(per_page)
}

impl<T> Page<T> {
    pub fn new(page: i64, per_page: i64, total: i64, items: Vec<T>) -> Self {
        let pages = page_count(total, per_page);
        let has_prev = page > 1;
        let has_next = page < pages;

        Self {
            page,
            per_page,
            total,
            pages,
            has_prev,
            has_next,
            prev_num: if has_prev { Some(page - 1) } else { None },
            next_num: if has_next { Some(page + 1) } else { None },
            page_links: iter_pages(page, pages, 2, 2, 3, 2),
            items,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            pages: self.pages,
            has_prev: self.has_prev,
            has_next: self.has_next,
            prev_num: self.prev_num,
            next_num: self.next_num,
            page_links: self.page_links,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

/// Page numbers to show around `page`: the first `left_edge`, the window
/// `(page - left_current - 1, page + right_current)` exclusive, and the last
/// `right_edge`. Gaps between shown pages yield a single `None`.
pub fn iter_pages(
    page: i64,
    pages: i64,
    left_edge: i64,
    left_current: i64,
    right_current: i64,
    right_edge: i64,
) -> Vec<Option<i64>> {
    let mut links = Vec::new();
    let mut last = 0;

    for num in 1..=pages {
        let shown = num <= left_edge
            || (num > page - left_current - 1 && num < page + right_current)
            || num > pages - right_edge;
        if shown {
            if last + 1 != num {
                links.push(None);
            }
            links.push(Some(num));
            last = num;
        }
    }

    links
}
