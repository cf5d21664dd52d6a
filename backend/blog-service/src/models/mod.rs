//! Data models for blog-service
//!
//! Row types map one-to-one onto the `users`, `posts` and `comments` tables.
//! The `*WithAuthor` variants are produced by joined repository queries so
//! views never need to fetch relationships lazily.
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

pub const DEFAULT_PROFILE_IMAGE: &str = "default.jpg";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub image_file: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PostWithAuthor {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub user_id: i64,
    pub author_username: String,
    pub author_image: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub user_id: i64,
    pub post_id: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub content: String,
    pub user_id: i64,
    pub post_id: i64,
    pub author_username: String,
    pub author_image: String,
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// Navigation data handed to views alongside a page of items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageNavigation {
    pub page: i64,
    pub pages: i64,
    pub total: i64,
    pub prev_num: Option<i64>,
    pub next_num: Option<i64>,
    pub iter_pages: Vec<Option<i64>>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: i64, per_page: i64, total: i64) -> Self {
        Self {
            items,
            page,
            per_page,
            total,
        }
    }

    pub fn pages(&self) -> i64 {
        if self.per_page <= 0 || self.total == 0 {
            0
        } else {
            (self.total + self.per_page - 1) / self.per_page
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages()
    }

    pub fn prev_num(&self) -> Option<i64> {
        self.has_prev().then(|| self.page - 1)
    }

    pub fn next_num(&self) -> Option<i64> {
        self.has_next().then(|| self.page + 1)
    }

    /// A page past the end is only acceptable when it is the first page.
    pub fn is_out_of_range(&self) -> bool {
        self.items.is_empty() && self.page != 1
    }

    /// Page numbers for pagination links; `None` marks a gap.
    ///
    /// Keeps `left_edge` pages at the start, `right_edge` at the end, and the
    /// window `page - left_current ..= page + right_current - 1` around the
    /// current page.
    pub fn iter_pages(
        &self,
        left_edge: i64,
        left_current: i64,
        right_current: i64,
        right_edge: i64,
    ) -> Vec<Option<i64>> {
        let pages = self.pages();
        let mut out = Vec::new();
        let mut last = 0;
        for num in 1..=pages {
            let in_window = num > self.page.saturating_sub(left_current + 1)
                && num < self.page.saturating_add(right_current);
            if num <= left_edge || in_window || num > pages - right_edge {
                if last + 1 != num {
                    out.push(None);
                }
                out.push(Some(num));
                last = num;
            }
        }
        out
    }

    pub fn navigation(&self) -> PageNavigation {
        PageNavigation {
            page: self.page,
            pages: self.pages(),
            total: self.total,
            prev_num: self.prev_num(),
            next_num: self.next_num(),
            iter_pages: self.iter_pages(1, 1, 2, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iter_pages_far_past_the_end() {
        let p = Page::new(Vec::<i64>::new(), i64::MAX, 3, 7);
        assert!(p.is_out_of_range());
        assert_eq!(p.iter_pages(1, 1, 2, 1), vec![Some(1), None, Some(3)]);
    }

    fn page(page: i64, total: i64) -> Page<i64> {
        let per_page = 3;
        let start = (page - 1) * per_page;
        let items = (start..total.min(start + per_page)).collect();
        Page::new(items, page, per_page, total)
    }

    #[test]
    fn test_page_counts() {
        assert_eq!(page(1, 0).pages(), 0);
        assert_eq!(page(1, 3).pages(), 1);
        assert_eq!(page(1, 4).pages(), 2);
        assert_eq!(page(2, 7).pages(), 3);
    }

    #[test]
    fn test_prev_next() {
        let p = page(2, 7);
        assert_eq!(p.prev_num(), Some(1));
        assert_eq!(p.next_num(), Some(3));

        let last = page(3, 7);
        assert!(last.has_prev());
        assert!(!last.has_next());
        assert_eq!(last.next_num(), None);
    }

    #[test]
    fn test_out_of_range() {
        assert!(!page(1, 0).is_out_of_range());
        assert!(page(4, 7).is_out_of_range());
        assert!(!page(3, 7).is_out_of_range());
    }

    #[test]
    fn test_iter_pages_with_gaps() {
        // 30 items, 10 pages, on page 5
        let p = Page::new(vec![0; 3], 5, 3, 30);
        assert_eq!(
            p.iter_pages(1, 1, 2, 1),
            vec![Some(1), None, Some(4), Some(5), Some(6), None, Some(10)]
        );
    }

    #[test]
    fn test_iter_pages_without_gaps() {
        let p = Page::new(vec![0; 3], 1, 3, 9);
        assert_eq!(p.iter_pages(1, 1, 2, 1), vec![Some(1), Some(2), Some(3)]);
    }
}
