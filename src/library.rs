//! Categorized game sets and pagination.
//!
//! Records are split into three disjoint categories. One of Installed or
//! Custom is paginated for the grid; Downloading is always shown in full as
//! the download queue.

use std::fmt;

use serde::Serialize;

use crate::game::GameRecord;

/// Games per page in the library grid
pub const DEFAULT_PAGE_SIZE: usize = 6;

/// Library categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Installed,
    Downloading,
    Custom,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Installed => "Installed",
            Category::Downloading => "Downloading",
            Category::Custom => "Custom",
        })
    }
}

/// The latest fetched records split by category
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategorizedGames {
    pub installed: Vec<GameRecord>,
    pub downloading: Vec<GameRecord>,
    pub custom: Vec<GameRecord>,
}

impl CategorizedGames {
    /// True only when every category is empty
    pub fn is_empty(&self) -> bool {
        self.installed.is_empty() && self.downloading.is_empty() && self.custom.is_empty()
    }

    /// Category shown in the paginated grid: Installed wins when non-empty
    pub fn paged_category(&self) -> Category {
        if self.installed.is_empty() {
            Category::Custom
        } else {
            Category::Installed
        }
    }

    /// Records of the paginated category
    pub fn paged(&self) -> &[GameRecord] {
        match self.paged_category() {
            Category::Installed => &self.installed,
            _ => &self.custom,
        }
    }
}

/// Split managed records into (installed, downloading).
///
/// Relative order within each side is preserved.
pub fn partition_managed(records: Vec<GameRecord>) -> (Vec<GameRecord>, Vec<GameRecord>) {
    let (downloading, installed): (Vec<_>, Vec<_>) =
        records.into_iter().partition(GameRecord::is_downloading);
    (installed, downloading)
}

/// Number of pages needed for `count` items
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1))
}

/// Slice of `items` on the 1-based `page`.
///
/// Out-of-range pages (including 0) yield an empty slice.
pub fn get_page<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let page_size = page_size.max(1);
    let Some(index) = page.checked_sub(1) else {
        return &[];
    };
    let start = index.saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Pagination cursor over the paged category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    current_page: usize,
    page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self, count: usize) -> usize {
        total_pages(count, self.page_size)
    }

    /// Move to `page`, clamped to the pages available for `count` items
    pub fn go_to(&mut self, page: usize, count: usize) -> usize {
        let last = self.total_pages(count).max(1);
        self.current_page = page.clamp(1, last);
        self.current_page
    }

    /// Keep the cursor in range after the item count changed
    pub fn clamp(&mut self, count: usize) {
        self.go_to(self.current_page, count);
    }

    /// Items on the current page
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        get_page(items, self.current_page, self.page_size)
    }
}
