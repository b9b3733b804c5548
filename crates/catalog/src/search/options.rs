use crate::filter::FilterOptions;
use crate::sort::SortKey;
use crate::tree::GroupingMode;

/// Presentation settings of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOptions {
    pub sort_key: SortKey,
    pub descending: bool,
    pub grouping: GroupingMode,
    pub show_sub_packages: bool,
    /// 1-based page to show.
    pub page: usize,
    /// `None` uses the configured page size.
    pub page_size: Option<usize>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            sort_key: SortKey::Name,
            descending: false,
            grouping: GroupingMode::None,
            show_sub_packages: true,
            page: 1,
            page_size: None,
        }
    }
}

/// Filter and view settings for one search.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchOptions {
    pub filter: FilterOptions,
    pub view: ViewOptions,
}

impl SearchOptions {
    pub fn with_phrase(phrase: impl Into<String>) -> Self {
        Self {
            filter: FilterOptions::with_phrase(phrase),
            view: ViewOptions::default(),
        }
    }

    /// Same options on another page. Paging never changes the result set.
    pub(crate) fn without_page(&self) -> Self {
        let mut options = self.clone();
        options.view.page = 1;
        options
    }
}
