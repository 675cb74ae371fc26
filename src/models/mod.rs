//! Data models for SIYANMAT

pub mod activity;
pub mod tool;
pub mod user;

// Re-export commonly used types
pub use activity::{Activity, ActivityWithTools, LinkedTool};
pub use tool::{ActivityCharge, Tool, ToolCondition, ToolDetail, ToolUsage, ToolView};
pub use user::{Role, User, UserClaims};

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 200;

/// Page window requested by a list query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    /// Rows before this page; saturates for absurd page numbers
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Cut one page out of an already filtered and sorted list
    pub fn slice<T>(&self, items: Vec<T>) -> (Vec<T>, i64) {
        let total = items.len() as i64;
        let skip = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let page = items
            .into_iter()
            .skip(skip)
            .take(self.per_page as usize)
            .collect();
        (page, total)
    }
}
