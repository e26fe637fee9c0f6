use crate::query::FilterDialect;

/// Largest page the remote store serves.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Implicit LIMIT for SELECTs that name none.
pub const DEFAULT_MAX_LIMIT: u64 = 20_000;

///
/// ExecutorConfig
///
/// Per-connection execution policy.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExecutorConfig {
    pub page_size: u32,
    pub max_limit: u64,
    pub filter_dialect: FilterDialect,
}

impl ExecutorConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_limit: DEFAULT_MAX_LIMIT,
            filter_dialect: FilterDialect::Formula,
        }
    }

    /// Page size; zero is raised to one.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = if page_size == 0 { 1 } else { page_size };
        self
    }

    #[must_use]
    pub const fn with_max_limit(mut self, max_limit: u64) -> Self {
        self.max_limit = max_limit;
        self
    }

    #[must_use]
    pub const fn with_filter_dialect(mut self, dialect: FilterDialect) -> Self {
        self.filter_dialect = dialect;
        self
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::new()
    }
}
