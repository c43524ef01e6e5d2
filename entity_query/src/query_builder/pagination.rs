use config::QueryConfig;

/// Requested page; resolved against `QueryConfig` at compile time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pagination {
    /// 1-based; 0 is treated as 1
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl Pagination {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self { page, limit }
    }

    /// `(limit, offset)` with the configured default and cap applied
    pub fn resolve(&self, config: &QueryConfig) -> (u32, u64) {
        let limit = match self.limit {
            Some(limit) if limit > 0 => limit.min(config.max_page_size),
            _ => config.default_page_size.min(config.max_page_size),
        };
        let page = self.page.unwrap_or(1).max(1);
        let offset = u64::from(page - 1) * u64::from(limit);
        (limit, offset)
    }
}
