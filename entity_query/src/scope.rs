//! Mutation scope
//!
//! A query may only delete or restore rows once a filter has pinned it to
//! specific rows. The scope records which filter did that.

/// Why a query is considered safe to mutate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeReason {
    /// `filter_by_id`
    PrimaryKey,
    /// `filter_by_unique` on a declared unique column
    UniqueKey(String),
    /// Equality or `IN` on a column named `*_id` or `*.id`
    KeyColumn(String),
}

impl ScopeReason {
    fn strength(&self) -> u8 {
        match self {
            ScopeReason::PrimaryKey => 3,
            ScopeReason::UniqueKey(_) => 2,
            ScopeReason::KeyColumn(_) => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MutationScope {
    #[default]
    Unscoped,
    Scoped(ScopeReason),
}

impl MutationScope {
    pub fn is_scoped(&self) -> bool {
        matches!(self, MutationScope::Scoped(_))
    }

    /// Record a scoping filter, keeping the strongest reason seen so far
    pub fn mark(self, reason: ScopeReason) -> Self {
        match self {
            MutationScope::Scoped(current) if current.strength() >= reason.strength() => {
                MutationScope::Scoped(current)
            }
            _ => MutationScope::Scoped(reason),
        }
    }

    pub fn reason(&self) -> Option<&ScopeReason> {
        match self {
            MutationScope::Scoped(reason) => Some(reason),
            MutationScope::Unscoped => None,
        }
    }
}

/// The key-column heuristic: `product_id`, `p.category_id`, `p.id`
pub(crate) fn is_key_column(qualified: &str) -> bool {
    qualified.ends_with("_id") || qualified.ends_with(".id")
}
