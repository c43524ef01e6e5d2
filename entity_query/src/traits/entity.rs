use serde::Serialize;
use sqlx::postgres::PgRow;
use type_mapping::SqlValue;

/// A declared relation used to derive join conditions.
///
/// Joining relation `category` as alias `c` from root alias `p` produces
/// `c.{foreign_key} = p.{local_key}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub name: &'static str,
    pub table: &'static str,
    pub local_key: &'static str,
    pub foreign_key: &'static str,
}

/// Metadata about an entity's table
///
/// This trait should be derived using the `#[model]` attribute macro (or
/// `#[derive(Entity)]`):
/// ```ignore
/// #[model]
/// #[table(name = "products")]
/// #[relation(name = "category", table = "categories", local_key = "category_id")]
/// pub struct Product {
///     #[primary_key]
///     pub id: i64,
///     #[unique]
///     pub sku: String,
///     pub category_id: Option<i64>,
///     #[soft_delete]
///     pub deleted_at: Option<DateTime<Utc>>,
/// }
/// ```
pub trait Entity:
    for<'r> sqlx::FromRow<'r, PgRow> + Serialize + Send + Sync + Unpin + 'static
{
    /// The table name in the database
    const TABLE: &'static str;
    /// Entity name used in message keys (`product.not_found`)
    const NAME: &'static str;
    const PRIMARY_KEY: &'static str;
    const COLUMNS: &'static [&'static str];
    /// Columns accepted by `filter_by_unique`
    const UNIQUE_COLUMNS: &'static [&'static str] = &[];
    /// Soft-delete marker column; `None` when rows can only be hard-deleted
    const SOFT_DELETE: Option<&'static str> = None;

    fn primary_key_value(&self) -> SqlValue;

    /// Look up a declared relation by name
    fn relation(_name: &str) -> Option<Relation> {
        None
    }

    fn supports_soft_delete() -> bool {
        Self::SOFT_DELETE.is_some()
    }
}
