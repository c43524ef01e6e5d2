//! Compile-level tests for the filter composer and query assembler

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use type_mapping::SqlValue;

use crate::errors::QueryError;
use crate::query_builder::{
    AnyCondition, EntityQuery, Intent, JoinOn, JoinType, QueryOperator, RowState, SelectField,
    SortOrder,
};
use crate::repository::{DeleteOptions, EntityRepository, RestoreOptions};
use crate::scope::{MutationScope, ScopeReason};
use crate::traits::{Entity, Relation, SoftDeletable};

// ========================================
// Fixtures
// ========================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
struct Product {
    id: i64,
    name: String,
    sku: String,
    price: f64,
    category_id: Option<i64>,
    status: String,
    deleted_at: Option<DateTime<Utc>>,
}

impl Entity for Product {
    const TABLE: &'static str = "products";
    const NAME: &'static str = "product";
    const PRIMARY_KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "sku",
        "price",
        "category_id",
        "status",
        "deleted_at",
    ];
    const UNIQUE_COLUMNS: &'static [&'static str] = &["sku"];
    const SOFT_DELETE: Option<&'static str> = Some("deleted_at");

    fn primary_key_value(&self) -> SqlValue {
        SqlValue::from(self.id)
    }

    fn relation(name: &str) -> Option<Relation> {
        match name {
            "category" => Some(Relation {
                name: "category",
                table: "categories",
                local_key: "category_id",
                foreign_key: "id",
            }),
            _ => None,
        }
    }
}

impl SoftDeletable for Product {
    const SOFT_DELETE_COLUMN: &'static str = "deleted_at";
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
struct Category {
    id: i64,
    name: String,
    deleted_at: Option<DateTime<Utc>>,
}

impl Entity for Category {
    const TABLE: &'static str = "categories";
    const NAME: &'static str = "category";
    const PRIMARY_KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &["id", "name", "deleted_at"];
    const SOFT_DELETE: Option<&'static str> = Some("deleted_at");

    fn primary_key_value(&self) -> SqlValue {
        SqlValue::from(self.id)
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
struct LogEntry {
    id: i64,
    message: String,
}

impl Entity for LogEntry {
    const TABLE: &'static str = "log_entries";
    const NAME: &'static str = "log_entry";
    const PRIMARY_KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &["id", "message"];

    fn primary_key_value(&self) -> SqlValue {
        SqlValue::from(self.id)
    }
}

fn products() -> EntityQuery<Product> {
    EntityRepository::<Product>::new("p").unwrap().query()
}

fn logs() -> EntityQuery<LogEntry> {
    EntityRepository::<LogEntry>::new("l").unwrap().query()
}

fn sql<T: Entity>(query: &EntityQuery<T>, intent: Intent) -> String {
    query.compile(intent).unwrap().statement.sql
}

fn fetch(query: &EntityQuery<Product>) -> String {
    sql(query, Intent::fetch_all(false, false))
}

fn is_configuration<T>(result: Result<T, QueryError>) -> bool {
    matches!(result, Err(QueryError::Configuration(_)))
}

// ========================================
// Filter composer
// ========================================

#[test]
fn test_default_query_hides_soft_deleted() {
    assert_eq!(
        fetch(&products()),
        "SELECT p.* FROM products p WHERE p.deleted_at IS NULL"
    );
    assert_eq!(sql(&logs(), Intent::fetch_all(false, false)), "SELECT l.* FROM log_entries l");
}

#[test]
fn test_filter_by_binds_values() {
    let query = products()
        .filter_by("name", "Desk")
        .filter_by_status("active");
    let compiled = query.compile(Intent::fetch_all(false, false)).unwrap();

    assert_eq!(
        compiled.statement.sql,
        "SELECT p.* FROM products p WHERE p.name = $1 AND p.status = $2 AND p.deleted_at IS NULL"
    );
    assert_eq!(
        compiled.statement.named,
        "SELECT p.* FROM products p WHERE p.name = :pname AND p.status = :pstatus AND p.deleted_at IS NULL"
    );
    assert_eq!(
        compiled.statement.params,
        vec![SqlValue::Text("Desk".into()), SqlValue::Text("active".into())]
    );
    assert_eq!(query.scope(), &MutationScope::Unscoped);
}

#[test]
fn test_absent_value_is_noop() {
    let plain = products();
    let filtered = products()
        .filter_by("name", None::<String>)
        .filter_by_op("price", None::<f64>, QueryOperator::Gt)
        .filter_by_status(None::<&str>)
        .filter_by_id(None::<i64>);

    assert!(filtered.filters.is_empty());
    assert_eq!(fetch(&filtered), fetch(&plain));
    assert_eq!(filtered.scope(), &MutationScope::Unscoped);
}

#[test]
fn test_zero_and_empty_string_filter() {
    let compiled = products()
        .filter_by("price", 0)
        .filter_by("name", "")
        .compile(Intent::fetch_all(false, false))
        .unwrap();

    assert_eq!(
        compiled.statement.sql,
        "SELECT p.* FROM products p WHERE p.price = $1 AND p.name = $2 AND p.deleted_at IS NULL"
    );
    assert_eq!(
        compiled.statement.params,
        vec![SqlValue::Integer(0), SqlValue::Text(String::new())]
    );
}

#[test]
fn test_in_requires_array() {
    let query = products().filter_by_op("category_id", vec![1, 2, 3], QueryOperator::In);
    assert_eq!(
        fetch(&query),
        "SELECT p.* FROM products p WHERE p.category_id IN ($1, $2, $3) AND p.deleted_at IS NULL"
    );

    let eq_with_array = products().filter_by_op("category_id", vec![1, 2, 3], QueryOperator::Eq);
    assert!(is_configuration(eq_with_array.compile(Intent::First)));

    let in_with_scalar = products().filter_by_op("category_id", 5, QueryOperator::In);
    assert!(is_configuration(in_with_scalar.compile(Intent::First)));
}

#[test]
fn test_pattern_operators_reject_lists() {
    let like_list = products().filter_by_op("name", vec!["a", "b"], QueryOperator::Like);
    assert!(is_configuration(like_list.compile(Intent::fetch_all(false, false))));

    let any_list = products().filter_any([AnyCondition::new(
        "name",
        vec!["a", "b"],
        QueryOperator::StartILike,
    )]);
    assert!(is_configuration(any_list.compile(Intent::fetch_all(false, false))));

    let join_list = products().join(
        "images",
        "i",
        JoinType::Inner,
        Some(JoinOn::columns("product_id", "id").and("kind", vec!["a", "b"], QueryOperator::EndLike)),
    );
    assert!(is_configuration(join_list.compile(Intent::First)));
}

#[test]
fn test_empty_in_matches_nothing() {
    let compiled = products()
        .filter_by_op("category_id", Vec::<i64>::new(), QueryOperator::In)
        .compile(Intent::fetch_all(false, false))
        .unwrap();

    assert_eq!(
        compiled.statement.sql,
        "SELECT p.* FROM products p WHERE 1=0 AND p.deleted_at IS NULL"
    );
    assert!(compiled.statement.params.is_empty());
}

#[test]
fn test_invalid_columns_fail_at_compile() {
    let cases: Vec<EntityQuery<Product>> = vec![
        products().filter_by("name; DROP TABLE products", 1),
        products().filter_any([AnyCondition::eq("name) OR (1=1", "x")]),
        products().order_by("name desc", SortOrder::Asc),
        products().group_by("lower(name)"),
        products().filter_null("name--"),
        products().filter_by_range("price'", 1, 2),
    ];

    for query in cases {
        assert!(
            matches!(query.compile(Intent::First), Err(QueryError::InvalidColumn { .. })),
            "query: {:?}",
            query
        );
    }

    let bad_select = products().select(["name AS x"]);
    assert!(matches!(
        bad_select.compile(Intent::First),
        Err(QueryError::InvalidColumn { .. })
    ));
}

#[test]
fn test_pattern_operators() {
    let cases = [
        (QueryOperator::Like, "p.name LIKE $1", "%de%"),
        (QueryOperator::ILike, "p.name ILIKE $1", "%de%"),
        (QueryOperator::StartLike, "p.name LIKE $1", "de%"),
        (QueryOperator::StartILike, "p.name ILIKE $1", "de%"),
        (QueryOperator::EndLike, "p.name LIKE $1", "%de"),
        (QueryOperator::EndILike, "p.name ILIKE $1", "%de"),
    ];

    for (operator, predicate, pattern) in cases {
        let compiled = products()
            .filter_by_op("name", "de", operator)
            .compile(Intent::fetch_all(false, false))
            .unwrap();
        assert_eq!(
            compiled.statement.sql,
            format!("SELECT p.* FROM products p WHERE {} AND p.deleted_at IS NULL", predicate)
        );
        assert_eq!(compiled.statement.params, vec![SqlValue::Text(pattern.into())]);
    }
}

#[test]
fn test_filter_any_builds_or_group() {
    let compiled = products()
        .filter_by_status("active")
        .filter_any([
            AnyCondition::like("name", "ann"),
            AnyCondition::ilike("sku", "ann"),
            AnyCondition::eq("category_id", None::<i64>),
        ])
        .compile(Intent::fetch_all(false, false))
        .unwrap();

    assert_eq!(
        compiled.statement.sql,
        "SELECT p.* FROM products p WHERE p.status = $1 AND (p.name LIKE $2 OR p.sku ILIKE $3) AND p.deleted_at IS NULL"
    );
    assert_eq!(
        compiled.statement.params,
        vec![
            SqlValue::Text("active".into()),
            SqlValue::Text("%ann%".into()),
            SqlValue::Text("%ann%".into()),
        ]
    );
}

#[test]
fn test_filter_any_empty_group_is_noop() {
    let query = products().filter_any([AnyCondition::eq("name", None::<&str>)]);
    assert!(query.filters.is_empty());

    let query = products().filter_any(Vec::new());
    assert!(query.filters.is_empty());
}

#[test]
fn test_filter_any_does_not_scope() {
    let query = products().filter_any([
        AnyCondition::eq("category_id", 1),
        AnyCondition::eq("id", 2),
    ]);
    assert!(!query.scope().is_scoped());
}

#[test]
fn test_range_filters() {
    let both = products()
        .filter_by_range("price", 10, 50)
        .compile(Intent::fetch_all(false, false))
        .unwrap();
    assert_eq!(
        both.statement.named,
        "SELECT p.* FROM products p WHERE p.price BETWEEN :min_pprice AND :max_pprice AND p.deleted_at IS NULL"
    );
    assert_eq!(
        both.statement.sql,
        "SELECT p.* FROM products p WHERE p.price BETWEEN $1 AND $2 AND p.deleted_at IS NULL"
    );
    assert_eq!(
        both.statement.params,
        vec![SqlValue::Integer(10), SqlValue::Integer(50)]
    );

    let lower = products().filter_by_range("price", 10, None::<i32>);
    assert_eq!(
        fetch(&lower),
        "SELECT p.* FROM products p WHERE p.price >= $1 AND p.deleted_at IS NULL"
    );

    let upper = products().filter_by_range("price", None::<i32>, 50);
    assert_eq!(
        fetch(&upper),
        "SELECT p.* FROM products p WHERE p.price <= $1 AND p.deleted_at IS NULL"
    );

    let neither = products().filter_by_range("price", None::<i32>, None::<i32>);
    assert!(neither.filters.is_empty());
}

#[test]
fn test_range_bounds_normalize_to_utc() {
    let compiled = products()
        .filter_by_range("updated_at", "2024-03-01T12:00:00+02:00", None::<&str>)
        .compile(Intent::fetch_all(false, false))
        .unwrap();

    assert_eq!(
        compiled.statement.params,
        vec![SqlValue::Timestamp(
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
        )]
    );
}

#[test]
fn test_repeated_columns_get_distinct_keys() {
    let compiled = products()
        .filter_by_op("price", 10, QueryOperator::Gte)
        .filter_by_op("price", 20, QueryOperator::Lte)
        .filter_by_range("price", 1, 2)
        .compile(Intent::fetch_all(false, false))
        .unwrap();

    assert_eq!(
        compiled.statement.named,
        "SELECT p.* FROM products p WHERE p.price >= :pprice AND p.price <= :pprice_2 AND p.price BETWEEN :min_pprice_3 AND :max_pprice_3 AND p.deleted_at IS NULL"
    );
    assert_eq!(compiled.statement.params.len(), 4);
}

#[test]
fn test_casts_and_decimals() {
    let compiled = products()
        .filter_by("price::numeric", 5)
        .filter_by_op("price", SqlValue::Decimal("9.99".into()), QueryOperator::Gte)
        .compile(Intent::fetch_all(false, false))
        .unwrap();

    assert_eq!(
        compiled.statement.named,
        "SELECT p.* FROM products p WHERE p.price::numeric = :pprice AND p.price >= :pprice_2 AND p.deleted_at IS NULL"
    );
    assert_eq!(
        compiled.statement.sql,
        "SELECT p.* FROM products p WHERE p.price::numeric = $1 AND p.price >= $2::numeric AND p.deleted_at IS NULL"
    );
}

#[test]
fn test_null_checks() {
    let query = products()
        .filter_null("category_id")
        .filter_not_null("c.name");
    let compiled = query.compile(Intent::fetch_all(false, false)).unwrap();

    assert_eq!(
        compiled.statement.sql,
        "SELECT p.* FROM products p WHERE p.category_id IS NULL AND c.name IS NOT NULL AND p.deleted_at IS NULL"
    );
    assert!(compiled.statement.params.is_empty());
}

#[test]
fn test_placeholders_match_params() {
    let compiled = products()
        .filter_by("name", "Desk")
        .filter_by_op("category_id", vec![4i64, 5, 6], QueryOperator::In)
        .filter_by_range("price", 1.5, 9.5)
        .filter_any([AnyCondition::like("sku", "A"), AnyCondition::eq("status", "new")])
        .compile(Intent::fetch_all(false, false))
        .unwrap();

    let placeholders = compiled.statement.sql.matches('$').count();
    assert_eq!(placeholders, compiled.statement.params.len());
    assert_eq!(placeholders, 8);
    assert!(!compiled.statement.sql.contains("Desk"));
}

// ========================================
// Mutation scope
// ========================================

#[test]
fn test_filter_by_id_scopes() {
    let query = products().filter_by_id(42i64);
    assert_eq!(query.scope().reason(), Some(&ScopeReason::PrimaryKey));
    assert_eq!(
        fetch(&query),
        "SELECT p.* FROM products p WHERE p.id = $1 AND p.deleted_at IS NULL"
    );

    let many = products().filter_by_id(vec![1i64, 2]);
    assert_eq!(many.scope().reason(), Some(&ScopeReason::PrimaryKey));
    assert_eq!(
        fetch(&many),
        "SELECT p.* FROM products p WHERE p.id IN ($1, $2) AND p.deleted_at IS NULL"
    );
}

#[test]
fn test_filter_by_unique_scopes_declared_columns_only() {
    let query = products().filter_by_unique("sku", "A-1");
    assert_eq!(
        query.scope().reason(),
        Some(&ScopeReason::UniqueKey("sku".into()))
    );
    assert_eq!(
        fetch(&query),
        "SELECT p.* FROM products p WHERE p.sku = $1 AND p.deleted_at IS NULL"
    );

    let undeclared = products().filter_by_unique("name", "Desk");
    assert!(is_configuration(undeclared.compile(Intent::First)));
}

#[test]
fn test_key_column_heuristic() {
    let scoped = products().filter_by("p.category_id", 3);
    assert_eq!(
        scoped.scope().reason(),
        Some(&ScopeReason::KeyColumn("p.category_id".into()))
    );

    let scoped_in = products().filter_by_op("category_id", vec![3, 4], QueryOperator::In);
    assert!(scoped_in.scope().is_scoped());

    let not_equality = products().filter_by_op("category_id", 3, QueryOperator::Gt);
    assert!(!not_equality.scope().is_scoped());

    let not_a_key = products().filter_by("paid", true);
    assert!(!not_a_key.scope().is_scoped());

    let strongest = products()
        .filter_by("category_id", 3)
        .filter_by_id(1i64);
    assert_eq!(strongest.scope().reason(), Some(&ScopeReason::PrimaryKey));
}

// ========================================
// Query assembler
// ========================================

#[test]
fn test_with_deleted_drops_exclusion() {
    let query = products().filter_by_id(42i64).with_deleted(true);
    assert_eq!(fetch(&query), "SELECT p.* FROM products p WHERE p.id = $1");
}

#[test]
fn test_select_prepends_primary_key() {
    assert_eq!(
        fetch(&products().select(["name", "price"])),
        "SELECT p.id, p.name, p.price FROM products p WHERE p.deleted_at IS NULL"
    );
    assert_eq!(
        fetch(&products().select(["name", "p.id"])),
        "SELECT p.name, p.id FROM products p WHERE p.deleted_at IS NULL"
    );
    assert_eq!(
        fetch(&products().select_without_id(["name"])),
        "SELECT p.name FROM products p WHERE p.deleted_at IS NULL"
    );
}

#[test]
fn test_add_select_is_additive() {
    let query = products()
        .add_select([SelectField::count("id").with_alias("n")])
        .add_select(["sku"]);
    assert_eq!(
        fetch(&query),
        "SELECT p.*, COUNT(p.id) AS n, p.sku FROM products p WHERE p.deleted_at IS NULL"
    );
}

#[test]
fn test_join_declared_relation() {
    let query = products().join("category", "c", JoinType::Left, None);
    assert_eq!(
        fetch(&query),
        "SELECT p.* FROM products p LEFT JOIN categories c ON c.id = p.category_id WHERE p.deleted_at IS NULL"
    );
}

#[test]
fn test_join_and_select_projects_and_excludes_deleted() {
    let query = products().join_and_select::<Category>("category", "c", JoinType::Inner, None);
    assert_eq!(
        fetch(&query),
        "SELECT p.*, c.id AS c_id, c.name AS c_name, c.deleted_at AS c_deleted_at \
         FROM products p INNER JOIN categories c ON c.id = p.category_id AND c.deleted_at IS NULL \
         WHERE p.deleted_at IS NULL"
    );

    let with_deleted = products()
        .join_and_select::<Category>("category", "c", JoinType::Inner, None)
        .with_deleted(true);
    assert_eq!(
        fetch(&with_deleted),
        "SELECT p.*, c.id AS c_id, c.name AS c_name, c.deleted_at AS c_deleted_at \
         FROM products p INNER JOIN categories c ON c.id = p.category_id"
    );
}

#[test]
fn test_join_table_requires_on() {
    let missing = products().join("images", "i", JoinType::Inner, None);
    assert!(is_configuration(missing.compile(Intent::First)));

    let compiled = products()
        .join(
            "images",
            "i",
            JoinType::Inner,
            Some(JoinOn::columns("product_id", "id").and("kind", "primary", QueryOperator::Eq)),
        )
        .filter_by("name", "Desk")
        .compile(Intent::fetch_all(false, false))
        .unwrap();

    assert_eq!(
        compiled.statement.named,
        "SELECT p.* FROM products p INNER JOIN images i ON i.product_id = p.id AND i.kind = :ikind \
         WHERE p.name = :pname AND p.deleted_at IS NULL"
    );
    assert_eq!(
        compiled.statement.sql,
        "SELECT p.* FROM products p INNER JOIN images i ON i.product_id = p.id AND i.kind = $1 \
         WHERE p.name = $2 AND p.deleted_at IS NULL"
    );
}

#[test]
fn test_join_rejects_bad_identifiers() {
    let bad_alias = products().join("category", "c; --", JoinType::Inner, None);
    assert!(matches!(
        bad_alias.compile(Intent::First),
        Err(QueryError::InvalidIdentifier(_))
    ));

    let bad_table = products().join(
        "images i; DROP",
        "i",
        JoinType::Inner,
        Some(JoinOn::columns("product_id", "id")),
    );
    assert!(matches!(
        bad_table.compile(Intent::First),
        Err(QueryError::InvalidIdentifier(_))
    ));
}

#[test]
fn test_order_and_pagination() {
    let query = products()
        .order_by("price", SortOrder::Desc)
        .order_by_opt(None::<&str>, SortOrder::Asc)
        .order_by_opt(Some("name"), SortOrder::Asc)
        .pagination(Some(3), Some(20));
    assert_eq!(
        fetch(&query),
        "SELECT p.* FROM products p WHERE p.deleted_at IS NULL ORDER BY p.price DESC, p.name ASC LIMIT 20 OFFSET 40"
    );
}

#[test]
fn test_pagination_defaults_and_cap() {
    assert_eq!(
        fetch(&products().pagination(None, None)),
        "SELECT p.* FROM products p WHERE p.deleted_at IS NULL LIMIT 10 OFFSET 0"
    );
    assert_eq!(
        fetch(&products().pagination(Some(0), Some(1000))),
        "SELECT p.* FROM products p WHERE p.deleted_at IS NULL LIMIT 100 OFFSET 0"
    );
}

#[test]
fn test_first_limits_to_one() {
    assert_eq!(
        sql(&products(), Intent::First),
        "SELECT p.* FROM products p WHERE p.deleted_at IS NULL LIMIT 1"
    );
    assert_eq!(
        sql(&products().pagination(Some(2), Some(5)), Intent::First),
        "SELECT p.* FROM products p WHERE p.deleted_at IS NULL LIMIT 1 OFFSET 5"
    );
}

#[test]
fn test_group_by() {
    let query = products()
        .select_without_id([SelectField::column("status"), SelectField::count_all().with_alias("total")])
        .group_by("status");
    assert!(query.has_group());
    assert_eq!(
        fetch(&query),
        "SELECT p.status, COUNT(*) AS total FROM products p WHERE p.deleted_at IS NULL GROUP BY p.status"
    );
}

// ========================================
// Intents
// ========================================

#[test]
fn test_count_ignores_projection_order_and_pagination() {
    let query = products()
        .select(["name"])
        .filter_by("name", "Desk")
        .order_by("name", SortOrder::Asc)
        .pagination(Some(2), Some(10));

    assert_eq!(
        sql(&query, Intent::Count),
        "SELECT COUNT(DISTINCT p.id) AS total FROM products p WHERE p.name = $1 AND p.deleted_at IS NULL"
    );
}

#[test]
fn test_fetch_all_with_count() {
    let compiled = products()
        .filter_by("name", "Desk")
        .order_by("name", SortOrder::Asc)
        .pagination(Some(2), Some(10))
        .compile(Intent::fetch_all(true, false))
        .unwrap();

    assert_eq!(
        compiled.statement.sql,
        "SELECT p.* FROM products p WHERE p.name = $1 AND p.deleted_at IS NULL ORDER BY p.name ASC LIMIT 10 OFFSET 10"
    );
    let count = compiled.count.unwrap();
    assert_eq!(
        count.sql,
        "SELECT COUNT(DISTINCT p.id) AS total FROM products p WHERE p.name = $1 AND p.deleted_at IS NULL"
    );
    assert_eq!(count.params, compiled.statement.params);
}

#[test]
fn test_count_rejections() {
    assert!(is_configuration(
        products().compile(Intent::fetch_all(true, true))
    ));

    let grouped = products().group_by("status");
    assert!(is_configuration(grouped.compile(Intent::fetch_all(true, false))));
    assert!(grouped.compile(Intent::fetch_all(false, true)).is_ok());
}

#[test]
fn test_count_ignores_grouping() {
    let grouped = products()
        .filter_by("name", "Desk")
        .group_by("status")
        .order_by("status", SortOrder::Asc);

    assert_eq!(
        sql(&grouped, Intent::Count),
        "SELECT COUNT(DISTINCT p.id) AS total FROM products p WHERE p.name = $1 AND p.deleted_at IS NULL"
    );
}

#[test]
fn test_candidates() {
    let query = products()
        .filter_by_id(42i64)
        .order_by("name", SortOrder::Asc)
        .pagination(Some(1), Some(5));

    let visible = Intent::Candidates {
        rows: RowState::Visible,
    };
    let live = Intent::Candidates {
        rows: RowState::Live,
    };
    let deleted = Intent::Candidates {
        rows: RowState::Deleted,
    };

    assert_eq!(
        sql(&query, visible),
        "SELECT p.* FROM products p WHERE p.id = $1 AND p.deleted_at IS NULL"
    );
    assert_eq!(
        sql(&query, live),
        "SELECT p.* FROM products p WHERE p.id = $1 AND p.deleted_at IS NULL"
    );
    assert_eq!(
        sql(&query, deleted),
        "SELECT p.* FROM products p WHERE p.id = $1 AND p.deleted_at IS NOT NULL"
    );

    assert!(is_configuration(logs().filter_by_id(1i64).compile(live)));
    assert!(is_configuration(logs().filter_by_id(1i64).compile(deleted)));
    assert_eq!(
        sql(&logs().filter_by_id(1i64), visible),
        "SELECT l.* FROM log_entries l WHERE l.id = $1"
    );
}

#[test]
fn test_soft_delete_candidates_skip_deleted_rows() {
    let query = products().filter_by_id(42i64).with_deleted(true);

    // A hard delete may purge soft-deleted rows; a soft delete must not
    // stamp them again.
    assert_eq!(
        sql(
            &query,
            Intent::Candidates {
                rows: RowState::Visible
            }
        ),
        "SELECT p.* FROM products p WHERE p.id = $1"
    );
    assert_eq!(
        sql(
            &query,
            Intent::Candidates {
                rows: RowState::Live
            }
        ),
        "SELECT p.* FROM products p WHERE p.id = $1 AND p.deleted_at IS NULL"
    );
}

#[test]
fn test_invalid_alias() {
    assert!(matches!(
        EntityRepository::<Product>::new("order"),
        Err(QueryError::InvalidIdentifier(_))
    ));
    assert!(EntityRepository::<Product>::new("p.x").is_err());
}

#[test]
fn test_context_is_carried() {
    let context = signal_system::ContextData::new().with_actor("admin");
    let query = products().with_context(context.clone());
    assert_eq!(query.context(), Some(&context));
}

// ========================================
// Mutation guards (rejected before any I/O)
// ========================================

fn lazy_pool() -> sqlx::PgPool {
    sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://localhost/repohaus_unused")
        .unwrap()
}

#[tokio::test]
async fn test_unscoped_delete_is_rejected() {
    let pool = lazy_pool();
    let result = products()
        .filter_by_status("archived")
        .delete(&pool, DeleteOptions::default())
        .await;
    assert!(is_configuration(result));
}

#[tokio::test]
async fn test_soft_delete_requires_capability() {
    let pool = lazy_pool();
    let result = logs()
        .filter_by_id(1i64)
        .delete(&pool, DeleteOptions::soft())
        .await;
    assert!(is_configuration(result));
}

#[tokio::test]
async fn test_unscoped_restore_is_rejected() {
    let pool = lazy_pool();
    let result = products()
        .filter_by("name", "Desk")
        .restore(&pool, RestoreOptions::default())
        .await;
    assert!(is_configuration(result));
}

#[test]
fn test_delete_options() {
    assert_eq!(
        DeleteOptions::default(),
        DeleteOptions {
            soft: true,
            multiple: false,
            force: false
        }
    );
    let hard = DeleteOptions::hard().multiple().force();
    assert!(!hard.soft && hard.multiple && hard.force);
}
