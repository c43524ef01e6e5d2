//! # Repohaus
//!
//! Guarded, parameterized entity queries for PostgreSQL: validated columns,
//! safe bind parameter names, composable filters, pagination, soft delete
//! and restore with lifecycle hooks.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use repohaus::prelude::*;
//!
//! #[model]
//! #[table(name = "products")]
//! pub struct Product {
//!     #[primary_key]
//!     pub id: i64,
//!     pub name: String,
//!     pub status: String,
//!     #[soft_delete]
//!     pub deleted_at: Option<DateTime<Utc>>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::new(
//!         "localhost".to_string(), 5432, "shop".to_string(),
//!         "postgres".to_string(), "password".to_string(),
//!         1, 5, 30, 600, 3600,
//!     );
//!     let repohaus = Repohaus::new(AppConfig {
//!         database: config,
//!         query: QueryConfig::default(),
//!         signal: SignalConfig::default(),
//!     })
//!     .await?;
//!
//!     let products = repohaus.repository::<Product>("p")?;
//!
//!     let (page, total) = products
//!         .query()
//!         .filter_by_status("active")
//!         .filter_any([AnyCondition::ilike("name", "desk")])
//!         .order_by(ProductColumn::Name, SortOrder::Asc)
//!         .pagination(Some(1), Some(20))
//!         .all_with_count(repohaus.pool())
//!         .await?;
//!     println!("{} of {} products", page.len(), total);
//!
//!     let removed = products
//!         .query()
//!         .filter_by_id(42i64)
//!         .delete(repohaus.pool(), DeleteOptions::default())
//!         .await?;
//!     println!("soft-deleted {} product(s)", removed);
//!
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use crate::core::Repohaus;
pub use errors::RepohausError;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, QueryConfig, SignalConfig};

// Conditional logging macros shared by the workspace
pub use entity_query::{debug_log, trace_log};

// Re-export internal crates used by macros and public API
// These MUST be public for the generated macro code to work correctly
pub use entity_query;
pub use signal_system;
pub use table_derive;
pub use type_mapping;

// Re-export external dependencies used in public API
pub use async_trait;
pub use sqlx;
