//! Typed SQL values shared across the repohaus ecosystem
//!
//! `SqlValue` is the single value type used for bind parameters and for
//! lifecycle event payloads. `IntoFilterValue` separates "no value supplied"
//! from legitimate values such as `0` or `""`.

pub mod filter_value;
pub mod serialize;
pub mod types;

pub use filter_value::IntoFilterValue;
pub use serialize::{serialize_to_record, serialize_to_record_payload};
pub use types::SqlValue;
