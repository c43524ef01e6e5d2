//! Traits describing entities
//!
//! `Entity` carries the table metadata every query needs; `SoftDeletable`
//! marks entities that can be soft-deleted and restored.

pub mod entity;
pub mod soft_deletable;

pub use entity::{Entity, Relation};
pub use soft_deletable::SoftDeletable;
