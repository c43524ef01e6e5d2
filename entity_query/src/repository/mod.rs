//! Repository layer
//!
//! `EntityRepository<T>` hands out fresh queries for one entity; the
//! executor and mutation modules add the terminal operations to
//! `EntityQuery<T>`.

#[macro_use]
mod binding;
pub mod core;
pub mod executor;
pub mod mutation;

pub use self::core::EntityRepository;
pub use mutation::{DeleteOptions, RestoreOptions};
