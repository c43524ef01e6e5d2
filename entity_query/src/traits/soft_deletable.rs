use super::entity::Entity;

/// Entities whose rows are hidden rather than removed.
///
/// Only these can be restored. `SOFT_DELETE_COLUMN` must match
/// `Entity::SOFT_DELETE`, which the derive guarantees.
pub trait SoftDeletable: Entity {
    const SOFT_DELETE_COLUMN: &'static str;
}
