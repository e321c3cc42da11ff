use crate::schema::EntityId;

use std::fmt;

/// An opaque, locally generated identifier bound 1:1 to an
/// (entity, resource id) pair for the lifetime of the process.
///
/// Handles are allocated by the identity cache and are never reused across
/// different resource ids. Callers treat them as tokens; the slot number
/// carries no meaning outside the cache that issued it.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Handle {
    entity: EntityId,
    slot: u64,
}

impl Handle {
    pub fn new(entity: EntityId, slot: u64) -> Self {
        Self { entity, slot }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn slot(&self) -> u64 {
        self.slot
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}/{})", self.entity.0, self.slot)
    }
}
