mod attribute;
pub use attribute::Attribute;

mod builder;
pub use builder::{Builder, EntityBuilder};

mod entity;
pub use entity::{Entity, EntityId};

mod relation;
pub use relation::{Cardinality, Relation};

use crate::{err, Result};

use indexmap::IndexMap;

/// Static entity metadata, supplied by the application and read-only to the
/// cache core.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Entities, indexed by [`EntityId`].
    pub entities: Vec<Entity>,

    /// Maps entity names to identifiers.
    pub(crate) by_name: IndexMap<String, EntityId>,
}

impl Schema {
    pub fn builder() -> Builder {
        Builder::new()
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.by_name.get(name).map(|id| self.entity(*id))
    }

    /// Like `entity_by_name`, but unknown entity names are an error.
    pub fn expect_entity(&self, name: &str) -> Result<&Entity> {
        self.entity_by_name(name)
            .ok_or_else(|| err!("unknown entity `{name}`"))
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }
}
