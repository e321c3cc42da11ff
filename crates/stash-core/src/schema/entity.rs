use super::{Attribute, Relation};

use std::fmt;

/// An entity descriptor: name, scalar attributes, and relationships.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Uniquely identifies the entity within the schema
    pub id: EntityId,

    /// Name of the entity
    pub name: String,

    /// Ordered scalar fields
    pub attributes: Vec<Attribute>,

    /// Ordered relationships to other entities
    pub relations: Vec<Relation>,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub usize);

impl Entity {
    pub fn attribute_by_name(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    pub fn relation_by_name(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    /// Returns true if `name` names an attribute or a relationship.
    pub fn has_field(&self, name: &str) -> bool {
        self.attribute_by_name(name).is_some() || self.relation_by_name(name).is_some()
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}
