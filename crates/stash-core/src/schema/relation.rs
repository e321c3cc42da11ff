use super::EntityId;

/// A relationship from one entity to another.
#[derive(Debug, Clone)]
pub struct Relation {
    /// The relationship name
    pub name: String,

    /// The destination entity
    pub target: EntityId,

    /// To-one or to-many
    pub cardinality: Cardinality,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cardinality {
    ToOne,
    ToMany,
}

impl Relation {
    pub fn is_to_many(&self) -> bool {
        matches!(self.cardinality, Cardinality::ToMany)
    }
}
