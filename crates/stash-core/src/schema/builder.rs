use super::{Attribute, Cardinality, Entity, EntityId, Relation, Schema};
use crate::{bail, stmt, Result};

use indexmap::IndexMap;

/// Builds a [`Schema`] from entity declarations.
///
/// Relation targets are declared by name and resolved to [`EntityId`]s in a
/// second pass, so entities may reference entities declared later (or
/// themselves).
#[derive(Debug, Default)]
pub struct Builder {
    entities: Vec<EntityBuilder>,
}

#[derive(Debug)]
pub struct EntityBuilder {
    name: String,
    attributes: Vec<Attribute>,
    relations: Vec<RelationDecl>,
}

#[derive(Debug)]
struct RelationDecl {
    name: String,
    target: String,
    cardinality: Cardinality,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a new entity and returns a builder for its fields.
    pub fn entity(&mut self, name: impl Into<String>) -> &mut EntityBuilder {
        self.entities.push(EntityBuilder {
            name: name.into(),
            attributes: vec![],
            relations: vec![],
        });
        self.entities.last_mut().unwrap()
    }

    pub fn build(self) -> Result<Schema> {
        // Reserve identifiers before building so relations can point at any
        // declared entity, including forward references.
        let mut by_name = IndexMap::new();
        for (index, entity) in self.entities.iter().enumerate() {
            if by_name.insert(entity.name.clone(), EntityId(index)).is_some() {
                bail!("duplicate entity `{}`", entity.name);
            }
        }

        let mut entities = vec![];
        for (index, entity) in self.entities.into_iter().enumerate() {
            let id = EntityId(index);

            let mut field_names: Vec<&str> = vec![];
            for attribute in &entity.attributes {
                field_names.push(&attribute.name);
            }
            for relation in &entity.relations {
                field_names.push(&relation.name);
            }
            for (i, name) in field_names.iter().enumerate() {
                if field_names[..i].contains(name) {
                    bail!("duplicate field `{}` on entity `{}`", name, entity.name);
                }
            }

            let relations = entity
                .relations
                .into_iter()
                .map(|decl| {
                    let Some(target) = by_name.get(&decl.target).copied() else {
                        bail!(
                            "relation `{}.{}` targets unknown entity `{}`",
                            entity.name,
                            decl.name,
                            decl.target
                        );
                    };
                    Ok(Relation {
                        name: decl.name,
                        target,
                        cardinality: decl.cardinality,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            entities.push(Entity {
                id,
                name: entity.name,
                attributes: entity.attributes,
                relations,
            });
        }

        Ok(Schema { entities, by_name })
    }
}

impl EntityBuilder {
    pub fn attribute(&mut self, name: impl Into<String>, ty: stmt::Type) -> &mut Self {
        self.attributes.push(Attribute {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn to_one(&mut self, name: impl Into<String>, target: impl Into<String>) -> &mut Self {
        self.relation(name, target, Cardinality::ToOne)
    }

    pub fn to_many(&mut self, name: impl Into<String>, target: impl Into<String>) -> &mut Self {
        self.relation(name, target, Cardinality::ToMany)
    }

    fn relation(
        &mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        cardinality: Cardinality,
    ) -> &mut Self {
        self.relations.push(RelationDecl {
            name: name.into(),
            target: target.into(),
            cardinality,
        });
        self
    }
}
