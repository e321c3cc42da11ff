use super::Outcome;
use crate::{
    merge::Op,
    store::{Related, Relations, Shared},
    CacheMode,
};

use stash_core::{
    bail,
    schema::{Cardinality, EntityId},
    source::{RelationValue, Relationships},
    stmt::{Handle, ResourceId, ValueMap},
    Error, Result,
};

use std::sync::Arc;

/// A handle-addressed mutation.
pub(crate) enum Save {
    Insert {
        entity: EntityId,
        attributes: ValueMap,
        relationships: Relations,
    },
    Update {
        handle: Handle,
        attributes: ValueMap,
        relationships: Relations,
    },
    Delete {
        handle: Handle,
    },
}

pub(crate) async fn exec(shared: &Arc<Shared>, save: Save) -> Result<Outcome> {
    match save {
        Save::Insert {
            entity,
            attributes,
            relationships,
        } => {
            let entity_name = shared.schema.entity(entity).name.clone();

            // Allocate the resource id and bind the handle before the remote
            // write completes, so the handle is stable regardless of how the
            // save turns out.
            let resource_id = shared.source.new_resource_id(&entity_name).await?;
            let handle = shared
                .op(|tx| Op::Register {
                    entity,
                    resource_id: resource_id.clone(),
                    tx,
                })
                .await?;

            let relationships = resolve_relationships(shared, entity, relationships).await?;
            shared
                .source
                .save_record(&resource_id, &attributes, &relationships)
                .await?;
            Ok(Outcome::Inserted(handle))
        }
        Save::Update {
            handle,
            attributes,
            relationships,
        } => {
            deny_under_local_cache(shared, "update")?;
            let resource_id = resource_id_for(shared, handle).await?;
            let relationships =
                resolve_relationships(shared, handle.entity(), relationships).await?;
            shared
                .source
                .update_record(&resource_id, &attributes, &relationships)
                .await?;
            Ok(Outcome::Done)
        }
        Save::Delete { handle } => {
            deny_under_local_cache(shared, "delete")?;
            let resource_id = resource_id_for(shared, handle).await?;
            shared.source.delete_record(&resource_id).await?;
            Ok(Outcome::Done)
        }
    }
}

/// Update/delete are a deliberate scope limitation of the mirrored mode;
/// they fail fast before any remote call.
fn deny_under_local_cache(shared: &Shared, operation: &str) -> Result<()> {
    if shared.mode == CacheMode::LocalCache {
        return Err(Error::unsupported_operation(format!(
            "{operation} is not supported under LocalCache mode"
        )));
    }
    Ok(())
}

async fn resource_id_for(shared: &Arc<Shared>, handle: Handle) -> Result<ResourceId> {
    shared
        .op(|tx| Op::ResolveResourceId { handle, tx })
        .await?
        .ok_or_else(|| Error::not_found(format!("{handle:?} was not issued by this store")))
}

/// Translates handle-valued relationships into resource ids, checking each
/// handle against the declared destination entity and cardinality.
async fn resolve_relationships(
    shared: &Arc<Shared>,
    entity: EntityId,
    relationships: Relations,
) -> Result<Relationships> {
    let descriptor = shared.schema.entity(entity);

    let mut resolved = Relationships::new();
    for (name, related) in relationships {
        let Some(relation) = descriptor.relation_by_name(&name) else {
            bail!("unknown relationship `{name}` on entity `{}`", descriptor.name);
        };

        let value = match (relation.cardinality, related) {
            (Cardinality::ToOne, Related::One(handle)) => {
                RelationValue::One(related_resource_id(shared, relation.target, handle).await?)
            }
            (Cardinality::ToMany, Related::Many(handles)) => {
                let mut ids = Vec::with_capacity(handles.len());
                for handle in handles {
                    ids.push(related_resource_id(shared, relation.target, handle).await?);
                }
                RelationValue::Many(ids)
            }
            (Cardinality::ToOne, Related::Many(_)) => {
                bail!("relationship `{name}` is to-one but a list was supplied");
            }
            (Cardinality::ToMany, Related::One(_)) => {
                bail!("relationship `{name}` is to-many and expects a list");
            }
        };
        resolved.insert(name, value);
    }
    Ok(resolved)
}

async fn related_resource_id(
    shared: &Arc<Shared>,
    target: EntityId,
    handle: Handle,
) -> Result<ResourceId> {
    if handle.entity() != target {
        bail!(
            "related {handle:?} does not belong to destination entity `{}`",
            shared.schema.entity(target).name
        );
    }

    shared
        .op(|tx| Op::ResolveResourceId { handle, tx })
        .await?
        .ok_or_else(|| {
            Error::unresolved_relationship(format!("{handle:?} has no known resource id"))
        })
}
