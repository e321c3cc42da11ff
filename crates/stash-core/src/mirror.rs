use crate::{
    async_trait,
    schema::{EntityId, Schema},
    source::Records,
    stmt::{Predicate, ResourceId, SortKey},
    Result,
};

use std::fmt::Debug;

/// The optional durable on-disk store backing staged fetches.
///
/// Holds the same entities as the identity cache plus an internal
/// resource-id column, so a staged fetch can answer immediately from the
/// last durable snapshot while a remote refresh runs. Mutated only from the
/// merge context.
#[async_trait]
pub trait Mirror: Debug + Send + Sync + 'static {
    /// Register the entity schema with the mirror, creating durable storage
    /// as needed.
    async fn register_schema(&mut self, schema: &Schema) -> Result<()>;

    /// Query durable storage only. Predicates contain no handle operands.
    async fn query(
        &self,
        schema: &Schema,
        entity: EntityId,
        predicate: &Predicate,
        sort: &[SortKey],
    ) -> Result<Records>;

    /// Existence check by resource id.
    async fn exists(
        &self,
        schema: &Schema,
        entity: EntityId,
        resource_id: &ResourceId,
    ) -> Result<bool>;

    /// Merge a record batch in a single durable transaction.
    ///
    /// Records already present are overwritten in full (filling stub rows);
    /// relationship references to unseen resource ids materialize as stub
    /// rows in the destination entity. Either the whole batch commits or
    /// none of it does; a failed commit surfaces as `DurableWriteFailed`.
    async fn merge(&self, schema: &Schema, entity: EntityId, records: &Records) -> Result<()>;
}
