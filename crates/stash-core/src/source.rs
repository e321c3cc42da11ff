use crate::{
    async_trait,
    stmt::{Predicate, ResourceId, SortKey, ValueMap},
    Error, Result,
};

use indexmap::IndexMap;
use std::fmt::Debug;

/// A batch of records as returned by a backend, keyed by resource id.
pub type Records = IndexMap<ResourceId, ValueMap>;

/// Relationship payload for saves and relationship resolution, expressed in
/// resource ids.
pub type Relationships = IndexMap<String, RelationValue>;

/// The destination(s) of a relationship, by resource id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationValue {
    One(ResourceId),
    Many(Vec<ResourceId>),
}

impl RelationValue {
    pub fn resource_ids(&self) -> &[ResourceId] {
        match self {
            Self::One(id) => std::slice::from_ref(id),
            Self::Many(ids) => ids,
        }
    }
}

/// The pluggable remote record source.
///
/// Implementations may block on network I/O; they are always invoked off the
/// merge context and must not assume access to the identity cache or the
/// durable mirror. Predicates arriving here contain no handle operands.
#[async_trait]
pub trait RemoteSource: Debug + Send + Sync + 'static {
    /// Fetch full records matching the predicate.
    async fn fetch_records(
        &self,
        entity: &str,
        predicate: &Predicate,
        sort: &[SortKey],
    ) -> Result<Records>;

    /// Id-only fetch variant, used when values are resolved separately.
    async fn fetch_record_ids(
        &self,
        entity: &str,
        predicate: &Predicate,
        sort: &[SortKey],
    ) -> Result<Vec<ResourceId>>;

    /// Persist a new record.
    async fn save_record(
        &self,
        resource_id: &ResourceId,
        attributes: &ValueMap,
        relationships: &Relationships,
    ) -> Result<()>;

    /// Overwrite an existing record.
    async fn update_record(
        &self,
        resource_id: &ResourceId,
        attributes: &ValueMap,
        relationships: &Relationships,
    ) -> Result<()>;

    /// Delete an existing record.
    async fn delete_record(&self, resource_id: &ResourceId) -> Result<()>;

    /// Allocate a resource id for a record that has not been persisted yet.
    async fn new_resource_id(&self, entity: &str) -> Result<ResourceId>;

    /// Resolve a relationship of an existing record to destination resource
    /// ids.
    async fn resolve_relationship(
        &self,
        resource_id: &ResourceId,
        relationship: &str,
    ) -> Result<RelationValue>;

    /// Parse a source-specific textual predicate into the typed grammar.
    fn translate_predicate(&self, text: &str) -> Result<Predicate> {
        Err(Error::unsupported_predicate_shape(format!(
            "this remote source does not parse predicate text; text={text:?}"
        )))
    }

    /// Notification name announced when background-fetched records land.
    fn fetch_notification(&self) -> &str {
        "stash.records-received"
    }

    /// Payload key under which newly created handles are announced.
    fn new_objects_key(&self) -> &str {
        "newObjects"
    }
}
