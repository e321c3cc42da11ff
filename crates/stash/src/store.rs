use crate::{
    engine::{self, Fetch, Request, Save},
    merge::Op,
    notify::Notification,
    Builder,
};

use stash_core::{
    bail, err,
    schema::Schema,
    source::RemoteSource,
    stmt::{Handle, Predicate, ResourceId, SortKey, ValueMap},
    Error, Result,
};

use indexmap::IndexMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Whether fetches are served synchronously from the remote source or
/// staged through the durable mirror.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum CacheMode {
    /// Every fetch goes to the remote source and blocks on it.
    #[default]
    NoCache,

    /// Fetches answer immediately from the durable mirror while a remote
    /// refresh runs in the background. Update/delete are unsupported in
    /// this mode.
    LocalCache,
}

/// Handle-valued relationship payload for inserts and updates.
#[derive(Debug, Clone)]
pub enum Related {
    One(Handle),
    Many(Vec<Handle>),
}

/// Relationships of a record being saved, keyed by relationship name.
pub type Relations = IndexMap<String, Related>;

/// State shared between all `Store` clones and background tasks.
pub(crate) struct Shared {
    pub(crate) schema: Arc<Schema>,
    pub(crate) source: Arc<dyn RemoteSource>,
    pub(crate) mode: CacheMode,
    pub(crate) store_id: String,

    /// Request channel into the merge context, the sole writer of the
    /// identity cache and the durable mirror.
    pub(crate) ops: mpsc::UnboundedSender<Op>,

    pub(crate) notifications: broadcast::Sender<Notification>,
}

/// A handle to the identity-mapping cache.
///
/// Callers query and mutate domain objects by opaque [`Handle`]s; the real
/// values live in the pluggable remote source and, in LocalCache mode, a
/// durable on-disk mirror kept in sync by the engine.
#[derive(Clone)]
pub struct Store {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("mode", &self.shared.mode)
            .field("store_id", &self.shared.store_id)
            .finish_non_exhaustive()
    }
}

impl Shared {
    /// Sends one request to the merge context and awaits its reply.
    pub(crate) async fn op<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Op) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.ops
            .send(make(tx))
            .map_err(|_| err!("merge context terminated"))?;
        rx.await.map_err(|_| err!("merge context terminated"))
    }
}

impl Store {
    pub fn builder() -> Builder {
        Builder::new()
    }

    pub(crate) fn new(shared: Shared) -> Self {
        Self {
            shared: Arc::new(shared),
        }
    }

    pub fn mode(&self) -> CacheMode {
        self.shared.mode
    }

    pub fn store_id(&self) -> &str {
        &self.shared.store_id
    }

    pub fn schema(&self) -> &Schema {
        &self.shared.schema
    }

    /// Subscribes to background-refresh notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.shared.notifications.subscribe()
    }

    /// Fetches records of `entity` matching `predicate`.
    ///
    /// Returns handles for the full record set this call observed. In
    /// LocalCache mode that is the durable snapshot; the remote refresh
    /// lands later and is announced via [`Store::subscribe`].
    pub async fn fetch(
        &self,
        entity: &str,
        predicate: Predicate,
        sort: Vec<SortKey>,
    ) -> Result<Vec<Handle>> {
        let entity = self.shared.schema.expect_entity(entity)?.id;
        let request = Request::Fetch(Fetch {
            entity,
            predicate,
            sort,
            ids_only: false,
        });
        Ok(engine::exec(&self.shared, request).await?.into_handles())
    }

    /// Id-only fetch: registers handles without populating value maps.
    pub async fn fetch_ids(
        &self,
        entity: &str,
        predicate: Predicate,
        sort: Vec<SortKey>,
    ) -> Result<Vec<Handle>> {
        let entity = self.shared.schema.expect_entity(entity)?.id;
        let request = Request::Fetch(Fetch {
            entity,
            predicate,
            sort,
            ids_only: true,
        });
        Ok(engine::exec(&self.shared, request).await?.into_handles())
    }

    /// Fetches using a source-specific textual predicate, parsed by the
    /// remote source itself.
    pub async fn fetch_text(
        &self,
        entity: &str,
        predicate: &str,
        sort: Vec<SortKey>,
    ) -> Result<Vec<Handle>> {
        let predicate = self.shared.source.translate_predicate(predicate)?;
        self.fetch(entity, predicate, sort).await
    }

    /// The current value map for a merged handle.
    pub async fn values(&self, handle: Handle) -> Result<ValueMap> {
        self.shared.op(|tx| Op::Values { handle, tx }).await?
    }

    /// Resolves a relationship of `handle` to destination handles.
    ///
    /// Resolution is lazy: cached resource ids are used when the value map
    /// holds them; otherwise the remote source's relationship resolution is
    /// consulted on this first access.
    pub async fn related(&self, handle: Handle, relation: &str) -> Result<Vec<Handle>> {
        let entity = self.shared.schema.entity(handle.entity());
        let Some(relation) = entity.relation_by_name(relation) else {
            bail!("unknown relationship `{relation}` on entity `{}`", entity.name);
        };

        let resource_ids = match self.shared.op(|tx| Op::Values { handle, tx }).await? {
            Ok(values) => match values.get(&relation.name) {
                Some(value) => value.to_resource_ids()?,
                None => self.resolve_remote(handle, &relation.name).await?,
            },
            Err(err) if err.is_not_found() => self.resolve_remote(handle, &relation.name).await?,
            Err(err) => return Err(err),
        };

        self.shared
            .op(|tx| Op::EnsureHandles {
                entity: relation.target,
                resource_ids,
                tx,
            })
            .await
    }

    async fn resolve_remote(&self, handle: Handle, relation: &str) -> Result<Vec<ResourceId>> {
        let resource_id = self
            .shared
            .op(|tx| Op::ResolveResourceId { handle, tx })
            .await?
            .ok_or_else(|| {
                Error::not_found(format!("{handle:?} was not issued by this store"))
            })?;

        let value = self
            .shared
            .source
            .resolve_relationship(&resource_id, relation)
            .await?;
        Ok(value.resource_ids().to_vec())
    }

    /// Inserts a new record and returns its handle.
    ///
    /// The handle is registered against a freshly allocated resource id
    /// before the remote write is issued, so it is stable immediately.
    pub async fn insert(
        &self,
        entity: &str,
        attributes: ValueMap,
        relationships: Relations,
    ) -> Result<Handle> {
        let entity = self.shared.schema.expect_entity(entity)?.id;
        let request = Request::Save(Save::Insert {
            entity,
            attributes,
            relationships,
        });
        Ok(engine::exec(&self.shared, request).await?.into_inserted())
    }

    /// Overwrites an existing record. Unsupported under LocalCache mode.
    pub async fn update(
        &self,
        handle: Handle,
        attributes: ValueMap,
        relationships: Relations,
    ) -> Result<()> {
        let request = Request::Save(Save::Update {
            handle,
            attributes,
            relationships,
        });
        engine::exec(&self.shared, request).await?;
        Ok(())
    }

    /// Deletes an existing record. Unsupported under LocalCache mode.
    pub async fn delete(&self, handle: Handle) -> Result<()> {
        let request = Request::Save(Save::Delete { handle });
        engine::exec(&self.shared, request).await?;
        Ok(())
    }
}
