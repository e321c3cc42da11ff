use crate::{identity::IdentityCache, notify::Notification, translate};

use stash_core::{
    bail,
    mirror::Mirror,
    schema::{EntityId, Schema},
    source::Records,
    stmt::{Handle, Predicate, ResourceId, SortKey, ValueMap},
    Result,
};

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, warn};

/// Requests handled by the merge context.
///
/// The merge context is the single designated writer of the identity cache
/// and the durable mirror; every read and mutation of either flows through
/// one of these messages. Remote source calls never appear here; workers
/// finish them first and hand over completed record batches.
pub(crate) enum Op {
    /// Rewrite handle operands in a predicate using the identity cache.
    Translate {
        predicate: Predicate,
        tx: oneshot::Sender<Result<Predicate>>,
    },

    /// Read the durable mirror and merge the snapshot into the identity
    /// cache, returning handles for every record in the snapshot.
    QueryMirror {
        entity: EntityId,
        predicate: Predicate,
        sort: Vec<SortKey>,
        tx: oneshot::Sender<Result<Vec<Handle>>>,
    },

    /// Merge a fetched record batch: optionally write through to the mirror
    /// first, then update the identity cache. With `notify`, a notification
    /// carrying the newly created handles is broadcast after the merge; a
    /// batch without a reply channel is a background completion.
    MergeRecords {
        entity: EntityId,
        records: Records,
        write_mirror: bool,
        notify: bool,
        tx: Option<oneshot::Sender<Result<Vec<Handle>>>>,
    },

    /// Bind a freshly allocated resource id to a handle ahead of the remote
    /// write completing.
    Register {
        entity: EntityId,
        resource_id: ResourceId,
        tx: oneshot::Sender<Handle>,
    },

    /// Ensure handles exist for a list of resource ids, without touching
    /// value maps.
    EnsureHandles {
        entity: EntityId,
        resource_ids: Vec<ResourceId>,
        tx: oneshot::Sender<Vec<Handle>>,
    },

    /// Snapshot of the current value map for a merged handle.
    Values {
        handle: Handle,
        tx: oneshot::Sender<Result<ValueMap>>,
    },

    /// The resource id governing a handle, if this cache issued it.
    ResolveResourceId {
        handle: Handle,
        tx: oneshot::Sender<Option<ResourceId>>,
    },
}

pub(crate) struct MergeContext {
    schema: Arc<Schema>,
    cache: IdentityCache,
    mirror: Option<Box<dyn Mirror>>,
    notifications: broadcast::Sender<Notification>,
    notification_name: String,
    new_objects_key: String,
}

/// Spawns the merge-context task and returns its request channel. The task
/// exits when every `Store` clone (and background fetch) has dropped its
/// sender.
pub(crate) fn spawn(
    schema: Arc<Schema>,
    mirror: Option<Box<dyn Mirror>>,
    notifications: broadcast::Sender<Notification>,
    notification_name: String,
    new_objects_key: String,
) -> mpsc::UnboundedSender<Op> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut context = MergeContext {
        schema,
        cache: IdentityCache::new(),
        mirror,
        notifications,
        notification_name,
        new_objects_key,
    };

    tokio::spawn(async move {
        while let Some(op) = rx.recv().await {
            context.handle(op).await;
        }
    });

    tx
}

impl MergeContext {
    async fn handle(&mut self, op: Op) {
        match op {
            Op::Translate { predicate, tx } => {
                let _ = tx.send(translate::translate(&predicate, &self.cache));
            }
            Op::QueryMirror {
                entity,
                predicate,
                sort,
                tx,
            } => {
                let _ = tx.send(self.query_mirror(entity, &predicate, &sort).await);
            }
            Op::MergeRecords {
                entity,
                records,
                write_mirror,
                notify,
                tx,
            } => {
                let result = self.merge_records(entity, &records, write_mirror).await;
                match (result, tx) {
                    (Ok((all, new)), tx) => {
                        if notify {
                            self.announce(entity, new);
                        }
                        if let Some(tx) = tx {
                            let _ = tx.send(Ok(all));
                        }
                    }
                    (Err(err), Some(tx)) => {
                        let _ = tx.send(Err(err));
                    }
                    (Err(err), None) => {
                        // Background completion: there is no pending call to
                        // report to. The durable snapshot stays as-is.
                        warn!(entity = entity.0, %err, "background merge failed");
                    }
                }
            }
            Op::Register {
                entity,
                resource_id,
                tx,
            } => {
                let (handle, _) = self.cache.ensure_handle(entity, &resource_id);
                let _ = tx.send(handle);
            }
            Op::EnsureHandles {
                entity,
                resource_ids,
                tx,
            } => {
                let handles = resource_ids
                    .iter()
                    .map(|resource_id| self.cache.ensure_handle(entity, resource_id).0)
                    .collect();
                let _ = tx.send(handles);
            }
            Op::Values { handle, tx } => {
                let _ = tx.send(self.cache.values(handle).cloned());
            }
            Op::ResolveResourceId { handle, tx } => {
                let _ = tx.send(self.cache.resource_id(handle).cloned());
            }
        }
    }

    async fn query_mirror(
        &mut self,
        entity: EntityId,
        predicate: &Predicate,
        sort: &[SortKey],
    ) -> Result<Vec<Handle>> {
        let Some(mirror) = &self.mirror else {
            bail!("no durable mirror configured");
        };

        let records = mirror.query(&self.schema, entity, predicate, sort).await?;
        debug!(entity = entity.0, records = records.len(), "mirror snapshot");

        let mut handles = Vec::with_capacity(records.len());
        for (resource_id, values) in &records {
            let (handle, _) = self.cache.ensure_handle(entity, resource_id);
            self.cache.put_values(handle, values.clone());
            handles.push(handle);
        }
        Ok(handles)
    }

    /// Applies a record batch: durable write first (when requested), then
    /// the in-memory merge. Returns all handles plus the created subset.
    async fn merge_records(
        &mut self,
        entity: EntityId,
        records: &Records,
        write_mirror: bool,
    ) -> Result<(Vec<Handle>, Vec<Handle>)> {
        if write_mirror {
            let Some(mirror) = &self.mirror else {
                bail!("no durable mirror configured");
            };
            mirror.merge(&self.schema, entity, records).await?;
        }

        let mut all = Vec::with_capacity(records.len());
        let mut new = vec![];
        for (resource_id, values) in records {
            let (handle, created) = self.cache.ensure_handle(entity, resource_id);
            self.cache.put_values(handle, values.clone());
            all.push(handle);
            if created {
                new.push(handle);
            }
        }
        debug!(
            entity = entity.0,
            merged = all.len(),
            created = new.len(),
            "merged record batch"
        );
        Ok((all, new))
    }

    fn announce(&self, entity: EntityId, new_handles: Vec<Handle>) {
        // Subscribers may come and go; an empty receiver set is not an
        // error.
        let _ = self.notifications.send(Notification {
            name: self.notification_name.clone(),
            key: self.new_objects_key.clone(),
            entity,
            new_handles,
        });
    }
}
