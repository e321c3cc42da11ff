use crate::{merge::Op, store::Shared, CacheMode};

use stash_core::{
    schema::EntityId,
    stmt::{Handle, Predicate, SortKey},
    Result,
};

use std::sync::Arc;
use tracing::warn;

/// A fetch request: entity, predicate (possibly holding handle operands),
/// and sort order.
pub(crate) struct Fetch {
    pub(crate) entity: EntityId,
    pub(crate) predicate: Predicate,
    pub(crate) sort: Vec<SortKey>,

    /// Use the remote source's id-only variant and register handles without
    /// value maps.
    pub(crate) ids_only: bool,
}

/// Runs a fetch through translation, dispatch, and merge.
///
/// NoCache dispatches to the remote source synchronously. LocalCache
/// answers from the durable mirror at once and schedules a background
/// remote refresh whose batch lands via the merge context (write-through,
/// then cache, then notification).
pub(crate) async fn exec(shared: &Arc<Shared>, fetch: Fetch) -> Result<Vec<Handle>> {
    let entity = fetch.entity;
    let entity_name = shared.schema.entity(entity).name.clone();

    let predicate = shared
        .op(|tx| Op::Translate {
            predicate: fetch.predicate,
            tx,
        })
        .await??;

    if fetch.ids_only {
        let resource_ids = shared
            .source
            .fetch_record_ids(&entity_name, &predicate, &fetch.sort)
            .await?;
        return shared
            .op(|tx| Op::EnsureHandles {
                entity,
                resource_ids,
                tx,
            })
            .await;
    }

    match shared.mode {
        CacheMode::NoCache => {
            let records = shared
                .source
                .fetch_records(&entity_name, &predicate, &fetch.sort)
                .await?;
            shared
                .op(|tx| Op::MergeRecords {
                    entity,
                    records,
                    write_mirror: false,
                    notify: false,
                    tx: Some(tx),
                })
                .await?
        }
        CacheMode::LocalCache => {
            // Answer from the durable snapshot without waiting on the
            // network, then refresh in the background.
            let handles = shared
                .op(|tx| Op::QueryMirror {
                    entity,
                    predicate: predicate.clone(),
                    sort: fetch.sort.clone(),
                    tx,
                })
                .await??;

            let shared = shared.clone();
            tokio::spawn(async move {
                match shared
                    .source
                    .fetch_records(&entity_name, &predicate, &fetch.sort)
                    .await
                {
                    Ok(records) => {
                        let _ = shared.ops.send(Op::MergeRecords {
                            entity,
                            records,
                            write_mirror: true,
                            notify: true,
                            tx: None,
                        });
                    }
                    Err(err) => {
                        // Dropped refresh attempt; the snapshot already
                        // returned stays the latest usable data.
                        warn!(entity = %entity_name, %err, "background fetch failed");
                    }
                }
            });

            Ok(handles)
        }
    }
}
