use crate::{
    merge,
    notify::Notification,
    store::{CacheMode, Shared, Store},
};

use stash_core::{bail, mirror::Mirror, schema::Schema, source::RemoteSource, Result};

use std::sync::Arc;
use tokio::sync::broadcast;

/// Notification channel depth. Slow subscribers that lag past this many
/// notifications observe a `Lagged` error rather than blocking the merge
/// context.
const NOTIFICATION_CAPACITY: usize = 64;

/// Configures and builds a [`Store`].
///
/// The full configuration surface: cache mode, store identifier, entity
/// schema, the remote source, and (for LocalCache mode) the durable mirror.
#[derive(Default)]
pub struct Builder {
    mode: CacheMode,
    store_id: Option<String>,
    schema: Option<Schema>,
    source: Option<Arc<dyn RemoteSource>>,
    mirror: Option<Box<dyn Mirror>>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_mode(&mut self, mode: CacheMode) -> &mut Self {
        self.mode = mode;
        self
    }

    /// Namespaces the durable file; defaults to `"stash"`.
    pub fn store_id(&mut self, store_id: impl Into<String>) -> &mut Self {
        self.store_id = Some(store_id.into());
        self
    }

    pub fn schema(&mut self, schema: Schema) -> &mut Self {
        self.schema = Some(schema);
        self
    }

    pub fn source(&mut self, source: impl RemoteSource) -> &mut Self {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn mirror(&mut self, mirror: impl Mirror) -> &mut Self {
        self.mirror = Some(Box::new(mirror));
        self
    }

    /// Validates the configuration, registers the schema with the mirror,
    /// and spawns the merge context.
    pub async fn build(&mut self) -> Result<Store> {
        let Some(schema) = self.schema.take() else {
            bail!("store requires an entity schema");
        };
        let Some(source) = self.source.take() else {
            bail!("store requires a remote source");
        };
        let mut mirror = self.mirror.take();
        let mode = self.mode;
        let store_id = self.store_id.take().unwrap_or_else(|| "stash".to_string());

        if mode == CacheMode::LocalCache && mirror.is_none() {
            bail!("LocalCache mode requires a durable mirror");
        }

        let schema = Arc::new(schema);
        if let Some(mirror) = &mut mirror {
            mirror.register_schema(&schema).await?;
        }

        let (notifications, _) = broadcast::channel::<Notification>(NOTIFICATION_CAPACITY);

        let ops = merge::spawn(
            schema.clone(),
            mirror,
            notifications.clone(),
            source.fetch_notification().to_string(),
            source.new_objects_key().to_string(),
        );

        Ok(Store::new(Shared {
            schema,
            source,
            mode,
            store_id,
            ops,
            notifications,
        }))
    }
}
