mod fetch;
pub(crate) use fetch::Fetch;

mod save;
pub(crate) use save::Save;

use crate::store::Shared;

use stash_core::{stmt::Handle, Result};

use std::sync::Arc;

/// A client request, dispatched by kind.
pub(crate) enum Request {
    Fetch(Fetch),
    Save(Save),
}

pub(crate) enum Outcome {
    /// Handles for every record the fetch returned.
    Handles(Vec<Handle>),

    /// The handle registered for an inserted record.
    Inserted(Handle),

    /// Update/delete completion.
    Done,
}

pub(crate) async fn exec(shared: &Arc<Shared>, request: Request) -> Result<Outcome> {
    match request {
        Request::Fetch(fetch) => fetch::exec(shared, fetch).await.map(Outcome::Handles),
        Request::Save(save) => save::exec(shared, save).await,
    }
}

impl Outcome {
    #[track_caller]
    pub(crate) fn into_handles(self) -> Vec<Handle> {
        match self {
            Self::Handles(handles) => handles,
            _ => panic!("fetch request produced a non-fetch outcome"),
        }
    }

    #[track_caller]
    pub(crate) fn into_inserted(self) -> Handle {
        match self {
            Self::Inserted(handle) => handle,
            _ => panic!("insert request produced a non-insert outcome"),
        }
    }
}
