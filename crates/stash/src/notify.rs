use stash_core::{schema::EntityId, stmt::Handle};

/// Announcement of a completed background refresh.
///
/// Emitted from the merge context only, strictly after the corresponding
/// durable write succeeded, so an observer reacting to one is guaranteed
/// the mirror already reflects the data. `new_handles` is the merge delta:
/// handles that did not exist before the batch landed.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Notification name, as announced by the remote source.
    pub name: String,

    /// Payload key for the new-object list, as announced by the remote
    /// source.
    pub key: String,

    /// The entity the batch belonged to.
    pub entity: EntityId,

    /// Handles created by this merge. Existing records that were refreshed
    /// are not listed.
    pub new_handles: Vec<Handle>,
}
