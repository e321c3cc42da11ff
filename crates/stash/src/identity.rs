use stash_core::{
    schema::EntityId,
    stmt::{Handle, ResourceId, ValueMap},
    Error, Result,
};

use std::collections::HashMap;

/// The in-memory identity map: (entity, resource id) ⇄ handle, plus the
/// current value map per handle.
///
/// No interior locking; the merge context is the only owner. Both maps grow
/// without bound: handles are stable for the process lifetime, which rules
/// out evicting the identity mapping, and value maps are kept alongside.
#[derive(Debug, Default)]
pub(crate) struct IdentityCache {
    /// (entity, resource id) -> handle
    handles: HashMap<(EntityId, ResourceId), Handle>,

    /// Inverse mapping; total over issued handles.
    resources: HashMap<Handle, ResourceId>,

    /// Current field values, populated by merges only.
    values: HashMap<Handle, ValueMap>,

    /// Next handle slot. Slots are never reused.
    next_slot: u64,
}

impl IdentityCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lookup_handle(
        &self,
        entity: EntityId,
        resource_id: &ResourceId,
    ) -> Option<Handle> {
        self.handles.get(&(entity, resource_id.clone())).copied()
    }

    /// Returns the existing handle for (entity, resource id) or allocates
    /// one. The boolean is true if the handle was created by this call.
    pub(crate) fn ensure_handle(
        &mut self,
        entity: EntityId,
        resource_id: &ResourceId,
    ) -> (Handle, bool) {
        if let Some(handle) = self.lookup_handle(entity, resource_id) {
            return (handle, false);
        }

        let handle = Handle::new(entity, self.next_slot);
        self.next_slot += 1;
        self.handles.insert((entity, resource_id.clone()), handle);
        self.resources.insert(handle, resource_id.clone());
        (handle, true)
    }

    /// The resource id governing a handle. None for handles this cache did
    /// not issue.
    pub(crate) fn resource_id(&self, handle: Handle) -> Option<&ResourceId> {
        self.resources.get(&handle)
    }

    /// Full-replace value merge; overwrites any previous map.
    pub(crate) fn put_values(&mut self, handle: Handle, values: ValueMap) {
        self.values.insert(handle, values);
    }

    /// The current value map for a merged handle.
    ///
    /// A handle that was issued but never merged is a caller bug and fails
    /// with `NotFound`.
    pub(crate) fn values(&self, handle: Handle) -> Result<&ValueMap> {
        self.values
            .get(&handle)
            .ok_or_else(|| Error::not_found(format!("no merged values for {handle:?}")))
    }
}
