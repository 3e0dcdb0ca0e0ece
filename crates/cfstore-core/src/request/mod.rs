//! Module: request
//! Responsibility: per-entity fetch/create/update/delete lifecycle flags.
//! Does not own: the cached entity data itself.
//!
//! An entity has no request entry until some operation touches it; `None`
//! from [`RequestTracker::get`] means "never requested".


use crate::model::Guid;
use cfstore_schema::node::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// ActionState
///
/// Busy/error flags of one named update operation.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionState {
    pub busy: bool,
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionState {
    fn start(&mut self) {
        self.busy = true;
        self.error = false;
        self.message = None;
    }

    fn end(&mut self, error: Option<&str>) {
        self.busy = false;
        self.error = error.is_some();
        self.message = error.map(str::to_string);
    }
}

///
/// DeleteState
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DeleteState {
    pub busy: bool,
    pub error: bool,
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

///
/// RequestInfo
///
/// Fetch and create share the top-level `error`/`message` pair; each named
/// update and the delete carry their own.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RequestInfo {
    pub fetching: bool,
    pub creating: bool,
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub deleting: DeleteState,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub updating: BTreeMap<String, ActionState>,
}

impl RequestInfo {
    /// Whether any operation on this entity is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.fetching
            || self.creating
            || self.deleting.busy
            || self.updating.values().any(|state| state.busy)
    }

    #[must_use]
    pub fn update(&self, operation: &str) -> Option<&ActionState> {
        self.updating.get(operation)
    }

    fn set_outcome(&mut self, error: Option<&str>) {
        self.error = error.is_some();
        self.message = error.map(str::to_string);
    }
}

///
/// RequestTracker
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RequestTracker {
    entries: BTreeMap<EntityKind, BTreeMap<Guid, RequestInfo>>,
}

impl RequestTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, kind: &str, id: &str) -> Option<&RequestInfo> {
        self.entries.get(kind)?.get(id)
    }

    #[must_use]
    pub fn is_busy(&self, kind: &str, id: &str) -> bool {
        self.get(kind, id).is_some_and(RequestInfo::is_busy)
    }

    pub fn start_fetch(&mut self, kind: &EntityKind, id: &Guid) {
        let info = self.entry(kind, id);
        info.fetching = true;
        info.set_outcome(None);
    }

    pub fn end_fetch(&mut self, kind: &EntityKind, id: &Guid, error: Option<&str>) {
        let info = self.entry(kind, id);
        info.fetching = false;
        info.set_outcome(error);
    }

    /// Start a create. An id recreated after a delete is no longer `deleted`.
    pub fn start_create(&mut self, kind: &EntityKind, id: &Guid) {
        let info = self.entry(kind, id);
        info.creating = true;
        info.deleting.deleted = false;
        info.set_outcome(None);
    }

    pub fn end_create(&mut self, kind: &EntityKind, id: &Guid, error: Option<&str>) {
        let info = self.entry(kind, id);
        info.creating = false;
        info.set_outcome(error);
    }

    /// Mark the named update busy. Other named updates are untouched.
    pub fn start_update(&mut self, kind: &EntityKind, id: &Guid, operation: &str) {
        self.entry(kind, id)
            .updating
            .entry(operation.to_string())
            .or_default()
            .start();
    }

    pub fn end_update(&mut self, kind: &EntityKind, id: &Guid, operation: &str, error: Option<&str>) {
        self.entry(kind, id)
            .updating
            .entry(operation.to_string())
            .or_default()
            .end(error);
    }

    pub fn start_delete(&mut self, kind: &EntityKind, id: &Guid) {
        let deleting = &mut self.entry(kind, id).deleting;
        deleting.busy = true;
        deleting.error = false;
        deleting.deleted = false;
        deleting.message = None;
    }

    /// End a delete; success marks the entity `deleted`.
    pub fn end_delete(&mut self, kind: &EntityKind, id: &Guid, error: Option<&str>) {
        let deleting = &mut self.entry(kind, id).deleting;
        deleting.busy = false;
        deleting.error = error.is_some();
        deleting.deleted = error.is_none();
        deleting.message = error.map(str::to_string);
    }

    /// Drop all bookkeeping for one entity.
    pub fn remove(&mut self, kind: &str, id: &str) -> Option<RequestInfo> {
        let bucket = self.entries.get_mut(kind)?;
        let removed = bucket.remove(id);
        if bucket.is_empty() {
            self.entries.remove(kind);
        }

        removed
    }

    /// Ids of `kind` with at least one operation in flight.
    pub fn busy_ids<'a>(&'a self, kind: &str) -> impl Iterator<Item = &'a Guid> + 'a {
        self.entries
            .get(kind)
            .into_iter()
            .flat_map(BTreeMap::iter)
            .filter(|(_, info)| info.is_busy())
            .map(|(id, _)| id)
    }

    fn entry(&mut self, kind: &EntityKind, id: &Guid) -> &mut RequestInfo {
        self.entries
            .entry(kind.clone())
            .or_default()
            .entry(id.clone())
            .or_default()
    }
}
