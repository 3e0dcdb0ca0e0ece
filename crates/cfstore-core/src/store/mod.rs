//! Module: store
//! Responsibility: the normalized entity cache and its merge rules.
//! Does not own: request state, pagination, or event routing.

#[cfg(test)]
mod tests;

use crate::{
    model::{EntityMap, EntityRecord, Fields, Guid, KindMap, overlay_fields},
    normalize::NormalizedResponse,
};
use cfstore_schema::node::EntityKind;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;

///
/// MergeMode
///
/// `Patch` overlays incoming fields and keeps the rest. `Replace` swaps the
/// whole `entity` object of each top-level result; canonical GET-by-id
/// responses use it.
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
pub enum MergeMode {
    #[default]
    Patch,
    Replace,
}

///
/// MergeStats
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MergeStats {
    pub inserted: u64,
    pub updated: u64,
}

///
/// EntityStore
///
/// Kind → id → record. Merges are last-write-wins at the field level; two
/// responses for the same id land in completion order.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EntityStore {
    kinds: EntityMap,
}

impl EntityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn as_map(&self) -> &EntityMap {
        &self.kinds
    }

    #[must_use]
    pub fn get(&self, kind: &str, id: &str) -> Option<&EntityRecord> {
        self.kinds.get(kind)?.get(id)
    }

    #[must_use]
    pub fn contains(&self, kind: &str, id: &str) -> bool {
        self.get(kind, id).is_some()
    }

    #[must_use]
    pub fn kind(&self, kind: &str) -> Option<&KindMap> {
        self.kinds.get(kind)
    }

    /// Number of records across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.values().map(KindMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.values().all(KindMap::is_empty)
    }

    /// Merge a normalized response, consuming and returning the store.
    #[must_use]
    pub fn merge(mut self, response: &NormalizedResponse, mode: MergeMode) -> Self {
        self.merge_in_place(response, mode);
        self
    }

    /// Merge a normalized response.
    ///
    /// `Replace` only applies to the response's top-level ids of its own
    /// kind; embedded entities are partial views and always patch.
    pub fn merge_in_place(&mut self, response: &NormalizedResponse, mode: MergeMode) -> MergeStats {
        let mut stats = MergeStats::default();

        for (kind, incoming) in &response.entities {
            let bucket = self.kinds.entry(kind.clone()).or_default();
            for (id, record) in incoming {
                let replace = mode == MergeMode::Replace
                    && *kind == response.kind
                    && response.result.contains(id);

                match bucket.entry(id.clone()) {
                    Entry::Vacant(slot) => {
                        slot.insert(record.clone());
                        stats.inserted += 1;
                    }
                    Entry::Occupied(mut slot) => {
                        let existing = slot.get_mut();
                        if replace {
                            existing.entity.clone_from(&record.entity);
                            overlay_fields(&mut existing.metadata, &record.metadata);
                        } else {
                            existing.overlay(record);
                        }
                        stats.updated += 1;
                    }
                }
            }
        }

        stats
    }

    /// Overlay `fields` onto one entity's `entity` object.
    ///
    /// Returns `false` when the entity is not cached.
    pub fn patch(&mut self, kind: &str, id: &str, fields: &Fields) -> bool {
        let Some(record) = self.kinds.get_mut(kind).and_then(|bucket| bucket.get_mut(id)) else {
            return false;
        };
        overlay_fields(&mut record.entity, fields);

        true
    }

    pub fn insert(&mut self, kind: EntityKind, id: Guid, record: EntityRecord) {
        self.kinds.entry(kind).or_default().insert(id, record);
    }

    /// Mutable access for relation-collection edits.
    pub(crate) fn get_mut(&mut self, kind: &str, id: &str) -> Option<&mut EntityRecord> {
        self.kinds.get_mut(kind)?.get_mut(id)
    }

    pub fn remove(&mut self, kind: &str, id: &str) -> Option<EntityRecord> {
        let bucket = self.kinds.get_mut(kind)?;
        let removed = bucket.remove(id);
        if bucket.is_empty() {
            self.kinds.remove(kind);
        }

        removed
    }
}
