//! Stored entity shapes: ids and the `{metadata, entity}` record pair.


use cfstore_schema::node::EntityKind;
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{borrow::Borrow, collections::BTreeMap};

/// A JSON object, as held in either half of an [`EntityRecord`].
pub type Fields = Map<String, Value>;

/// Records of one kind, by id.
pub type KindMap = BTreeMap<Guid, EntityRecord>;

/// Records of every kind.
pub type EntityMap = BTreeMap<EntityKind, KindMap>;

///
/// Guid
///
/// Unique id of one entity within its kind.
///

#[derive(
    Clone, Debug, Deserialize, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct Guid(String);

impl Guid {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Guid {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Guid {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

///
/// EntityRecord
///
/// One cached entity. Relation fields inside `entity` hold target ids
/// (or arrays of ids) once normalized.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EntityRecord {
    #[serde(default)]
    pub metadata: Fields,

    #[serde(default)]
    pub entity: Fields,
}

impl EntityRecord {
    #[must_use]
    pub const fn new(metadata: Fields, entity: Fields) -> Self {
        Self { metadata, entity }
    }

    /// Record for a bare object: everything lives under `entity`.
    #[must_use]
    pub fn bare(entity: Fields) -> Self {
        Self::new(Fields::new(), entity)
    }

    /// Resolve a sort/filter field path.
    ///
    /// `metadata.x` and `entity.x` address a section explicitly; any other
    /// dotted path walks the `entity` object.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let (root, rest) = match path.split_once('.') {
            Some(("metadata", rest)) => (&self.metadata, rest),
            Some(("entity", rest)) => (&self.entity, rest),
            _ => (&self.entity, path),
        };

        let mut segments = rest.split('.');
        let first = segments.next()?;
        let mut current = root.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }

        Some(current)
    }

    /// Shallow overlay: incoming fields win, absent fields are kept.
    pub fn overlay(&mut self, other: &Self) {
        overlay_fields(&mut self.metadata, &other.metadata);
        overlay_fields(&mut self.entity, &other.entity);
    }

    /// Raw `{metadata, entity}` form, or the bare entity when there is no
    /// metadata to carry.
    #[must_use]
    pub fn to_raw(&self) -> Value {
        if self.metadata.is_empty() {
            return Value::Object(self.entity.clone());
        }

        let mut raw = Fields::new();
        raw.insert("metadata".to_string(), Value::Object(self.metadata.clone()));
        raw.insert("entity".to_string(), Value::Object(self.entity.clone()));

        Value::Object(raw)
    }
}

pub(crate) fn overlay_fields(target: &mut Fields, incoming: &Fields) {
    for (field, value) in incoming {
        target.insert(field.clone(), value.clone());
    }
}
