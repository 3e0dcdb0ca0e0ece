use crate::prelude::*;

///
/// EntitySchema
///
/// Static description of one entity kind: its unique key and the relations
/// that may arrive embedded in a raw response.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct EntitySchema {
    pub kind: EntityKind,
    pub key: KeyPath,

    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub relations: &'static [Relation],
}

impl EntitySchema {
    /// Schema keyed by `metadata.guid`, the Cloud Foundry default.
    #[must_use]
    pub const fn resource(kind: &'static str, relations: &'static [Relation]) -> Self {
        Self {
            kind: EntityKind::from_static(kind),
            key: KeyPath::METADATA_GUID,
            relations,
        }
    }

    #[must_use]
    pub const fn with_key(mut self, key: KeyPath) -> Self {
        self.key = key;
        self
    }

    /// Look up a relation by its field name.
    #[must_use]
    pub fn relation(&self, field: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.field == field)
    }
}
