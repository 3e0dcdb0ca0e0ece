use derive_more::{Display, FromStr};
use serde::{Deserialize, Serialize};

///
/// Cardinality
///
/// How many targets a relation field holds in a raw response.
///

#[derive(Clone, Copy, Default, Debug, Deserialize, Display, Eq, FromStr, PartialEq, Serialize)]
pub enum Cardinality {
    #[default]
    One,
    Opt,
    Many,
}

impl Cardinality {
    #[must_use]
    pub const fn is_many(self) -> bool {
        matches!(self, Self::Many)
    }
}

///
/// KeyPath
///
/// Location of an object's unique key. Cloud Foundry resources carry it in
/// `metadata.guid`; bare embedded objects carry it directly on the entity.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum KeyPath {
    Entity(&'static str),
    Metadata(&'static str),
}

impl KeyPath {
    /// `metadata.guid`, the key every v2 API resource carries.
    pub const METADATA_GUID: Self = Self::Metadata("guid");

    /// `entity.guid`, used by bare embedded objects.
    pub const ENTITY_GUID: Self = Self::Entity("guid");

    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::Entity(field) | Self::Metadata(field) => field,
        }
    }

    #[must_use]
    pub const fn section(self) -> &'static str {
        match self {
            Self::Entity(_) => "entity",
            Self::Metadata(_) => "metadata",
        }
    }
}

impl std::fmt::Display for KeyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.section(), self.field())
    }
}
