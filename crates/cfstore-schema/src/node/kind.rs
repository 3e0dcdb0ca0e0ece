use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};

///
/// EntityKind
///
/// Schema key naming one category of entities. Every kind owns a separate id
/// namespace in the store.
///

#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct EntityKind(Cow<'static, str>);

impl EntityKind {
    /// Build a kind from a static name; usable in `const` schema tables.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EntityKind {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for EntityKind {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for EntityKind {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}
