use crate::{Error, prelude::*, validate::validate_registry};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// RegistryError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum RegistryError {
    #[error("entity kind '{0}' is not registered")]
    UnknownKind(EntityKind),

    #[error("entity kind '{0}' already registered")]
    KindAlreadyRegistered(EntityKind),
}

///
/// SchemaRegistry
///
/// Lookup table from entity kind to schema. Built once, then read-only.
///

#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<EntityKind, EntitySchema>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a validated registry from a list of schemas.
    pub fn from_schemas(schemas: impl IntoIterator<Item = EntitySchema>) -> Result<Self, Error> {
        let mut registry = Self::new();
        for schema in schemas {
            registry.register(schema)?;
        }
        registry.validate().map_err(Error::Validation)?;

        Ok(registry)
    }

    /// Register one schema. Kinds are unique.
    pub fn register(&mut self, schema: EntitySchema) -> Result<(), RegistryError> {
        if self.schemas.contains_key(&schema.kind) {
            return Err(RegistryError::KindAlreadyRegistered(schema.kind));
        }
        self.schemas.insert(schema.kind.clone(), schema);

        Ok(())
    }

    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&EntitySchema> {
        self.schemas.get(kind)
    }

    pub fn try_get(&self, kind: &str) -> Result<&EntitySchema, RegistryError> {
        self.get(kind)
            .ok_or_else(|| RegistryError::UnknownKind(EntityKind::new(kind)))
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.schemas.contains_key(kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntitySchema> {
        self.schemas.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Check registry-wide invariants, reporting every failure.
    pub fn validate(&self) -> Result<(), ErrorTree> {
        validate_registry(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SPACE_RELATIONS: [Relation; 1] = [Relation::one("organization", "organization")];
    static ORGANIZATION_RELATIONS: [Relation; 1] = [Relation::many("spaces", "space")];

    fn space() -> EntitySchema {
        EntitySchema::resource("space", &SPACE_RELATIONS)
    }

    fn organization() -> EntitySchema {
        EntitySchema::resource("organization", &ORGANIZATION_RELATIONS)
    }

    #[test]
    fn register_rejects_duplicate_kind() {
        let mut registry = SchemaRegistry::new();
        registry.register(space()).expect("first registration");

        let err = registry.register(space()).expect_err("duplicate registration");
        assert_eq!(
            err,
            RegistryError::KindAlreadyRegistered(EntityKind::from_static("space"))
        );
    }

    #[test]
    fn try_get_reports_unknown_kind() {
        let registry = SchemaRegistry::from_schemas([space(), organization()]).expect("registry");

        assert!(registry.try_get("space").is_ok());
        assert_eq!(
            registry.try_get("route").expect_err("unknown kind"),
            RegistryError::UnknownKind(EntityKind::new("route"))
        );
    }

    #[test]
    fn from_schemas_rejects_dangling_relation_target() {
        let err = SchemaRegistry::from_schemas([space()]).expect_err("organization is missing");

        match err {
            Error::Validation(tree) => {
                assert_eq!(tree.messages().len(), 1);
                assert!(tree.messages()[0].contains("organization"));
            }
            Error::Registry(other) => panic!("unexpected registry error: {other}"),
        }
    }

    #[test]
    fn schema_serializes_without_empty_relations() {
        let schema = EntitySchema::resource("stack", &[]);
        let json = serde_json::to_value(&schema).expect("serialize schema");

        assert_eq!(json["kind"], "stack");
        assert!(json.get("relations").is_none());
    }
}
