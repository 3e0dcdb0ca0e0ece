use crate::{MAX_FIELD_NAME_LEN, prelude::*};
use std::collections::BTreeSet;

// Every relation must point at a registered kind.
pub fn validate_relation_targets(registry: &SchemaRegistry, errs: &mut ErrorTree) {
    for schema in registry.iter() {
        for relation in schema.relations {
            if !registry.contains(relation.target.as_str()) {
                err!(
                    errs,
                    "entity '{}', relation '{}', targets unregistered kind '{}'",
                    schema.kind,
                    relation.field,
                    relation.target
                );
            }
        }
    }
}

// Relation field names are unique per schema and bounded in length.
pub fn validate_relation_fields(registry: &SchemaRegistry, errs: &mut ErrorTree) {
    for schema in registry.iter() {
        let mut seen = BTreeSet::new();

        for relation in schema.relations {
            if relation.field.is_empty() || relation.field.len() > MAX_FIELD_NAME_LEN {
                err!(
                    errs,
                    "entity '{}' has an invalid relation field name '{}'",
                    schema.kind,
                    relation.field
                );
            }
            if !seen.insert(relation.field) {
                err!(
                    errs,
                    "entity '{}' declares relation '{}' more than once",
                    schema.kind,
                    relation.field
                );
            }
        }
    }
}
