//! Registry validation orchestration.

pub mod naming;
pub mod relation;

use crate::{error::ErrorTree, registry::SchemaRegistry};

/// Run every registry-wide check in a fixed order.
pub(crate) fn validate_registry(registry: &SchemaRegistry) -> Result<(), ErrorTree> {
    let mut errors = ErrorTree::new();

    naming::validate_kind_naming(registry, &mut errors);
    relation::validate_relation_targets(registry, &mut errors);
    relation::validate_relation_fields(registry, &mut errors);

    errors.result()
}
