use crate::{MAX_FIELD_NAME_LEN, MAX_KIND_LEN, prelude::*};

pub fn validate_kind_naming(registry: &SchemaRegistry, errs: &mut ErrorTree) {
    for schema in registry.iter() {
        let kind = schema.kind.as_str();

        if kind.is_empty() {
            err!(errs, "entity kind name must not be empty");
        } else if kind.len() > MAX_KIND_LEN {
            err!(
                errs,
                "entity kind '{kind}' exceeds {MAX_KIND_LEN} characters"
            );
        }

        let key = schema.key.field();
        if key.is_empty() || key.len() > MAX_FIELD_NAME_LEN {
            err!(errs, "entity kind '{kind}' has an invalid key field '{key}'");
        }
    }
}
