//! Module: normalize
//! Responsibility: flatten nested API responses into per-kind id maps.
//! Does not own: merging into the cache, request or page bookkeeping.
//!
//! Input is a single resource, an array of resources, a Cloud Foundry list
//! envelope (`{total_results, resources}`), or `null`. Every relation the
//! schema declares is followed; embedded objects move into their own kind
//! bucket and the parent keeps only the id.

mod denormalize;

#[cfg(test)]
mod tests;

pub use denormalize::denormalize;

use crate::model::{EntityMap, EntityRecord, Fields, Guid};
use cfstore_schema::{
    node::{EntityKind, EntitySchema},
    registry::SchemaRegistry,
    types::{Cardinality, KeyPath},
};
use serde_json::Value;
use thiserror::Error as ThisError;

///
/// NormalizeError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum NormalizeError {
    #[error("schema mismatch for '{kind}' at {path}: {reason}")]
    SchemaMismatch {
        kind: EntityKind,
        path: String,
        reason: String,
    },

    #[error("entity kind '{0}' is not registered")]
    UnknownKind(EntityKind),

    #[error("unexpected shape for '{kind}' at {path}: expected an object, found {found}")]
    UnexpectedShape {
        kind: EntityKind,
        path: String,
        found: &'static str,
    },
}

///
/// NormalizedResponse
///
/// Flattened output of one normalize call. `result` lists the top-level ids
/// in response order.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NormalizedResponse {
    pub kind: EntityKind,
    pub entities: EntityMap,
    pub result: Vec<Guid>,
    pub total_results: Option<u64>,
}

impl NormalizedResponse {
    #[must_use]
    pub fn empty(kind: EntityKind) -> Self {
        Self {
            kind,
            entities: EntityMap::new(),
            result: Vec::new(),
            total_results: None,
        }
    }

    #[must_use]
    pub fn get(&self, kind: &str, id: &str) -> Option<&EntityRecord> {
        self.entities.get(kind)?.get(id)
    }

    /// Total number of records across all kinds.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.values().map(std::collections::BTreeMap::len).sum()
    }
}

/// Normalize a raw response of `kind`.
///
/// Fails with [`NormalizeError::SchemaMismatch`] when any resource, top-level
/// or embedded, lacks a string key. A failure discards the whole response.
pub fn normalize(
    registry: &SchemaRegistry,
    kind: &str,
    raw: &Value,
) -> Result<NormalizedResponse, NormalizeError> {
    let schema = lookup(registry, kind)?;
    let mut normalizer = Normalizer {
        registry,
        out: NormalizedResponse::empty(schema.kind.clone()),
    };

    match raw {
        Value::Null => {}
        Value::Array(items) => normalizer.visit_list(schema, items, "$")?,
        Value::Object(map) => match map.get("resources") {
            Some(Value::Array(items)) => {
                normalizer.out.total_results = map.get("total_results").and_then(Value::as_u64);
                normalizer.visit_list(schema, items, "$.resources")?;
            }
            _ => {
                let id = normalizer.visit(schema, raw, "$")?;
                normalizer.out.result.push(id);
            }
        },
        other => {
            return Err(NormalizeError::UnexpectedShape {
                kind: schema.kind.clone(),
                path: "$".to_string(),
                found: type_name(other),
            });
        }
    }

    Ok(normalizer.out)
}

pub(crate) fn lookup<'a>(
    registry: &'a SchemaRegistry,
    kind: &str,
) -> Result<&'a EntitySchema, NormalizeError> {
    registry
        .get(kind)
        .ok_or_else(|| NormalizeError::UnknownKind(EntityKind::new(kind)))
}

///
/// Normalizer
///

struct Normalizer<'a> {
    registry: &'a SchemaRegistry,
    out: NormalizedResponse,
}

impl Normalizer<'_> {
    fn visit_list(
        &mut self,
        schema: &EntitySchema,
        items: &[Value],
        path: &str,
    ) -> Result<(), NormalizeError> {
        for (i, item) in items.iter().enumerate() {
            let id = self.visit(schema, item, &format!("{path}[{i}]"))?;
            self.out.result.push(id);
        }

        Ok(())
    }

    /// Extract one resource and everything embedded in it; returns its id.
    fn visit(
        &mut self,
        schema: &EntitySchema,
        raw: &Value,
        path: &str,
    ) -> Result<Guid, NormalizeError> {
        let Value::Object(map) = raw else {
            return Err(NormalizeError::UnexpectedShape {
                kind: schema.kind.clone(),
                path: path.to_string(),
                found: type_name(raw),
            });
        };

        let (mut record, entity_path) = match map.get("entity") {
            Some(Value::Object(entity)) => {
                let metadata = match map.get("metadata") {
                    Some(Value::Object(metadata)) => metadata.clone(),
                    _ => Fields::new(),
                };
                (
                    EntityRecord::new(metadata, entity.clone()),
                    format!("{path}.entity"),
                )
            }
            _ => (EntityRecord::bare(map.clone()), path.to_string()),
        };

        let id = record_key(schema, &record, path)?;
        for relation in schema.relations {
            let Some(value) = record.entity.get_mut(relation.field) else {
                continue;
            };
            let target = lookup(self.registry, relation.target.as_str())?;
            let field_path = format!("{entity_path}.{}", relation.field);
            self.visit_relation(target, relation.cardinality, value, &field_path)?;
        }

        let bucket = self.out.entities.entry(schema.kind.clone()).or_default();
        match bucket.get_mut(&id) {
            Some(existing) => existing.overlay(&record),
            None => {
                bucket.insert(id.clone(), record);
            }
        }

        Ok(id)
    }

    /// Replace embedded objects in a relation field with their ids.
    /// References, `null`, and scalars are left as they are.
    ///
    /// An array under a single-valued relation, or an object under a
    /// collection, is a schema mismatch.
    fn visit_relation(
        &mut self,
        target: &EntitySchema,
        cardinality: Cardinality,
        value: &mut Value,
        path: &str,
    ) -> Result<(), NormalizeError> {
        if matches!(
            (cardinality, &*value),
            (Cardinality::Many, Value::Object(_))
                | (Cardinality::One | Cardinality::Opt, Value::Array(_))
        ) {
            return Err(NormalizeError::SchemaMismatch {
                kind: target.kind.clone(),
                path: path.to_string(),
                reason: format!("{cardinality} relation cannot hold {}", type_name(value)),
            });
        }

        match value {
            Value::Object(_) => {
                let id = self.visit(target, value, path)?;
                *value = Value::String(id.to_string());
            }
            Value::Array(items) => {
                for (i, item) in items.iter_mut().enumerate() {
                    if item.is_object() {
                        let id = self.visit(target, item, &format!("{path}[{i}]"))?;
                        *item = Value::String(id.to_string());
                    }
                }
            }
            _ => {}
        }

        Ok(())
    }
}

/// Read the unique key of a record.
///
/// Bare objects have no metadata, so a metadata key falls back to the same
/// field on the entity.
pub(crate) fn record_key(
    schema: &EntitySchema,
    record: &EntityRecord,
    path: &str,
) -> Result<Guid, NormalizeError> {
    let field = schema.key.field();
    let value = match schema.key {
        KeyPath::Metadata(_) if record.metadata.is_empty() => record.entity.get(field),
        KeyPath::Metadata(_) => record.metadata.get(field),
        KeyPath::Entity(_) => record.entity.get(field),
    };

    match value {
        Some(Value::String(id)) if !id.is_empty() => Ok(Guid::new(id.as_str())),
        Some(other) => Err(NormalizeError::SchemaMismatch {
            kind: schema.kind.clone(),
            path: path.to_string(),
            reason: format!("{} must be a non-empty string, found {}", schema.key, type_name(other)),
        }),
        None => Err(NormalizeError::SchemaMismatch {
            kind: schema.kind.clone(),
            path: path.to_string(),
            reason: format!("missing {}", schema.key),
        }),
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
