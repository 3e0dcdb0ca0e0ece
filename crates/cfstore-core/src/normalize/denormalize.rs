use super::{NormalizeError, lookup};
use crate::model::{EntityMap, Guid};
use cfstore_schema::{
    node::{EntityKind, EntitySchema},
    registry::SchemaRegistry,
};
use serde_json::Value;

/// Rebuild the nested raw graph for `ids` of `kind`.
///
/// Ids absent from `entities` are skipped at the top level and stay as
/// references when nested. A relation pointing back at an entity already
/// being expanded also stays a reference, so cycles terminate.
pub fn denormalize(
    registry: &SchemaRegistry,
    kind: &str,
    ids: &[Guid],
    entities: &EntityMap,
) -> Result<Value, NormalizeError> {
    let schema = lookup(registry, kind)?;
    let mut walker = Denormalizer {
        registry,
        entities,
        stack: Vec::new(),
    };

    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(raw) = walker.expand(schema, id)? {
            out.push(raw);
        }
    }

    Ok(Value::Array(out))
}

///
/// Denormalizer
///

struct Denormalizer<'a> {
    registry: &'a SchemaRegistry,
    entities: &'a EntityMap,
    stack: Vec<(EntityKind, Guid)>,
}

impl Denormalizer<'_> {
    fn expand(&mut self, schema: &EntitySchema, id: &Guid) -> Result<Option<Value>, NormalizeError> {
        let Some(record) = self
            .entities
            .get(schema.kind.as_str())
            .and_then(|bucket| bucket.get(id.as_str()))
        else {
            return Ok(None);
        };
        if self
            .stack
            .iter()
            .any(|(kind, seen)| kind == &schema.kind && seen == id)
        {
            return Ok(None);
        }

        self.stack.push((schema.kind.clone(), id.clone()));
        let mut record = record.clone();
        for relation in schema.relations {
            let Some(value) = record.entity.get_mut(relation.field) else {
                continue;
            };
            let target = lookup(self.registry, relation.target.as_str())?;
            self.expand_field(target, value)?;
        }
        self.stack.pop();

        Ok(Some(record.to_raw()))
    }

    fn expand_field(&mut self, target: &EntitySchema, value: &mut Value) -> Result<(), NormalizeError> {
        match value {
            Value::String(id) => {
                if let Some(raw) = self.expand(target, &Guid::new(id.as_str()))? {
                    *value = raw;
                }
            }
            Value::Array(items) => {
                for item in items.iter_mut() {
                    self.expand_field(target, item)?;
                }
            }
            _ => {}
        }

        Ok(())
    }
}
