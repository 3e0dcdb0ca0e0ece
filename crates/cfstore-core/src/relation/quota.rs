use crate::{
    model::{Fields, Guid},
    store::EntityStore,
};
use cfstore_schema::cf;
use serde_json::Value;
use tracing::debug;

///
/// SpaceQuota
///
/// Space quota definition a space points at after an associate call.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpaceQuota {
    pub guid: Guid,
    pub url: Option<String>,
}

/// Point a cached space at `quota`, or detach its quota when `None`.
///
/// The space's `space_quota_definition`, `space_quota_definition_guid` and
/// `space_quota_definition_url` fields are overwritten; detaching sets all
/// three to `null`. Returns `false` when the space is not cached.
pub fn apply_space_quota(
    entities: &mut EntityStore,
    space: &Guid,
    quota: Option<&SpaceQuota>,
) -> bool {
    let (guid, url) = match quota {
        Some(quota) => (
            Value::String(quota.guid.to_string()),
            quota.url.clone().map_or(Value::Null, Value::String),
        ),
        None => (Value::Null, Value::Null),
    };

    let fields: Fields = [
        ("space_quota_definition", guid.clone()),
        ("space_quota_definition_guid", guid),
        ("space_quota_definition_url", url),
    ]
    .into_iter()
    .map(|(field, value)| (field.to_string(), value))
    .collect();

    let patched = entities.patch(cf::SPACE.as_str(), space.as_str(), &fields);
    if !patched {
        debug!(space = %space, "space quota change for uncached space");
    }

    patched
}
