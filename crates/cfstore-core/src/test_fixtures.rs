use crate::model::{Fields, Guid};
use cfstore_schema::{cf, registry::SchemaRegistry};
use serde_json::{Value, json};

pub(crate) fn registry() -> SchemaRegistry {
    cf::registry().expect("cloud foundry registry")
}

pub(crate) fn guids(ids: &[&str]) -> Vec<Guid> {
    ids.iter().copied().map(Guid::from).collect()
}

pub(crate) fn fields(value: Value) -> Fields {
    value.as_object().cloned().expect("json object")
}

pub(crate) fn org(guid: &str, name: &str) -> Value {
    json!({
        "metadata": { "guid": guid, "url": format!("/v2/organizations/{guid}") },
        "entity": { "name": name, "status": "active" },
    })
}

pub(crate) fn user(guid: &str, username: &str) -> Value {
    json!({
        "metadata": { "guid": guid },
        "entity": { "username": username, "admin": false },
    })
}

/// Space with its organization embedded inline.
pub(crate) fn space(guid: &str, name: &str, org_guid: &str) -> Value {
    json!({
        "metadata": { "guid": guid, "url": format!("/v2/spaces/{guid}") },
        "entity": {
            "name": name,
            "organization_guid": org_guid,
            "organization": org(org_guid, &format!("org-{org_guid}")),
        },
    })
}

pub(crate) fn app(guid: &str, name: &str, memory: u64) -> Value {
    json!({
        "metadata": { "guid": guid },
        "entity": { "name": name, "memory": memory, "state": "STARTED" },
    })
}
