use super::*;
use crate::{
    normalize::normalize,
    test_fixtures::{fields, registry, space},
};
use serde_json::{Value, json};

fn org_response(raw: Value) -> NormalizedResponse {
    normalize(&registry(), "organization", &raw).expect("normalize")
}

fn seeded() -> EntityStore {
    EntityStore::new().merge(
        &org_response(json!({
            "metadata": { "guid": "o1", "updated_at": "t0" },
            "entity": { "a": 1, "b": 2 },
        })),
        MergeMode::Patch,
    )
}

#[test]
fn patch_merge_preserves_untouched_fields() {
    let store = seeded().merge(
        &org_response(json!({ "metadata": { "guid": "o1" }, "entity": { "a": 9 } })),
        MergeMode::Patch,
    );

    let o1 = store.get("organization", "o1").expect("o1");
    assert_eq!(Value::Object(o1.entity.clone()), json!({ "a": 9, "b": 2 }));
    assert_eq!(o1.metadata["updated_at"], json!("t0"));
}

#[test]
fn replace_merge_drops_absent_entity_fields() {
    let store = seeded().merge(
        &org_response(json!({ "metadata": { "guid": "o1" }, "entity": { "a": 9 } })),
        MergeMode::Replace,
    );

    let o1 = store.get("organization", "o1").expect("o1");
    assert_eq!(Value::Object(o1.entity.clone()), json!({ "a": 9 }));
    assert_eq!(o1.metadata["updated_at"], json!("t0"), "metadata is overlaid");
}

#[test]
fn replace_only_applies_to_top_level_results() {
    let registry = registry();
    let mut store = EntityStore::new().merge(
        &org_response(json!({
            "metadata": { "guid": "o1" },
            "entity": { "name": "org-o1", "status": "active", "billing_enabled": true },
        })),
        MergeMode::Patch,
    );

    let response = normalize(&registry, "space", &space("s1", "dev", "o1")).expect("normalize");
    let stats = store.merge_in_place(&response, MergeMode::Replace);

    assert_eq!(stats, MergeStats { inserted: 1, updated: 1 });
    let o1 = store.get("organization", "o1").expect("o1");
    assert_eq!(o1.entity["billing_enabled"], json!(true));
}

#[test]
fn later_merge_wins_regardless_of_request_order() {
    let first = org_response(json!({ "metadata": { "guid": "o1" }, "entity": { "name": "old" } }));
    let second = org_response(json!({ "metadata": { "guid": "o1" }, "entity": { "name": "new" } }));

    let store = EntityStore::new()
        .merge(&second, MergeMode::Patch)
        .merge(&first, MergeMode::Patch);
    assert_eq!(
        store.get("organization", "o1").expect("o1").entity["name"],
        json!("old")
    );
}

#[test]
fn patch_and_remove() {
    let mut store = seeded();

    assert!(store.patch("organization", "o1", &fields(json!({ "b": 3, "c": 4 }))));
    assert!(!store.patch("organization", "missing", &fields(json!({ "b": 3 }))));
    assert_eq!(
        Value::Object(store.get("organization", "o1").expect("o1").entity.clone()),
        json!({ "a": 1, "b": 3, "c": 4 })
    );

    assert!(store.remove("organization", "o1").is_some());
    assert!(store.remove("organization", "o1").is_none());
    assert!(store.is_empty());
    assert_eq!(store.len(), 0);
}
