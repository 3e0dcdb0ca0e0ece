use super::*;
use crate::test_fixtures::{guids, org, registry, space, user};
use proptest::prelude::*;
use serde_json::json;

#[test]
fn single_resource_extracts_embedded_organization() {
    let registry = registry();
    let out = normalize(&registry, "space", &space("s1", "dev", "o1")).expect("normalize");

    assert_eq!(out.result, guids(&["s1"]));
    let s1 = out.get("space", "s1").expect("space record");
    assert_eq!(s1.entity["organization"], json!("o1"));
    assert_eq!(s1.metadata["url"], json!("/v2/spaces/s1"));

    let o1 = out.get("organization", "o1").expect("organization record");
    assert_eq!(o1.entity["name"], json!("org-o1"));
    assert_eq!(out.entity_count(), 2);
}

#[test]
fn arrays_keep_order_and_map_relation_lists_to_ids() {
    let registry = registry();
    let mut second = space("s2", "prod", "o1");
    second["entity"]["developers"] = json!([user("u1", "ann"), "u2", user("u3", "cho")]);

    let raw = json!([space("s1", "dev", "o1"), second]);
    let out = normalize(&registry, "space", &raw).expect("normalize");

    assert_eq!(out.result, guids(&["s1", "s2"]));
    let s2 = out.get("space", "s2").expect("s2");
    assert_eq!(s2.entity["developers"], json!(["u1", "u2", "u3"]));
    assert!(out.get("user", "u1").is_some());
    assert!(out.get("user", "u2").is_none(), "references are not invented");
    assert!(out.get("user", "u3").is_some());
}

#[test]
fn list_envelope_surfaces_total_results() {
    let registry = registry();
    let raw = json!({
        "total_results": 42,
        "total_pages": 5,
        "prev_url": null,
        "next_url": "/v2/organizations?page=2",
        "resources": [org("o1", "a"), org("o2", "b")],
    });

    let out = normalize(&registry, "organization", &raw).expect("normalize");
    assert_eq!(out.total_results, Some(42));
    assert_eq!(out.result, guids(&["o1", "o2"]));
}

#[test]
fn null_relation_produces_no_entity() {
    let registry = registry();
    let raw = json!({
        "metadata": { "guid": "a1" },
        "entity": { "name": "web", "stack": null, "space": "s1" },
    });

    let out = normalize(&registry, "application", &raw).expect("normalize");
    let app = out.get("application", "a1").expect("app");
    assert_eq!(app.entity["stack"], Value::Null);
    assert_eq!(app.entity["space"], json!("s1"));
    assert_eq!(out.entity_count(), 1);
}

#[test]
fn missing_key_is_schema_mismatch_with_path() {
    let registry = registry();
    let raw = json!([org("o1", "a"), { "metadata": {}, "entity": { "name": "broken" } }]);

    let err = normalize(&registry, "organization", &raw).expect_err("missing guid");
    match err {
        NormalizeError::SchemaMismatch { kind, path, reason } => {
            assert_eq!(kind.as_str(), "organization");
            assert_eq!(path, "$[1]");
            assert!(reason.contains("guid"), "reason: {reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn nested_missing_key_reports_nested_path() {
    let registry = registry();
    let mut raw = space("s1", "dev", "o1");
    raw["entity"]["organization"] = json!({ "metadata": { "guid": 7 }, "entity": {} });

    let err = normalize(&registry, "space", &raw).expect_err("numeric guid");
    assert!(matches!(
        err,
        NormalizeError::SchemaMismatch { ref path, .. } if path == "$.entity.organization"
    ));
}

#[test]
fn relation_shape_must_match_cardinality() {
    let registry = registry();

    let mut raw = space("s1", "dev", "o1");
    raw["entity"]["organization"] = json!([org("o1", "one"), org("o2", "two")]);
    let err = normalize(&registry, "space", &raw).expect_err("array under a single relation");
    assert!(matches!(
        err,
        NormalizeError::SchemaMismatch { ref kind, ref path, ref reason }
            if kind.as_str() == "organization"
                && path == "$.entity.organization"
                && reason == "One relation cannot hold array"
    ));

    let mut raw = space("s1", "dev", "o1");
    raw["entity"]["developers"] = user("u1", "ann");
    let err = normalize(&registry, "space", &raw).expect_err("object under a collection");
    assert!(matches!(
        err,
        NormalizeError::SchemaMismatch { ref path, .. } if path == "$.entity.developers"
    ));
}

#[test]
fn unknown_kind_is_rejected() {
    let registry = registry();
    let err = normalize(&registry, "widget", &json!([])).expect_err("unknown kind");

    assert_eq!(err, NormalizeError::UnknownKind(EntityKind::new("widget")));
}

#[test]
fn scalar_input_is_unexpected_shape() {
    let registry = registry();
    let err = normalize(&registry, "space", &json!("s1")).expect_err("string input");

    assert!(matches!(err, NormalizeError::UnexpectedShape { found: "string", .. }));
}

#[test]
fn null_input_is_empty() {
    let registry = registry();
    let out = normalize(&registry, "space", &Value::Null).expect("normalize");

    assert!(out.result.is_empty());
    assert_eq!(out.entity_count(), 0);
}

#[test]
fn duplicate_ids_overlay_later_fields() {
    let registry = registry();
    let raw = json!([
        { "metadata": { "guid": "o1" }, "entity": { "name": "first", "status": "active" } },
        { "metadata": { "guid": "o1" }, "entity": { "name": "second" } },
    ]);

    let out = normalize(&registry, "organization", &raw).expect("normalize");
    let o1 = out.get("organization", "o1").expect("o1");
    assert_eq!(o1.entity["name"], json!("second"));
    assert_eq!(o1.entity["status"], json!("active"));
    assert_eq!(out.result, guids(&["o1", "o1"]));
}

#[test]
fn bare_objects_use_entity_guid() {
    let registry = registry();
    let raw = json!({ "guid": "st1", "name": "cflinuxfs4" });

    let out = normalize(&registry, "stack", &raw).expect("normalize");
    let stack = out.get("stack", "st1").expect("stack");
    assert!(stack.metadata.is_empty());
    assert_eq!(stack.entity["name"], json!("cflinuxfs4"));
}

#[test]
fn normalize_is_pure() {
    let registry = registry();
    let raw = json!([space("s1", "dev", "o1"), space("s2", "qa", "o2")]);

    let first = normalize(&registry, "space", &raw).expect("first");
    let second = normalize(&registry, "space", &raw).expect("second");
    assert_eq!(first, second);
}

#[test]
fn denormalize_rebuilds_embedded_graph() {
    let registry = registry();
    let out = normalize(&registry, "space", &space("s1", "dev", "o1")).expect("normalize");

    let raw = denormalize(&registry, "space", &out.result, &out.entities).expect("denormalize");
    assert_eq!(raw[0]["entity"]["organization"]["entity"]["name"], json!("org-o1"));
    assert_eq!(raw[0]["metadata"]["guid"], json!("s1"));
}

#[test]
fn denormalize_breaks_cycles_and_keeps_missing_references() {
    let registry = registry();
    let mut raw = space("s1", "dev", "o1");
    raw["entity"]["organization"]["entity"]["spaces"] = json!(["s1"]);
    raw["entity"]["developers"] = json!(["u-missing"]);

    let out = normalize(&registry, "space", &raw).expect("normalize");
    let rebuilt = denormalize(&registry, "space", &out.result, &out.entities).expect("denormalize");

    let org = &rebuilt[0]["entity"]["organization"];
    assert_eq!(org["entity"]["spaces"], json!(["s1"]));
    assert_eq!(rebuilt[0]["entity"]["developers"], json!(["u-missing"]));

    let again = normalize(&registry, "space", &rebuilt).expect("renormalize");
    assert_eq!(again.entities, out.entities);
}

#[test]
fn denormalize_skips_unknown_top_level_ids() {
    let registry = registry();
    let out = normalize(&registry, "organization", &org("o1", "a")).expect("normalize");

    let raw = denormalize(&registry, "organization", &guids(&["o1", "o9"]), &out.entities)
        .expect("denormalize");
    assert_eq!(raw.as_array().map(Vec::len), Some(1));
}

///
/// PROPERTIES
///

fn arb_space(index: usize) -> impl Strategy<Value = Value> {
    (
        0..4usize,
        "[a-z]{1,6}",
        prop::collection::vec(0..5usize, 0..4),
        any::<bool>(),
    )
        .prop_map(move |(org_ix, name, devs, embed_org)| {
            let org_guid = format!("o{org_ix}");
            let mut raw = space(&format!("s{index}"), &name, &org_guid);
            if !embed_org {
                raw["entity"]["organization"] = json!(org_guid);
            }
            raw["entity"]["developers"] = devs
                .into_iter()
                .enumerate()
                .map(|(i, u)| {
                    if i % 2 == 0 {
                        user(&format!("u{u}"), &format!("user{u}"))
                    } else {
                        json!(format!("u{u}"))
                    }
                })
                .collect();
            raw
        })
}

fn arb_space_list() -> impl Strategy<Value = Value> {
    (0..6usize)
        .prop_flat_map(|len| (0..len).map(arb_space).collect::<Vec<_>>())
        .prop_map(Value::Array)
}

proptest! {
    #[test]
    fn normalize_denormalize_is_idempotent(raw in arb_space_list()) {
        let registry = registry();
        let first = normalize(&registry, "space", &raw).expect("normalize");
        let rebuilt = denormalize(&registry, "space", &first.result, &first.entities)
            .expect("denormalize");
        let second = normalize(&registry, "space", &rebuilt).expect("renormalize");

        prop_assert_eq!(second.result, first.result);
        prop_assert_eq!(second.entities, first.entities);
    }
}
