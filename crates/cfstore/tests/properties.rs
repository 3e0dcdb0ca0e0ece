//! End-to-end behaviour of the store service through the public API.

use cfstore::{persist, prelude::*};
use proptest::prelude::*;
use std::{collections::BTreeMap, sync::Arc};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn store() -> Store {
    init_tracing();
    Store::cloud_foundry().expect("cloud foundry store")
}

fn ids(ids: &[&str]) -> Vec<Guid> {
    ids.iter().copied().map(Guid::from).collect()
}

fn apps() -> SectionKey {
    SectionKey::new(cf::APPLICATION, "all").with_endpoint("cf1")
}

fn app(guid: &str, name: &str) -> Value {
    json!({ "metadata": { "guid": guid }, "entity": { "name": name } })
}

fn apps_page(guids: &[String]) -> Value {
    let resources: Vec<Value> = guids.iter().map(|g| app(g, &format!("app-{g}"))).collect();
    json!({ "total_results": 40, "resources": resources })
}

fn fetch_page(store: &mut Store, section: &SectionKey, page: u32, response: Value) -> Outcome {
    store.request_page(section, page, &mut |_: PageFetchRequest| {});
    store.dispatch(Event::FetchSucceeded {
        kind: cf::APPLICATION,
        target: FetchTarget::page(section.clone(), page),
        response,
        mode: MergeMode::Patch,
    })
}

fn relation(kind: EntityKind, id: &str, relation_type: &str, has_relation: bool) -> Event {
    Event::RelationChanged {
        kind,
        id: Guid::from(id),
        relation_type: relation_type.to_string(),
        has_relation,
    }
}

///
/// Normalizer
///

#[test]
fn nested_graph_survives_denormalize_and_renormalize() {
    let mut store = store();
    let raw = json!({
        "total_results": 2,
        "resources": [
            {
                "metadata": { "guid": "a1" },
                "entity": {
                    "name": "web",
                    "space": {
                        "metadata": { "guid": "s1" },
                        "entity": {
                            "name": "dev",
                            "organization": {
                                "metadata": { "guid": "o1" },
                                "entity": { "name": "acme" },
                            },
                        },
                    },
                    "routes": [
                        { "metadata": { "guid": "r1" }, "entity": { "host": "web" } },
                        { "metadata": { "guid": "r2" }, "entity": { "host": "www" } },
                    ],
                    "stack": null,
                },
            },
            {
                "metadata": { "guid": "a2" },
                "entity": { "name": "worker", "space": "s1" },
            },
        ],
    });

    store.dispatch(Event::FetchSucceeded {
        kind: cf::APPLICATION,
        target: FetchTarget::Entity(Guid::from("a1")),
        response: raw,
        mode: MergeMode::Patch,
    });
    let first = store.snapshot();

    let denormalized = store
        .denormalize("application", &ids(&["a1", "a2"]))
        .expect("denormalize");
    let mut again = Store::cloud_foundry().expect("store");
    again.dispatch(Event::FetchSucceeded {
        kind: cf::APPLICATION,
        target: FetchTarget::Entity(Guid::from("a1")),
        response: denormalized,
        mode: MergeMode::Patch,
    });

    assert_eq!(again.state().entities, first.entities);
    let a1 = first.entities.get("application", "a1").expect("a1");
    assert_eq!(a1.entity["space"], json!("s1"));
    assert_eq!(a1.entity["routes"], json!(["r1", "r2"]));
    assert_eq!(a1.entity["stack"], Value::Null);
}

///
/// Merge
///

#[test]
fn patch_preserves_and_replace_drops_untouched_fields() {
    let mut store = store();
    let fetch = |entity: Value, mode| Event::FetchSucceeded {
        kind: cf::APPLICATION,
        target: FetchTarget::Entity(Guid::from("x")),
        response: json!({ "metadata": { "guid": "x" }, "entity": entity }),
        mode,
    };

    store.dispatch(fetch(json!({ "a": 1, "b": 2 }), MergeMode::Patch));
    store.dispatch(fetch(json!({ "a": 9 }), MergeMode::Patch));
    let patched = store.entity("application", "x").record.expect("x").entity.clone();
    assert_eq!(Value::Object(patched), json!({ "a": 9, "b": 2 }));

    store.dispatch(fetch(json!({ "a": 9 }), MergeMode::Replace));
    let replaced = store.entity("application", "x").record.expect("x").entity.clone();
    assert_eq!(Value::Object(replaced), json!({ "a": 9 }));
}

#[test]
fn last_completed_fetch_wins() {
    let mut store = store();
    let started = |store: &mut Store| {
        store.dispatch(Event::FetchStarted {
            kind: cf::APPLICATION,
            target: FetchTarget::Entity(Guid::from("x")),
        });
    };
    started(&mut store);
    started(&mut store);

    for name in ["second", "first"] {
        store.dispatch(Event::FetchSucceeded {
            kind: cf::APPLICATION,
            target: FetchTarget::Entity(Guid::from("x")),
            response: app("x", name),
            mode: MergeMode::Patch,
        });
    }

    let record = store.entity("application", "x").record.expect("x");
    assert_eq!(record.entity["name"], json!("first"));
}

///
/// Request lifecycle
///

#[test]
fn update_operations_are_independent() {
    let mut store = store();
    store.dispatch(Event::UpdateStarted {
        kind: cf::APPLICATION,
        id: Guid::from("x"),
        operation: "x".to_string(),
    });
    store.dispatch(Event::UpdateFailed {
        kind: cf::APPLICATION,
        id: Guid::from("x"),
        operation: "y".to_string(),
        message: "boom".to_string(),
    });

    let request = store.entity("application", "x").request.expect("request");
    let x = request.update("x").expect("x");
    let y = request.update("y").expect("y");
    assert!(x.busy);
    assert!(!x.error);
    assert!(!y.busy);
    assert!(y.error);
    assert_eq!(y.message.as_deref(), Some("boom"));
    assert!(store.entity("application", "x").is_busy());
}

///
/// Pagination
///

#[test]
fn maxed_flag_is_per_page() {
    let mut store = store();
    let section = apps();
    store.dispatch(Event::SetParams {
        section: section.clone(),
        params: BTreeMap::from([("results-per-page".to_string(), json!(10))]),
        keep_pages: false,
        overwrite: true,
    });

    let seven: Vec<String> = (0..7).map(|i| format!("p2-{i}")).collect();
    fetch_page(&mut store, &section, 2, apps_page(&seven));
    assert!(store.is_maxed(&section));

    let ten: Vec<String> = (0..10).map(|i| format!("p1-{i}")).collect();
    fetch_page(&mut store, &section, 1, apps_page(&ten));

    let state = store.state().pagination.section(&section).expect("section");
    assert!(!state.page_requests[&1].maxed);
    assert!(state.page_requests[&2].maxed);
    assert!(store.is_maxed(&section));
    assert_eq!(state.total_results, 40);
}

#[test]
fn forced_local_page_is_authoritative() {
    let mut store = store();
    let section = apps();
    fetch_page(&mut store, &section, 1, apps_page(&["a".to_string()]));
    assert!(store.is_maxed(&section));

    store.dispatch(Event::SetPage {
        section: section.clone(),
        page: 2,
        keep_pages: false,
        force_local: true,
    });

    assert!(!store.is_maxed(&section));
    assert_eq!(store.state().pagination.section(&section).expect("s").ids.len(), 1);
}

#[test]
fn failed_refetch_retains_stale_page() {
    let mut store = store();
    let section = apps();
    let abc: Vec<String> = ["a", "b", "c"].map(String::from).to_vec();
    fetch_page(&mut store, &section, 1, apps_page(&abc));

    store.request_page(&section, 1, &mut |_: PageFetchRequest| {});
    store.dispatch(Event::FetchFailed {
        kind: cf::APPLICATION,
        target: FetchTarget::page(section.clone(), 1),
        message: "502 bad gateway".to_string(),
    });

    let state = store.state().pagination.section(&section).expect("section");
    let request = &state.page_requests[&1];
    assert_eq!(request.ids, ids(&["a", "b", "c"]));
    assert!(request.error);
    assert!(!request.busy);

    let page = store.page(&section);
    assert_eq!(page.entities.len(), 3);
    assert_eq!(page.message, Some("502 bad gateway"));
}

#[test]
fn local_page_is_restartable_and_stable() {
    let mut store = store();
    let section = SectionKey::new(cf::APPLICATION, "local");
    store.request_page(&section, 1, &mut |_: PageFetchRequest| {});
    store.dispatch(Event::FetchSucceeded {
        kind: cf::APPLICATION,
        target: FetchTarget::page(section.clone(), 1),
        response: json!([
            { "metadata": { "guid": "a" }, "entity": { "name": "a", "memory": 256 } },
            { "metadata": { "guid": "b" }, "entity": { "name": "b", "memory": 128 } },
            { "metadata": { "guid": "c" }, "entity": { "name": "c", "memory": 256 } },
            { "metadata": { "guid": "d" }, "entity": { "name": "d", "memory": 128 } },
        ]),
        mode: MergeMode::Patch,
    });

    store.dispatch(Event::LocalPageRequested {
        section: section.clone(),
        config: ClientPageConfig::new(3, 1).with_sort(SortSpec::asc("memory")),
    });
    let first = store.local_page(&section);
    let second = store.local_page(&section);

    assert_eq!(first, second);
    assert_eq!(first.ids, ids(&["b", "d", "a"]));
    assert_eq!(first.page_count, 2);

    store.dispatch(Event::SetClientPage {
        section: section.clone(),
        page: 2,
    });
    assert_eq!(store.local_page(&section).ids, ids(&["c"]));
}

proptest! {
    #[test]
    fn local_filter_never_fetches(names in prop::collection::vec("[a-c]{1,3}", 1..20), needle in "[a-c]") {
        let mut store = Store::cloud_foundry().expect("store");
        let section = SectionKey::new(cf::APPLICATION, "prop");
        let resources: Vec<Value> = names
            .iter()
            .enumerate()
            .map(|(i, name)| app(&format!("id{i}"), name))
            .collect();
        fetch_page(&mut store, &section, 1, json!(resources));

        store.dispatch(Event::LocalPageRequested {
            section: section.clone(),
            config: ClientPageConfig::new(5, 1).with_filter(ClientFilter::text(needle.clone())),
        });
        let page = store.local_page(&section);

        let matching = names.iter().filter(|name| name.contains(needle.as_str())).count();
        prop_assert_eq!(page.total_results, matching);
        prop_assert!(page.ids.len() <= 5);
        prop_assert!(!store.page(&section).busy);
    }
}

///
/// Relations
///

#[test]
fn relation_scenario_keeps_stamped_org() {
    let mut store = store();
    store.dispatch(Event::FetchSucceeded {
        kind: cf::SPACE,
        target: FetchTarget::Entity(Guid::from("s1")),
        response: json!({
            "metadata": { "guid": "s1" },
            "entity": { "name": "dev", "organization_guid": "o1" },
        }),
        mode: MergeMode::Replace,
    });

    store.dispatch(relation(cf::SPACE, "s1", "MANAGED_SPACES", true));
    let space = store.state().roles.space("s1").expect("space").clone();
    assert!(space.is_manager);
    assert!(!space.is_auditor);
    assert!(!space.is_developer);
    assert_eq!(space.org_id, Some(Guid::from("o1")));

    store.dispatch(relation(cf::SPACE, "s1", "MANAGED_SPACES", false));
    let space = store.state().roles.space("s1").expect("space");
    assert!(!space.is_manager);
    assert_eq!(space.org_id, Some(Guid::from("o1")));
}

#[test]
fn org_relations_set_their_own_flags() {
    let mut store = store();
    store.dispatch(relation(cf::ORGANIZATION, "o1", "BILLING_MANAGED_ORGANIZATIONS", true));
    store.dispatch(relation(cf::ORGANIZATION, "o1", "ORGANIZATIONS", true));

    let org = store.state().roles.organization("o1").expect("org");
    assert!(org.is_billing_manager);
    assert!(org.is_user);
    assert!(!org.is_manager);
}

#[test]
fn unknown_relation_type_leaves_state_byte_identical() {
    let mut store = store();
    store.dispatch(relation(cf::SPACE, "s1", "AUDITED_SPACES", true));
    let before = store.snapshot();
    let bytes = persist::to_json(&before).expect("encode");

    let outcome = store.dispatch(relation(cf::SPACE, "s1", "BOGUS", true));

    assert_eq!(outcome, Outcome::Unchanged);
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
    assert_eq!(persist::to_json(store.state()).expect("encode"), bytes);
}

#[test]
fn scope_mismatch_is_ignored() {
    let mut store = store();
    let outcome = store.dispatch(relation(cf::SPACE, "s1", "MANAGED_ORGANIZATIONS", true));

    assert_eq!(outcome, Outcome::Unchanged);
    assert!(store.state().roles.organization("s1").is_none());
}

///
/// Persistence
///

#[test]
fn resumed_store_serves_same_views() {
    let mut store = store();
    let section = apps();
    let ab: Vec<String> = ["a", "b"].map(String::from).to_vec();
    fetch_page(&mut store, &section, 1, apps_page(&ab));

    let json = persist::to_json_pretty(store.state()).expect("encode");
    let resumed = Store::from_state(
        cf::registry().expect("registry"),
        persist::from_json(&json).expect("decode"),
    );

    assert_eq!(resumed.page(&section).ids, store.page(&section).ids);
    assert_eq!(
        resumed.entity("application", "b").record,
        store.entity("application", "b").record
    );
}
