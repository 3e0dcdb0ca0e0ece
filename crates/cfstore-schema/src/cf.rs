//! Cloud Foundry v2 entity kinds and their inline relations.

use crate::{Error, prelude::*};

///
/// Kind names
///

pub const APPLICATION: EntityKind = EntityKind::from_static("application");
pub const DOMAIN: EntityKind = EntityKind::from_static("domain");
pub const ORGANIZATION: EntityKind = EntityKind::from_static("organization");
pub const QUOTA_DEFINITION: EntityKind = EntityKind::from_static("quota_definition");
pub const ROUTE: EntityKind = EntityKind::from_static("route");
pub const SERVICE: EntityKind = EntityKind::from_static("service");
pub const SERVICE_BINDING: EntityKind = EntityKind::from_static("service_binding");
pub const SERVICE_INSTANCE: EntityKind = EntityKind::from_static("service_instance");
pub const SERVICE_PLAN: EntityKind = EntityKind::from_static("service_plan");
pub const SPACE: EntityKind = EntityKind::from_static("space");
pub const SPACE_QUOTA_DEFINITION: EntityKind = EntityKind::from_static("space_quota_definition");
pub const STACK: EntityKind = EntityKind::from_static("stack");
pub const USER: EntityKind = EntityKind::from_static("user");

///
/// Relations
///
/// `Relation` has drop glue, so its tables are statics rather than
/// borrowed array literals.
///

static NO_RELATIONS: [Relation; 0] = [];

static APPLICATION_RELATIONS: [Relation; 4] = [
    Relation::one("space", "space"),
    Relation::opt("stack", "stack"),
    Relation::many("routes", "route"),
    Relation::many("service_bindings", "service_binding"),
];

static ORGANIZATION_RELATIONS: [Relation; 7] = [
    Relation::many("spaces", "space"),
    Relation::many("users", "user"),
    Relation::many("managers", "user"),
    Relation::many("billing_managers", "user"),
    Relation::many("auditors", "user"),
    Relation::many("domains", "domain"),
    Relation::opt("quota_definition", "quota_definition"),
];

static ROUTE_RELATIONS: [Relation; 3] = [
    Relation::one("domain", "domain"),
    Relation::one("space", "space"),
    Relation::many("apps", "application"),
];

static SERVICE_RELATIONS: [Relation; 1] = [Relation::many("service_plans", "service_plan")];

static SERVICE_BINDING_RELATIONS: [Relation; 2] = [
    Relation::one("app", "application"),
    Relation::one("service_instance", "service_instance"),
];

static SERVICE_INSTANCE_RELATIONS: [Relation; 3] = [
    Relation::one("space", "space"),
    Relation::opt("service_plan", "service_plan"),
    Relation::many("service_bindings", "service_binding"),
];

static SERVICE_PLAN_RELATIONS: [Relation; 1] = [Relation::one("service", "service")];

static SPACE_RELATIONS: [Relation; 8] = [
    Relation::one("organization", "organization"),
    Relation::many("developers", "user"),
    Relation::many("managers", "user"),
    Relation::many("auditors", "user"),
    Relation::many("apps", "application"),
    Relation::many("routes", "route"),
    Relation::many("service_instances", "service_instance"),
    Relation::opt("space_quota_definition", "space_quota_definition"),
];

static USER_RELATIONS: [Relation; 7] = [
    Relation::many("organizations", "organization"),
    Relation::many("managed_organizations", "organization"),
    Relation::many("billing_managed_organizations", "organization"),
    Relation::many("audited_organizations", "organization"),
    Relation::many("spaces", "space"),
    Relation::many("managed_spaces", "space"),
    Relation::many("audited_spaces", "space"),
];

///
/// Schemas
///

pub static APPLICATION_SCHEMA: EntitySchema =
    EntitySchema::resource("application", &APPLICATION_RELATIONS);
pub static DOMAIN_SCHEMA: EntitySchema = EntitySchema::resource("domain", &NO_RELATIONS);
pub static ORGANIZATION_SCHEMA: EntitySchema =
    EntitySchema::resource("organization", &ORGANIZATION_RELATIONS);
pub static QUOTA_DEFINITION_SCHEMA: EntitySchema =
    EntitySchema::resource("quota_definition", &NO_RELATIONS);
pub static ROUTE_SCHEMA: EntitySchema = EntitySchema::resource("route", &ROUTE_RELATIONS);
pub static SERVICE_SCHEMA: EntitySchema = EntitySchema::resource("service", &SERVICE_RELATIONS);
pub static SERVICE_BINDING_SCHEMA: EntitySchema =
    EntitySchema::resource("service_binding", &SERVICE_BINDING_RELATIONS);
pub static SERVICE_INSTANCE_SCHEMA: EntitySchema =
    EntitySchema::resource("service_instance", &SERVICE_INSTANCE_RELATIONS);
pub static SERVICE_PLAN_SCHEMA: EntitySchema =
    EntitySchema::resource("service_plan", &SERVICE_PLAN_RELATIONS);
pub static SPACE_SCHEMA: EntitySchema = EntitySchema::resource("space", &SPACE_RELATIONS);
pub static SPACE_QUOTA_DEFINITION_SCHEMA: EntitySchema =
    EntitySchema::resource("space_quota_definition", &NO_RELATIONS);
pub static STACK_SCHEMA: EntitySchema = EntitySchema::resource("stack", &NO_RELATIONS);
pub static USER_SCHEMA: EntitySchema = EntitySchema::resource("user", &USER_RELATIONS);

/// Every Cloud Foundry schema this crate knows about.
#[must_use]
pub fn schemas() -> [EntitySchema; 13] {
    [
        &APPLICATION_SCHEMA,
        &DOMAIN_SCHEMA,
        &ORGANIZATION_SCHEMA,
        &QUOTA_DEFINITION_SCHEMA,
        &ROUTE_SCHEMA,
        &SERVICE_SCHEMA,
        &SERVICE_BINDING_SCHEMA,
        &SERVICE_INSTANCE_SCHEMA,
        &SERVICE_PLAN_SCHEMA,
        &SPACE_SCHEMA,
        &SPACE_QUOTA_DEFINITION_SCHEMA,
        &STACK_SCHEMA,
        &USER_SCHEMA,
    ]
    .map(EntitySchema::clone)
}

/// Build the validated Cloud Foundry registry.
pub fn registry() -> Result<SchemaRegistry, Error> {
    SchemaRegistry::from_schemas(schemas())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloud_foundry_registry_validates() {
        let registry = registry().expect("cloud foundry registry must validate");

        assert_eq!(registry.len(), schemas().len());
        for kind in [APPLICATION, SPACE, ORGANIZATION, USER, SERVICE_INSTANCE, ROUTE] {
            assert!(registry.contains(kind.as_str()), "missing {kind}");
        }
    }

    #[test]
    fn user_role_collections_target_spaces_and_orgs() {
        let registry = registry().expect("registry");
        let user = registry.try_get("user").expect("user schema");

        let managed = user.relation("managed_spaces").expect("managed_spaces");
        assert_eq!(managed.target, SPACE);
        assert!(managed.cardinality.is_many());

        let audited = user
            .relation("audited_organizations")
            .expect("audited_organizations");
        assert_eq!(audited.target, ORGANIZATION);
    }
}
