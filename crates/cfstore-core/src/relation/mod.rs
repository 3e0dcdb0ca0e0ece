//! Module: relation
//! Responsibility: denormalized role flags for the current user, the role
//! collections on user entities, and space quota links.
//! Does not own: fetching role data or persisting the result.
//!
//! Everything here is a pure state transition; unknown relation types are
//! tolerated as no-ops.

mod permission;
mod quota;


pub use permission::{UserPermissionChange, apply_user_permission};
pub use quota::{SpaceQuota, apply_space_quota};

use crate::{model::Guid, store::EntityStore};
use cfstore_schema::{cf, node::EntityKind};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, str::FromStr};
use thiserror::Error as ThisError;
use tracing::debug;

///
/// UnknownRelationType
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("unknown user relation type '{0}'")]
pub struct UnknownRelationType(pub String);

///
/// RelationScope
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum RelationScope {
    Organization,
    Space,
}

impl RelationScope {
    #[must_use]
    pub const fn kind(self) -> EntityKind {
        match self {
            Self::Organization => cf::ORGANIZATION,
            Self::Space => cf::SPACE,
        }
    }
}

///
/// UserRelationType
///
/// Closed set of user ↔ org/space relations, named as on the wire.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[remain::sorted]
pub enum UserRelationType {
    #[display("AUDITED_ORGANIZATIONS")]
    AuditedOrganizations,
    #[display("AUDITED_SPACES")]
    AuditedSpaces,
    #[display("BILLING_MANAGED_ORGANIZATIONS")]
    BillingManagedOrganizations,
    #[display("MANAGED_ORGANIZATIONS")]
    ManagedOrganizations,
    #[display("MANAGED_SPACES")]
    ManagedSpaces,
    #[display("ORGANIZATIONS")]
    Organizations,
    #[display("SPACES")]
    Spaces,
}

impl UserRelationType {
    pub const ALL: [Self; 7] = [
        Self::AuditedOrganizations,
        Self::AuditedSpaces,
        Self::BillingManagedOrganizations,
        Self::ManagedOrganizations,
        Self::ManagedSpaces,
        Self::Organizations,
        Self::Spaces,
    ];

    #[must_use]
    pub const fn scope(self) -> RelationScope {
        match self {
            Self::AuditedOrganizations
            | Self::BillingManagedOrganizations
            | Self::ManagedOrganizations
            | Self::Organizations => RelationScope::Organization,
            Self::AuditedSpaces | Self::ManagedSpaces | Self::Spaces => RelationScope::Space,
        }
    }

    /// Field on the user entity listing the related guids.
    #[must_use]
    pub const fn collection_field(self) -> &'static str {
        match self {
            Self::AuditedOrganizations => "audited_organizations",
            Self::AuditedSpaces => "audited_spaces",
            Self::BillingManagedOrganizations => "billing_managed_organizations",
            Self::ManagedOrganizations => "managed_organizations",
            Self::ManagedSpaces => "managed_spaces",
            Self::Organizations => "organizations",
            Self::Spaces => "spaces",
        }
    }

    /// Parse `relation_type` and keep it only when it applies to `kind`.
    #[must_use]
    pub fn for_kind(relation_type: &str, kind: &str) -> Option<Self> {
        relation_type
            .parse::<Self>()
            .ok()
            .filter(|relation| relation.scope().kind().as_str() == kind)
    }
}

impl FromStr for UserRelationType {
    type Err = UnknownRelationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|relation| relation.to_string() == s)
            .ok_or_else(|| UnknownRelationType(s.to_string()))
    }
}

///
/// SpaceRoleState
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SpaceRoleState {
    pub org_id: Option<Guid>,
    pub is_manager: bool,
    pub is_auditor: bool,
    pub is_developer: bool,
}

///
/// OrgRoleState
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct OrgRoleState {
    pub is_manager: bool,
    pub is_billing_manager: bool,
    pub is_auditor: bool,
    pub is_user: bool,
    #[serde(default)]
    pub space_guids: Vec<Guid>,
}

///
/// RoleState
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoleState {
    #[serde(default)]
    pub spaces: BTreeMap<Guid, SpaceRoleState>,
    #[serde(default)]
    pub organizations: BTreeMap<Guid, OrgRoleState>,
}

impl RoleState {
    #[must_use]
    pub fn space(&self, id: &str) -> Option<&SpaceRoleState> {
        self.spaces.get(id)
    }

    #[must_use]
    pub fn organization(&self, id: &str) -> Option<&OrgRoleState> {
        self.organizations.get(id)
    }

    /// Forget a deleted space or organization.
    pub fn remove(&mut self, kind: &str, id: &str) -> bool {
        if kind == cf::SPACE.as_str() {
            for org in self.organizations.values_mut() {
                org.space_guids.retain(|space| space.as_str() != id);
            }
            self.spaces.remove(id).is_some()
        } else if kind == cf::ORGANIZATION.as_str() {
            self.organizations.remove(id).is_some()
        } else {
            false
        }
    }
}

/// Apply one relation change to the role state.
///
/// Unknown relation types, and types whose scope does not match `kind`,
/// return `roles` unchanged. The first change seen for a space stamps its
/// owning org id; later changes never overwrite it.
///
/// Granting any space role, or any org role other than plain membership,
/// also grants the org `user` role. Revoking never cascades.
#[must_use]
pub fn apply_relation(
    mut roles: RoleState,
    entities: &EntityStore,
    kind: &str,
    id: &Guid,
    relation_type: &str,
    has_relation: bool,
) -> RoleState {
    let Some(relation) = UserRelationType::for_kind(relation_type, kind) else {
        debug!(relation_type, kind, id = %id, "ignoring relation change");
        return roles;
    };

    match relation.scope() {
        RelationScope::Space => {
            let org_id = {
                let state = roles.spaces.entry(id.clone()).or_default();
                if state.org_id.is_none() {
                    state.org_id = owning_org(entities, id);
                }
                match relation {
                    UserRelationType::AuditedSpaces => state.is_auditor = has_relation,
                    UserRelationType::ManagedSpaces => state.is_manager = has_relation,
                    _ => state.is_developer = has_relation,
                }
                state.org_id.clone()
            };

            if let Some(org_id) = org_id {
                let org = roles.organizations.entry(org_id).or_default();
                if !org.space_guids.contains(id) {
                    org.space_guids.push(id.clone());
                }
                org.is_user |= has_relation;
            }
        }
        RelationScope::Organization => {
            let state = roles.organizations.entry(id.clone()).or_default();
            match relation {
                UserRelationType::AuditedOrganizations => state.is_auditor = has_relation,
                UserRelationType::BillingManagedOrganizations => {
                    state.is_billing_manager = has_relation;
                }
                UserRelationType::ManagedOrganizations => state.is_manager = has_relation,
                _ => state.is_user = has_relation,
            }
            if relation != UserRelationType::Organizations {
                state.is_user |= has_relation;
            }
        }
    }

    roles
}

/// Org guid of a cached space: `organization_guid`, else the normalized
/// `organization` reference.
fn owning_org(entities: &EntityStore, space: &Guid) -> Option<Guid> {
    let record = entities.get(cf::SPACE.as_str(), space.as_str())?;

    ["organization_guid", "organization"]
        .into_iter()
        .find_map(|field| match record.entity.get(field) {
            Some(Value::String(guid)) if !guid.is_empty() => Some(Guid::new(guid.as_str())),
            _ => None,
        })
}
