use super::UserRelationType;
use crate::{model::Guid, store::EntityStore};
use cfstore_schema::cf;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

///
/// UserPermissionChange
///
/// A role granted to or revoked from a user on one org or space, reported
/// after the API call succeeded.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct UserPermissionChange {
    pub user: Guid,
    pub target: Guid,
    pub relation: UserRelationType,
    pub add: bool,
}

/// Add or remove `change.target` in the user's role collection.
///
/// Returns `false` when the user is not cached. Adding an existing guid
/// and removing an absent one leave the collection as it was.
pub fn apply_user_permission(entities: &mut EntityStore, change: &UserPermissionChange) -> bool {
    let Some(user) = entities.get_mut(cf::USER.as_str(), change.user.as_str()) else {
        debug!(user = %change.user, relation = %change.relation, "permission change for uncached user");
        return false;
    };

    let field = change.relation.collection_field();
    let target = Value::String(change.target.to_string());
    let mut collection = match user.entity.remove(field) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };

    if change.add {
        if !collection.contains(&target) {
            collection.push(target);
        }
    } else {
        collection.retain(|guid| guid != &target);
    }
    user.entity.insert(field.to_string(), Value::Array(collection));

    true
}
