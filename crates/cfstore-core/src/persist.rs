//! JSON snapshot of the full store state: entities, request info,
//! pagination sections, and role state.

use crate::db::StoreState;
use thiserror::Error as ThisError;

///
/// PersistError
///

#[derive(Debug, ThisError)]
pub enum PersistError {
    #[error("failed to encode store state: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode store state: {0}")]
    Decode(#[source] serde_json::Error),
}

pub fn to_json(state: &StoreState) -> Result<String, PersistError> {
    serde_json::to_string(state).map_err(PersistError::Encode)
}

pub fn to_json_pretty(state: &StoreState) -> Result<String, PersistError> {
    serde_json::to_string_pretty(state).map_err(PersistError::Encode)
}

pub fn from_json(json: &str) -> Result<StoreState, PersistError> {
    serde_json::from_str(json).map_err(PersistError::Decode)
}
