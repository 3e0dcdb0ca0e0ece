//! Entity schema registry: the kinds a store can hold, where each kind keeps
//! its unique key, and which nested relations the normalizer must follow.

pub mod cf;
pub mod error;
pub mod node;
pub mod registry;
pub mod types;
pub mod validate;

/// Maximum length for entity kind identifiers.
pub const MAX_KIND_LEN: usize = 64;

/// Maximum length for relation field identifiers.
pub const MAX_FIELD_NAME_LEN: usize = 64;

use crate::{error::ErrorTree, registry::RegistryError};
use thiserror::Error as ThisError;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        err,
        error::ErrorTree,
        node::*,
        registry::{RegistryError, SchemaRegistry},
        types::{Cardinality, KeyPath},
    };
    pub use serde::{Deserialize, Serialize};
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("schema validation failed:\n{0}")]
    Validation(ErrorTree),
}
