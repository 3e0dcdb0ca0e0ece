//! ## Crate layout
//! - `core`: normalizer, entity cache, request tracking, pagination,
//!   relation updates, and the event-driven store service.
//! - `schema`: entity kinds, key paths, relations, and the Cloud Foundry
//!   registry.
//!
//! Callers own transport. They fetch raw Cloud Foundry JSON themselves and
//! report each lifecycle step to a [`Store`](prelude::Store) as an event.

pub use cfstore_core as core;
pub use cfstore_schema as schema;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use core::{config::StoreConfig, error::InternalError as Error, persist};

///
/// Console Prelude
///

pub mod prelude {
    pub use crate::core::{
        db::{EntityView, PageView},
        pagination::{LocalPage, PageFetchRequest, PageFetcher, PageRequestOutcome},
        prelude::*,
        relation::{UserPermissionChange, UserRelationType},
    };
    pub use crate::schema::cf;
    pub use serde_json::{Value, json};
}
