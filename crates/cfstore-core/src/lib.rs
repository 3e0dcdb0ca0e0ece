//! Core runtime for cfstore: the normalizer, the entity cache merge engine,
//! request-lifecycle tracking, pagination, relation updates, and the
//! event-driven store service that ties them together.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod event;
pub mod model;
pub mod normalize;
pub mod obs;
pub mod pagination;
pub mod persist;
pub mod relation;
pub mod request;
pub mod store;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// CONSTANTS
///

/// Cloud Foundry's default `results-per-page` for list endpoints.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Default page size for lists paged in memory.
pub const DEFAULT_LOCAL_PAGE_SIZE: usize = 9;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, sinks, or persistence helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{Outcome, Store, StoreState},
        event::{Event, FetchTarget},
        model::{EntityRecord, Guid},
        pagination::{ClientFilter, ClientPageConfig, SectionKey, SortDirection, SortSpec},
        store::MergeMode,
    };
    pub use cfstore_schema::node::EntityKind;
}
