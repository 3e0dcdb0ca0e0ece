//! Events accepted by [`Store::dispatch`](crate::db::Store::dispatch).
//!
//! The set is closed; the store matches every variant explicitly.

use crate::{
    model::{Fields, Guid},
    pagination::{ClientFilter, ClientPageConfig, SectionKey},
    relation::UserPermissionChange,
    store::MergeMode,
};
use cfstore_schema::node::EntityKind;
use serde_json::Value;
use std::collections::BTreeMap;

///
/// FetchTarget
///
/// What a fetch was for: one entity, or one page of a section.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FetchTarget {
    Entity(Guid),
    Page { section: SectionKey, page: u32 },
}

impl FetchTarget {
    #[must_use]
    pub fn page(section: SectionKey, page: u32) -> Self {
        Self::Page { section, page }
    }
}

///
/// Event
///

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    FetchStarted {
        kind: EntityKind,
        target: FetchTarget,
    },
    FetchSucceeded {
        kind: EntityKind,
        target: FetchTarget,
        response: Value,
        mode: MergeMode,
    },
    FetchFailed {
        kind: EntityKind,
        target: FetchTarget,
        message: String,
    },

    UpdateStarted {
        kind: EntityKind,
        id: Guid,
        operation: String,
    },
    /// `response`, when present, is the updated resource as returned by the
    /// API and is merged as a patch.
    UpdateSucceeded {
        kind: EntityKind,
        id: Guid,
        operation: String,
        response: Option<Value>,
    },
    UpdateFailed {
        kind: EntityKind,
        id: Guid,
        operation: String,
        message: String,
    },

    CreateStarted {
        kind: EntityKind,
        id: Guid,
    },
    CreateSucceeded {
        kind: EntityKind,
        id: Guid,
        response: Value,
    },
    CreateFailed {
        kind: EntityKind,
        id: Guid,
        message: String,
    },

    DeleteStarted {
        kind: EntityKind,
        id: Guid,
    },
    DeleteSucceeded {
        kind: EntityKind,
        id: Guid,
    },
    DeleteFailed {
        kind: EntityKind,
        id: Guid,
        message: String,
    },

    RelationChanged {
        kind: EntityKind,
        id: Guid,
        relation_type: String,
        has_relation: bool,
    },
    PermissionChanged(UserPermissionChange),
    /// A space quota definition was associated with `space`; `response` is
    /// the quota definition resource returned by the API.
    SpaceQuotaAssociated {
        space: Guid,
        response: Value,
    },
    SpaceQuotaDisassociated {
        space: Guid,
    },

    LocalPageRequested {
        section: SectionKey,
        config: ClientPageConfig,
    },
    SetPage {
        section: SectionKey,
        page: u32,
        keep_pages: bool,
        force_local: bool,
    },
    SetClientPageSize {
        section: SectionKey,
        page_size: usize,
    },
    SetClientPage {
        section: SectionKey,
        page: usize,
    },
    SetClientFilter {
        section: SectionKey,
        filter: ClientFilter,
    },
    ClearPages {
        section: SectionKey,
    },
    ResetPagination {
        section: SectionKey,
    },
    CreatePagination {
        section: SectionKey,
        seed: Option<String>,
    },
    SetParams {
        section: SectionKey,
        params: BTreeMap<String, Value>,
        keep_pages: bool,
        overwrite: bool,
    },
    /// Like `SetParams`, but ignored once the section has params.
    SetInitialParams {
        section: SectionKey,
        params: BTreeMap<String, Value>,
        keep_pages: bool,
        overwrite: bool,
    },
    AddParams {
        section: SectionKey,
        params: BTreeMap<String, Value>,
        keep_pages: bool,
    },
    RemoveParams {
        section: SectionKey,
        params: Vec<String>,
        keep_pages: bool,
    },
    /// `page` defaults to the section's current page.
    SetPageBusy {
        section: SectionKey,
        page: Option<u32>,
        busy: bool,
        error: Option<String>,
    },
    SetResultCount {
        section: SectionKey,
        count: u64,
    },
    /// `max` defaults to the configured `max_local_results`.
    UpdateMaxedState {
        section: SectionKey,
        max: Option<usize>,
        all_entities: usize,
        forced_kind: Option<EntityKind>,
    },
    ClearPaginationOfType {
        kind: EntityKind,
    },
    ClearPaginationOfEntity {
        kind: EntityKind,
        id: Guid,
        section: Option<String>,
    },

    /// Overlay fields on a cached entity without a request lifecycle.
    Patch {
        kind: EntityKind,
        id: Guid,
        fields: Fields,
    },
}

impl Event {
    /// Stable snake_case name, used in logs and metrics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FetchStarted { .. } => "fetch_started",
            Self::FetchSucceeded { .. } => "fetch_succeeded",
            Self::FetchFailed { .. } => "fetch_failed",
            Self::UpdateStarted { .. } => "update_started",
            Self::UpdateSucceeded { .. } => "update_succeeded",
            Self::UpdateFailed { .. } => "update_failed",
            Self::CreateStarted { .. } => "create_started",
            Self::CreateSucceeded { .. } => "create_succeeded",
            Self::CreateFailed { .. } => "create_failed",
            Self::DeleteStarted { .. } => "delete_started",
            Self::DeleteSucceeded { .. } => "delete_succeeded",
            Self::DeleteFailed { .. } => "delete_failed",
            Self::RelationChanged { .. } => "relation_changed",
            Self::PermissionChanged(_) => "permission_changed",
            Self::SpaceQuotaAssociated { .. } => "space_quota_associated",
            Self::SpaceQuotaDisassociated { .. } => "space_quota_disassociated",
            Self::LocalPageRequested { .. } => "local_page_requested",
            Self::SetPage { .. } => "set_page",
            Self::SetClientPageSize { .. } => "set_client_page_size",
            Self::SetClientPage { .. } => "set_client_page",
            Self::SetClientFilter { .. } => "set_client_filter",
            Self::ClearPages { .. } => "clear_pages",
            Self::ResetPagination { .. } => "reset_pagination",
            Self::CreatePagination { .. } => "create_pagination",
            Self::SetParams { .. } => "set_params",
            Self::SetInitialParams { .. } => "set_initial_params",
            Self::AddParams { .. } => "add_params",
            Self::RemoveParams { .. } => "remove_params",
            Self::SetPageBusy { .. } => "set_page_busy",
            Self::SetResultCount { .. } => "set_result_count",
            Self::UpdateMaxedState { .. } => "update_maxed_state",
            Self::ClearPaginationOfType { .. } => "clear_pagination_of_type",
            Self::ClearPaginationOfEntity { .. } => "clear_pagination_of_entity",
            Self::Patch { .. } => "patch",
        }
    }
}
