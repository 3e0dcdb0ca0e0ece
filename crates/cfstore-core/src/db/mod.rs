//! Module: db
//! Responsibility: the store service. Owns the current state snapshot,
//! routes events to the merge engine, tracker, pagination and relation
//! modules, and notifies observers.
//! Does not own: transport. Fetchers live outside and report back through
//! events.
//!
//! State is held behind an `Arc` and replaced as a whole on change; a
//! snapshot handed out earlier never changes underneath its holder.

mod dispatch;


use crate::{
    config::StoreConfig,
    error::InternalError,
    model::{EntityRecord, Guid},
    normalize::denormalize,
    obs::sink::{GLOBAL_METRICS_SINK, MetricsEvent, MetricsSink},
    pagination::{LocalPage, PageFetcher, PageRequestOutcome, PaginationState, SectionKey},
    relation::RoleState,
    request::{RequestInfo, RequestTracker},
    store::EntityStore,
};
use cfstore_schema::{cf, registry::SchemaRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, sync::Arc};

/// Page-size query param understood by the Cloud Foundry v2 API.
pub const RESULTS_PER_PAGE_PARAM: &str = "results-per-page";

///
/// StoreState
///
/// Everything the store knows. Serializable as a whole for session resume.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct StoreState {
    #[serde(default)]
    pub entities: EntityStore,
    #[serde(default)]
    pub requests: RequestTracker,
    #[serde(default)]
    pub pagination: PaginationState,
    #[serde(default)]
    pub roles: RoleState,
}

///
/// Outcome
///
/// Result of one dispatch. `Recorded` means a response could not be
/// applied and the failure was written into request or page state instead.
/// `Rejected` events changed nothing.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Applied,
    Unchanged,
    Recorded(InternalError),
    Rejected(InternalError),
}

impl Outcome {
    #[must_use]
    pub const fn changed_state(&self) -> bool {
        matches!(self, Self::Applied | Self::Recorded(_))
    }
}

///
/// SubscriptionId
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&Arc<StoreState>)>;

///
/// Store
///

pub struct Store {
    state: Arc<StoreState>,
    registry: Arc<SchemaRegistry>,
    config: StoreConfig,
    metrics: Option<&'static dyn MetricsSink>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl Store {
    #[must_use]
    pub fn new(registry: SchemaRegistry) -> Self {
        Self::from_state(registry, StoreState::default())
    }

    /// Store over the built-in Cloud Foundry registry.
    pub fn cloud_foundry() -> Result<Self, InternalError> {
        Ok(Self::new(cf::registry()?))
    }

    /// Resume from a previously persisted state.
    #[must_use]
    pub fn from_state(registry: SchemaRegistry, state: StoreState) -> Self {
        Self {
            state: Arc::new(state),
            registry: Arc::new(registry),
            config: StoreConfig::default(),
            metrics: None,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Route this store's counters to `sink` instead of the global one.
    #[must_use]
    pub fn with_metrics_sink(mut self, sink: &'static dyn MetricsSink) -> Self {
        self.metrics = Some(sink);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &StoreState {
        &self.state
    }

    /// Shared handle to the current state; unaffected by later dispatches.
    #[must_use]
    pub fn snapshot(&self) -> Arc<StoreState> {
        Arc::clone(&self.state)
    }

    ///
    /// OBSERVERS
    ///

    /// Register an observer, called synchronously after every dispatch
    /// that changed state.
    pub fn subscribe(&mut self, observer: impl FnMut(&Arc<StoreState>) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));

        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);

        self.observers.len() != before
    }

    ///
    /// READS
    ///

    #[must_use]
    pub fn entity(&self, kind: &str, id: &str) -> EntityView<'_> {
        EntityView {
            record: self.state.entities.get(kind, id),
            request: self.state.requests.get(kind, id),
        }
    }

    /// The section's current server page, resolved against the cache.
    #[must_use]
    pub fn page(&self, section: &SectionKey) -> PageView<'_> {
        let Some(state) = self.state.pagination.section(section) else {
            return PageView::empty();
        };

        let request = state.current_request();
        let kind = request
            .and_then(|req| req.kind.as_ref())
            .unwrap_or(&section.kind);
        let ids = state.current_ids().to_vec();
        let entities = ids
            .iter()
            .filter_map(|id| self.state.entities.get(kind.as_str(), id.as_str()))
            .collect();

        PageView {
            current_page: state.current_page,
            ids,
            entities,
            busy: request.is_some_and(|req| req.busy),
            error: request.is_some_and(|req| req.error),
            message: request.and_then(|req| req.message.as_deref()),
            maxed: state.is_maxed(),
            total_results: state.total_results,
        }
    }

    /// Local page over everything loaded for the section, using the
    /// section's stored client config.
    #[must_use]
    pub fn local_page(&self, section: &SectionKey) -> LocalPage {
        let entities = &self.state.entities;
        self.state
            .pagination
            .local_page(section, |id| entities.get(section.kind.as_str(), id.as_str()))
    }

    #[must_use]
    pub fn is_maxed(&self, section: &SectionKey) -> bool {
        self.state.pagination.is_maxed(section)
    }

    /// Nested raw form of cached entities.
    pub fn denormalize(&self, kind: &str, ids: &[Guid]) -> Result<Value, InternalError> {
        denormalize(&self.registry, kind, ids, self.state.entities.as_map()).map_err(Into::into)
    }

    ///
    /// PAGINATION
    ///

    /// Request a server page. The page size comes from the section's
    /// `results-per-page` param, else the configured default.
    pub fn request_page(
        &mut self,
        section: &SectionKey,
        page: u32,
        fetcher: &mut impl PageFetcher,
    ) -> PageRequestOutcome {
        let page_size = self.page_size(section);
        let outcome = Arc::make_mut(&mut self.state)
            .pagination
            .request_page(section, page, page_size, fetcher);

        match &outcome {
            PageRequestOutcome::Dispatched => self.notify(),
            PageRequestOutcome::Maxed { .. } => self.record(MetricsEvent::PageSuppressed {
                kind: section.kind.as_str(),
            }),
        }

        outcome
    }

    pub(crate) fn page_size(&self, section: &SectionKey) -> usize {
        self.state
            .pagination
            .section(section)
            .and_then(|state| state.params.get(RESULTS_PER_PAGE_PARAM))
            .and_then(param_as_usize)
            .filter(|size| *size > 0)
            .unwrap_or(self.config.default_page_size)
    }

    ///
    /// INTERNAL
    ///

    fn record(&self, event: MetricsEvent<'_>) {
        match self.metrics {
            Some(sink) => sink.record(event),
            None => GLOBAL_METRICS_SINK.record(event),
        }
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let state = &self.state;
        for (_, observer) in &mut self.observers {
            observer(state);
        }
        self.record(MetricsEvent::Notify {
            observers: u64::try_from(self.observers.len()).unwrap_or(u64::MAX),
        });
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

fn param_as_usize(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

///
/// EntityView
///

#[derive(Clone, Copy, Debug)]
pub struct EntityView<'a> {
    pub record: Option<&'a EntityRecord>,
    pub request: Option<&'a RequestInfo>,
}

impl EntityView<'_> {
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.request.is_some_and(RequestInfo::is_busy)
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.request.is_some_and(|req| req.error)
    }
}

///
/// PageView
///

#[derive(Clone, Debug)]
pub struct PageView<'a> {
    pub current_page: u32,
    pub ids: Vec<Guid>,

    /// Cached records for `ids`, in order; uncached ids are skipped.
    pub entities: Vec<&'a EntityRecord>,
    pub busy: bool,
    pub error: bool,
    pub message: Option<&'a str>,
    pub maxed: bool,
    pub total_results: u64,
}

impl PageView<'_> {
    fn empty() -> Self {
        Self {
            current_page: 1,
            ids: Vec::new(),
            entities: Vec::new(),
            busy: false,
            error: false,
            message: None,
            maxed: false,
            total_results: 0,
        }
    }
}
