//! Module: pagination
//! Responsibility: per-section page state, server page requests, and local
//! (in-memory) paging over cached ids.
//! Does not own: entity data or transport.
//!
//! Page state is stale-while-revalidate: a request marks its page busy but
//! keeps the page's previous ids until the response lands, and a failure
//! leaves them in place.

mod fetch;
mod local;


pub use fetch::{PageFetchRequest, PageFetcher, PageRequestOutcome};
pub use local::{
    ClientFilter, ClientPageConfig, ClientPagination, LocalPage, SortDirection, SortSpec,
    local_page, page_count, slice_local_page,
};

use crate::model::{EntityRecord, Guid};
use cfstore_schema::node::EntityKind;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

///
/// SectionKey
///
/// Names one logical paged list. Keys follow `endpoint:kind-purpose`, with
/// the endpoint prefix optional.
///

#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[display("{kind}/{key}")]
pub struct SectionKey {
    pub kind: EntityKind,
    pub key: String,
}

impl SectionKey {
    #[must_use]
    pub fn new(kind: impl Into<EntityKind>, purpose: &str) -> Self {
        let kind = kind.into();
        let key = format!("{kind}-{purpose}");

        Self { kind, key }
    }

    /// Scope the key to one endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.key = format!("{endpoint}:{}", self.key);
        self
    }

    /// Use `key` verbatim.
    #[must_use]
    pub fn raw(kind: impl Into<EntityKind>, key: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            key: key.into(),
        }
    }
}

///
/// PageRequest
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PageRequest {
    pub busy: bool,
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub maxed: bool,
    #[serde(default)]
    pub ids: Vec<Guid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,

    /// Kind of the entities on this page, for sections mixing kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntityKind>,
}

///
/// PaginationSection
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PaginationSection {
    pub current_page: u32,
    pub total_results: u64,
    #[serde(default)]
    pub page_requests: BTreeMap<u32, PageRequest>,
    #[serde(default)]
    pub ids: BTreeMap<u32, Vec<Guid>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
    #[serde(default)]
    pub client_pagination: ClientPagination,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_local_page: Option<u32>,
}

impl Default for PaginationSection {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_results: 0,
            page_requests: BTreeMap::new(),
            ids: BTreeMap::new(),
            params: BTreeMap::new(),
            client_pagination: ClientPagination::default(),
            forced_local_page: None,
        }
    }
}

impl PaginationSection {
    /// `forced_local_page` is authoritative when set; otherwise any maxed
    /// page maxes the section.
    #[must_use]
    pub fn is_maxed(&self) -> bool {
        match self.forced_local_page {
            Some(page) => self.page_requests.get(&page).is_some_and(|req| req.maxed),
            None => self.page_requests.values().any(|req| req.maxed),
        }
    }

    #[must_use]
    pub fn last_maxed_page(&self) -> Option<u32> {
        self.page_requests
            .iter()
            .filter(|(_, req)| req.maxed)
            .map(|(page, _)| *page)
            .max()
    }

    #[must_use]
    pub fn current_request(&self) -> Option<&PageRequest> {
        self.page_requests.get(&self.current_page)
    }

    #[must_use]
    pub fn current_ids(&self) -> &[Guid] {
        self.ids.get(&self.current_page).map_or(&[], Vec::as_slice)
    }

    /// Ids of every loaded page, in page order.
    #[must_use]
    pub fn all_ids(&self) -> Vec<Guid> {
        self.ids.values().flatten().cloned().collect()
    }

    /// First page holding entities of `kind`.
    #[must_use]
    pub fn entity_page_request(&self, kind: &str) -> Option<(u32, &PageRequest)> {
        self.page_requests
            .iter()
            .find(|(_, req)| req.kind.as_ref().is_some_and(|k| k.as_str() == kind))
            .map(|(page, req)| (*page, req))
    }

    fn clear_pages(&mut self) {
        self.page_requests.clear();
        self.ids.clear();
        self.forced_local_page = None;
    }

    /// Fresh section carrying over params and the client page size.
    fn reset(&mut self) {
        let params = std::mem::take(&mut self.params);
        let page_size = self.client_pagination.config.page_size;

        *self = Self {
            params,
            ..Self::default()
        };
        self.client_pagination.config.page_size = page_size;
    }
}

///
/// PaginationState
///
/// Kind → section key → section.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PaginationState {
    sections: BTreeMap<EntityKind, BTreeMap<String, PaginationSection>>,
}

impl PaginationState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn section(&self, key: &SectionKey) -> Option<&PaginationSection> {
        self.sections.get(key.kind.as_str())?.get(&key.key)
    }

    /// Every section of `kind`, by key.
    pub fn sections_of<'a>(
        &'a self,
        kind: &str,
    ) -> impl Iterator<Item = (&'a String, &'a PaginationSection)> + 'a {
        self.sections.get(kind).into_iter().flatten()
    }

    #[must_use]
    pub fn is_maxed(&self, key: &SectionKey) -> bool {
        self.section(key).is_some_and(PaginationSection::is_maxed)
    }

    /// Mark `page` busy without dispatching anything; prior ids and the
    /// maxed flag stay until the response resolves.
    pub fn start_page(&mut self, key: &SectionKey, page: u32, page_size: Option<usize>) {
        let request = self.section_mut(key).page_requests.entry(page.max(1)).or_default();
        request.busy = true;
        request.error = false;
        request.message = None;
        if page_size.is_some() {
            request.page_size = page_size;
        }
    }

    /// Request a page from the server through `fetcher`.
    ///
    /// Pages past the last maxed page do not exist; asking for one returns
    /// that maxed page's ids without calling the fetcher.
    pub fn request_page(
        &mut self,
        key: &SectionKey,
        page: u32,
        page_size: usize,
        fetcher: &mut impl PageFetcher,
    ) -> PageRequestOutcome {
        let page = page.max(1);
        let section = self.section_mut(key);

        if let Some(last) = section.last_maxed_page().filter(|last| page > *last) {
            debug!(section = %key, page, last, "page request beyond maxed page suppressed");
            let ids = section.ids.get(&last).cloned().unwrap_or_default();
            return PageRequestOutcome::Maxed { page: last, ids };
        }

        let params = section.params.clone();
        self.start_page(key, page, Some(page_size));
        fetcher.fetch(PageFetchRequest {
            section: key.clone(),
            page,
            page_size,
            params,
        });

        PageRequestOutcome::Dispatched
    }

    pub fn on_page_success(
        &mut self,
        key: &SectionKey,
        page: u32,
        ids: Vec<Guid>,
        total_results: Option<u64>,
    ) {
        let kind = key.kind.clone();
        self.on_page_success_of(key, page, &kind, ids, total_results, None);
    }

    /// Record a fetched page whose entities are of `kind`.
    ///
    /// The page is maxed when fewer ids arrived than were requested. The
    /// size recorded when the page was started wins over `page_size`.
    pub fn on_page_success_of(
        &mut self,
        key: &SectionKey,
        page: u32,
        kind: &EntityKind,
        ids: Vec<Guid>,
        total_results: Option<u64>,
        page_size: Option<usize>,
    ) {
        let page = page.max(1);
        let section = self.section_mut(key);
        let request = section.page_requests.entry(page).or_default();

        request.page_size = request.page_size.or(page_size);
        request.busy = false;
        request.error = false;
        request.message = None;
        request.maxed = request.page_size.is_some_and(|size| ids.len() < size);
        request.kind = Some(kind.clone());
        request.ids.clone_from(&ids);
        section.ids.insert(page, ids);

        if let Some(total) = total_results {
            section.total_results = total;
        }
    }

    /// Set the busy and error flags of `page`, or of the current page,
    /// outside a fetch. Ids and the maxed flag are untouched.
    pub fn set_page_busy(
        &mut self,
        key: &SectionKey,
        page: Option<u32>,
        busy: bool,
        error: Option<&str>,
    ) {
        let section = self.section_mut(key);
        let page = page.unwrap_or(section.current_page).max(1);
        let request = section.page_requests.entry(page).or_default();

        request.busy = busy;
        request.error = error.is_some();
        request.message = error.map(str::to_string);
    }

    /// Record a failed page fetch. Prior ids are retained.
    pub fn on_page_error(&mut self, key: &SectionKey, page: u32, message: &str) {
        let request = self.section_mut(key).page_requests.entry(page.max(1)).or_default();
        request.busy = false;
        request.error = true;
        request.message = Some(message.to_string());
    }

    pub fn set_current_page(&mut self, key: &SectionKey, page: u32) {
        self.section_mut(key).current_page = page.max(1);
    }

    /// Move to `page`.
    ///
    /// `force_local` pins the section to that page for maxed detection and
    /// implies `keep_pages`. Without `keep_pages` every other page is dropped.
    pub fn set_page(&mut self, key: &SectionKey, page: u32, keep_pages: bool, force_local: bool) {
        let page = page.max(1);
        let section = self.section_mut(key);

        section.current_page = page;
        section.forced_local_page = force_local.then_some(page);
        if !(keep_pages || force_local) {
            section.page_requests.retain(|p, _| *p == page);
            section.ids.retain(|p, _| *p == page);
        }
    }

    pub fn clear_pages(&mut self, key: &SectionKey) {
        self.section_mut(key).clear_pages();
    }

    /// Reset a section to its initial state; params and the client page
    /// size survive.
    pub fn reset(&mut self, key: &SectionKey) {
        self.section_mut(key).reset();
    }

    /// Create a section if absent, optionally copying the section stored
    /// under `seed` (same kind). Returns `false` if it already existed.
    pub fn create(&mut self, key: &SectionKey, seed: Option<&str>) -> bool {
        let sections = self.sections.entry(key.kind.clone()).or_default();
        if sections.contains_key(&key.key) {
            return false;
        }

        let section = seed
            .and_then(|seed| sections.get(seed))
            .cloned()
            .unwrap_or_default();
        sections.insert(key.key.clone(), section);

        true
    }

    pub fn set_result_count(&mut self, key: &SectionKey, count: u64) {
        let section = self.section_mut(key);
        section.total_results = count;
        section.client_pagination.total_results = usize::try_from(count).unwrap_or(usize::MAX);
    }

    pub fn set_client_page_size(&mut self, key: &SectionKey, page_size: usize) {
        self.section_mut(key).client_pagination.config.page_size = page_size.max(1);
    }

    pub fn set_client_page(&mut self, key: &SectionKey, page: usize) {
        self.section_mut(key).client_pagination.config.current_page = page.max(1);
    }

    /// Replace the client filter; local paging restarts at page 1.
    pub fn set_client_filter(&mut self, key: &SectionKey, filter: ClientFilter) {
        let config = &mut self.section_mut(key).client_pagination.config;
        config.filter = filter;
        config.current_page = 1;
    }

    /// Store a full client config, as sent by a local page request.
    pub fn set_client_config(&mut self, key: &SectionKey, config: ClientPageConfig) {
        self.section_mut(key).client_pagination.config = ClientPageConfig {
            page_size: config.page_size.max(1),
            current_page: config.current_page.max(1),
            ..config
        };
    }

    /// Set server query params. `overwrite` replaces the whole set instead
    /// of merging; unless `keep_pages`, loaded pages are invalidated.
    pub fn set_params(
        &mut self,
        key: &SectionKey,
        params: BTreeMap<String, Value>,
        keep_pages: bool,
        overwrite: bool,
    ) {
        let section = self.section_mut(key);
        if overwrite {
            section.params = params;
        } else {
            section.params.extend(params);
        }
        if !keep_pages {
            section.clear_pages();
            section.current_page = 1;
        }
    }

    /// Seed params on a section that has none yet. Returns `false`, leaving
    /// the section as it was, once params are set.
    pub fn set_initial_params(
        &mut self,
        key: &SectionKey,
        params: BTreeMap<String, Value>,
        keep_pages: bool,
        overwrite: bool,
    ) -> bool {
        if self.section(key).is_some_and(|section| !section.params.is_empty()) {
            return false;
        }
        self.set_params(key, params, keep_pages, overwrite);

        true
    }

    pub fn add_params(
        &mut self,
        key: &SectionKey,
        params: BTreeMap<String, Value>,
        keep_pages: bool,
    ) {
        self.set_params(key, params, keep_pages, false);
    }

    pub fn remove_params(&mut self, key: &SectionKey, names: &[String], keep_pages: bool) {
        let section = self.section_mut(key);
        for name in names {
            section.params.remove(name);
        }
        if !keep_pages {
            section.clear_pages();
            section.current_page = 1;
        }
    }

    /// Remove `id` from every page of every section of `kind`, or only from
    /// `only_section` when given. Returns the number of sections touched.
    pub fn remove_id(&mut self, kind: &str, id: &str, only_section: Option<&str>) -> usize {
        let Some(sections) = self.sections.get_mut(kind) else {
            return 0;
        };

        let mut touched = 0;
        for (name, section) in sections.iter_mut() {
            if only_section.is_some_and(|only| only != name) {
                continue;
            }

            let mut removed = false;
            for ids in section.ids.values_mut() {
                let before = ids.len();
                ids.retain(|candidate| candidate.as_str() != id);
                removed |= ids.len() != before;
            }
            for request in section.page_requests.values_mut() {
                request.ids.retain(|candidate| candidate.as_str() != id);
            }

            if removed {
                section.total_results = section.total_results.saturating_sub(1);
                section.client_pagination.total_results =
                    section.client_pagination.total_results.saturating_sub(1);
                touched += 1;
            }
        }

        touched
    }

    /// Reset every section of `kind`.
    pub fn clear_of_type(&mut self, kind: &str) {
        if let Some(sections) = self.sections.get_mut(kind) {
            sections.values_mut().for_each(PaginationSection::reset);
        }
    }

    /// Drop one entity from the sections of its kind.
    pub fn clear_of_entity(&mut self, kind: &str, id: &str, section: Option<&str>) -> usize {
        self.remove_id(kind, id, section)
    }

    /// Flag a list as maxed when it holds more than `max` entities.
    ///
    /// The flag lands on the page holding `forced_kind` when given, else on
    /// the current page.
    pub fn update_maxed_state(
        &mut self,
        key: &SectionKey,
        max: usize,
        all_entities: usize,
        forced_kind: Option<&str>,
    ) {
        let section = self.section_mut(key);
        let page = forced_kind
            .and_then(|kind| section.entity_page_request(kind).map(|(page, _)| page))
            .unwrap_or(section.current_page);

        section.page_requests.entry(page).or_default().maxed = all_entities > max;
    }

    /// Local page over every loaded id of the section, using its stored
    /// client config.
    #[must_use]
    pub fn local_page<'a, F>(&self, key: &SectionKey, resolve: F) -> LocalPage
    where
        F: Fn(&Guid) -> Option<&'a EntityRecord>,
    {
        match self.section(key) {
            Some(section) => local_page(&section.all_ids(), resolve, &section.client_pagination.config),
            None => LocalPage::default(),
        }
    }

    /// Record the filtered count from a local page computation.
    pub(crate) fn set_local_total(&mut self, key: &SectionKey, total: usize) {
        self.section_mut(key).client_pagination.total_results = total;
    }

    fn section_mut(&mut self, key: &SectionKey) -> &mut PaginationSection {
        self.sections
            .entry(key.kind.clone())
            .or_default()
            .entry(key.key.clone())
            .or_default()
    }
}
