use super::SectionKey;
use crate::model::Guid;
use serde_json::Value;
use std::collections::BTreeMap;

///
/// PageFetchRequest
///
/// What a [`PageFetcher`] is asked to load. The fetcher owns transport and
/// reports back through `on_page_success` / `on_page_error`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageFetchRequest {
    pub section: SectionKey,
    pub page: u32,
    pub page_size: usize,
    pub params: BTreeMap<String, Value>,
}

///
/// PageFetcher
///

pub trait PageFetcher {
    fn fetch(&mut self, request: PageFetchRequest);
}

impl<F> PageFetcher for F
where
    F: FnMut(PageFetchRequest),
{
    fn fetch(&mut self, request: PageFetchRequest) {
        self(request);
    }
}

///
/// PageRequestOutcome
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PageRequestOutcome {
    /// The page was marked busy and handed to the fetcher.
    Dispatched,

    /// The request lay beyond the last maxed page; nothing was fetched and
    /// `ids` are that page's last known ids.
    Maxed { page: u32, ids: Vec<Guid> },
}

impl PageRequestOutcome {
    #[must_use]
    pub const fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched)
    }
}
