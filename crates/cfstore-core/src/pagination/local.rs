//! In-memory paging over already-cached entities: filter, stable sort, slice.

use crate::{
    DEFAULT_LOCAL_PAGE_SIZE,
    model::{EntityRecord, Guid},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{cmp::Ordering, collections::BTreeMap};

///
/// ClientFilter
///
/// `string` is a case-insensitive substring match against `field`, or
/// against every top-level string field of the entity when `field` is unset.
/// Each entry in `items` must equal the value at its path exactly.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ClientFilter {
    #[serde(default)]
    pub string: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub items: BTreeMap<String, Value>,
}

impl ClientFilter {
    #[must_use]
    pub fn text(string: impl Into<String>) -> Self {
        Self {
            string: string.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn on_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_item(mut self, path: impl Into<String>, value: Value) -> Self {
        self.items.insert(path.into(), value);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.string.is_empty() && self.items.is_empty()
    }

    #[must_use]
    pub fn matches(&self, record: &EntityRecord) -> bool {
        self.matches_text(record)
            && self
                .items
                .iter()
                .all(|(path, expected)| record.lookup(path) == Some(expected))
    }

    fn matches_text(&self, record: &EntityRecord) -> bool {
        if self.string.is_empty() {
            return true;
        }
        let needle = self.string.to_lowercase();
        let contains = |value: &Value| {
            value
                .as_str()
                .is_some_and(|text| text.to_lowercase().contains(&needle))
        };

        match &self.field {
            Some(field) => record.lookup(field).is_some_and(contains),
            None => record.entity.values().any(contains),
        }
    }
}

///
/// SortDirection
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

///
/// SortSpec
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

///
/// ClientPageConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ClientPageConfig {
    pub page_size: usize,
    pub current_page: usize,
    #[serde(default)]
    pub filter: ClientFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
}

impl Default for ClientPageConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_LOCAL_PAGE_SIZE,
            current_page: 1,
            filter: ClientFilter::default(),
            sort: None,
        }
    }
}

impl ClientPageConfig {
    #[must_use]
    pub fn new(page_size: usize, current_page: usize) -> Self {
        Self {
            page_size,
            current_page,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: ClientFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }
}

///
/// ClientPagination
///
/// Local paging state kept on a section; `total_results` is the filtered
/// count from the last local page computation.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ClientPagination {
    #[serde(flatten)]
    pub config: ClientPageConfig,
    pub total_results: usize,
}

///
/// LocalPage
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LocalPage {
    pub ids: Vec<Guid>,

    /// Number of ids that passed the filter.
    pub total_results: usize,
    pub page_count: usize,
}

/// Compute one local page.
///
/// Ids that `resolve` cannot find are dropped before filtering. Never
/// fetches; the same inputs always give the same page.
pub fn local_page<'a, F>(ids: &[Guid], resolve: F, config: &ClientPageConfig) -> LocalPage
where
    F: Fn(&Guid) -> Option<&'a EntityRecord>,
{
    let mut rows: Vec<(&Guid, &EntityRecord)> = ids
        .iter()
        .filter_map(|id| resolve(id).map(|record| (id, record)))
        .filter(|(_, record)| config.filter.matches(record))
        .collect();

    if let Some(sort) = &config.sort {
        rows.sort_by(|(_, a), (_, b)| {
            let ordering = compare_values(a.lookup(&sort.field), b.lookup(&sort.field));
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    let total_results = rows.len();
    let ids = slice_local_page(&rows, config.page_size, config.current_page)
        .iter()
        .map(|(id, _)| (*id).clone())
        .collect();

    LocalPage {
        ids,
        total_results,
        page_count: page_count(total_results, config.page_size),
    }
}

/// Slice `[size * (page - 1), size * page)`, clamping both to at least 1.
#[must_use]
pub fn slice_local_page<T>(items: &[T], page_size: usize, page: usize) -> &[T] {
    let size = page_size.max(1);
    let start = size.saturating_mul(page.max(1) - 1);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(size).min(items.len());

    &items[start..end]
}

#[must_use]
pub const fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(if page_size == 0 { 1 } else { page_size })
}

/// Total order over optional JSON values for sorting.
///
/// Missing sorts first, then null, booleans, numbers, strings
/// (case-insensitive), arrays and objects. Values of one rank that cannot
/// be told apart compare equal, which keeps the sort stable.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => {
                let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            }
            (Value::String(a), Value::String(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (Value::Array(a), Value::Array(b)) => a.len().cmp(&b.len()),
            _ => rank(a).cmp(&rank(b)),
        },
    }
}

const fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
