use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::Record;

pub const DEFAULT_LIMIT: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Title,
    Price,
}

impl SortField {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "title" => Some(Self::Title),
            "price" => Some(Self::Price),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDir::Asc => ordering,
            SortDir::Desc => ordering.reverse(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SortSpecError {
    #[error("unknown sort field '{field}', expected title or price")]
    UnknownField { field: String },

    #[error("unknown sort direction '{dir}', expected asc or desc")]
    UnknownDirection { dir: String },
}

/// Parses a `field:dir` sort selector. An empty selector means no sorting and
/// a missing direction means ascending.
pub fn parse_sort_spec(value: &str) -> Result<(Option<SortField>, SortDir), SortSpecError> {
    let raw = value.trim();
    if raw.is_empty() {
        return Ok((None, SortDir::Asc));
    }
    let (field_raw, dir_raw) = match raw.split_once(':') {
        Some((f, d)) => (f, Some(d)),
        None => (raw, None),
    };
    let field = SortField::parse(field_raw).ok_or_else(|| SortSpecError::UnknownField {
        field: field_raw.trim().to_string(),
    })?;
    let dir = match dir_raw.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => SortDir::parse(d).ok_or_else(|| SortSpecError::UnknownDirection {
            dir: d.to_string(),
        })?,
        None => SortDir::Asc,
    };
    Ok((Some(field), dir))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryRequest {
    pub page: usize,
    pub limit: usize,
    pub search: String,
    pub sort_field: Option<SortField>,
    pub sort_dir: SortDir,
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
            search: String::new(),
            sort_field: None,
            sort_dir: SortDir::Asc,
        }
    }
}

impl QueryRequest {
    /// Page number clamped to at least 1.
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    /// Page size clamped to at least 1.
    pub fn limit(&self) -> usize {
        self.limit.max(1)
    }

    /// Index of the first record on the requested page.
    pub fn offset(&self) -> usize {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub data: Vec<Record>,
    pub total: usize,
}

/// Runs filter, sort and pagination over `records`.
///
/// `total` counts every record matching the search, independent of the
/// requested page. Sorting is stable, so records with equal keys keep their
/// insertion order.
pub fn query(records: &[Record], req: &QueryRequest) -> QueryResult {
    let needle = req.search.to_lowercase();
    let mut items: Vec<&Record> = records
        .iter()
        .filter(|r| matches_search(r, &needle))
        .collect();

    if let Some(field) = req.sort_field {
        match field {
            SortField::Title => {
                let mut keyed: Vec<(String, &Record)> = items
                    .into_iter()
                    .map(|r| (r.title_or_empty().to_lowercase(), r))
                    .collect();
                keyed.sort_by(|(a, _), (b, _)| req.sort_dir.apply(a.cmp(b)));
                items = keyed.into_iter().map(|(_, r)| r).collect();
            }
            SortField::Price => {
                items.sort_by(|a, b| req.sort_dir.apply(compare_price(a, b)));
            }
        }
    }

    let total = items.len();
    let data = items
        .into_iter()
        .skip(req.offset())
        .take(req.limit())
        .cloned()
        .collect();

    QueryResult { data, total }
}

/// Number of pages needed to show `total` records, never less than 1.
pub fn total_pages(total: usize, limit: usize) -> usize {
    let limit = limit.max(1);
    total.div_ceil(limit).max(1)
}

fn matches_search(record: &Record, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    record
        .title
        .as_deref()
        .map(|t| t.to_lowercase().contains(needle))
        .unwrap_or(false)
}

fn compare_price(a: &Record, b: &Record) -> Ordering {
    a.price_or_zero()
        .partial_cmp(&b.price_or_zero())
        .unwrap_or(Ordering::Equal)
}
