//! Paginated collections over an in-memory array.
//!
//! # Design
//! Entries wrap the data with a caller-chosen key, so data types are not
//! forced to carry an `id`. Queries carry search, filters and sorting for
//! forward compatibility, but only `offset`/`limit` are applied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sorting {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Flag(bool),
}

pub type Filters = BTreeMap<String, FilterValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry<D> {
    pub key: String,
    pub data: D,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub offset: usize,
    pub limit: usize,
    #[serde(default)]
    pub filters: Filters,
    #[serde(default)]
    pub sorting: Vec<Sorting>,
}

impl Default for CollectionQuery {
    fn default() -> Self {
        Self {
            search: None,
            offset: 0,
            limit: 10,
            filters: Filters::new(),
            sorting: Vec::new(),
        }
    }
}

/// The query a set of entries was produced for, plus counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    #[serde(flatten)]
    pub query: CollectionQuery,
    pub total_count: usize,
    pub filtered_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntriesOperation {
    Append,
    #[default]
    Replace,
}

/// Collection served from a data array.
#[derive(Debug, Clone)]
pub struct ArrayCollection<D> {
    key: String,
    is_fetching: bool,
    has_initial_fetch_been_done: bool,
    entries: Vec<Entry<D>>,
    latest_query_info: Option<CollectionInfo>,
    available: Vec<Entry<D>>,
    create_entry_key: fn(&D) -> String,
}

impl<D: Clone> ArrayCollection<D> {
    /// Wrap `data`; the first page is loaded right away.
    pub fn new(data: Vec<D>, create_entry_key: fn(&D) -> String) -> Self {
        let mut collection = Self {
            key: Uuid::new_v4().to_string(),
            is_fetching: false,
            has_initial_fetch_been_done: false,
            entries: Vec::new(),
            latest_query_info: None,
            available: Vec::new(),
            create_entry_key,
        };
        collection.set_data(data);
        collection
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_fetching(&self) -> bool {
        self.is_fetching
    }

    pub fn has_initial_fetch_been_done(&self) -> bool {
        self.has_initial_fetch_been_done
    }

    pub fn entries(&self) -> &[Entry<D>] {
        &self.entries
    }

    pub fn latest_query_info(&self) -> Option<&CollectionInfo> {
        self.latest_query_info.as_ref()
    }

    /// Replace the backing data and re-apply the latest query.
    pub fn set_data(&mut self, data: Vec<D>) {
        let create_entry_key = self.create_entry_key;
        self.available = data
            .into_iter()
            .map(|data| Entry {
                key: create_entry_key(&data),
                data,
            })
            .collect();
        let query = self
            .latest_query_info
            .as_ref()
            .map(|info| info.query.clone())
            .unwrap_or_default();
        self.apply(query, EntriesOperation::Replace);
    }

    pub fn fetch(&mut self, query: CollectionQuery, op: EntriesOperation) {
        self.is_fetching = true;
        self.apply(query, op);
    }

    /// Default query merged with the latest one, ready to be adjusted for
    /// the next page.
    pub fn next_query(&self) -> CollectionQuery {
        self.latest_query_info
            .as_ref()
            .map(|info| info.query.clone())
            .unwrap_or_default()
    }

    fn apply(&mut self, query: CollectionQuery, op: EntriesOperation) {
        let page: Vec<Entry<D>> = self
            .available
            .iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect();
        match op {
            EntriesOperation::Append => self.entries.extend(page),
            EntriesOperation::Replace => self.entries = page,
        }
        self.latest_query_info = Some(CollectionInfo {
            query,
            total_count: self.available.len(),
            filtered_count: self.available.len(),
        });
        self.has_initial_fetch_been_done = true;
        self.is_fetching = false;
    }
}
