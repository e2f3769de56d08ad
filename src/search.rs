// Query builder for search and listing endpoints.
//
// A `SearchSpec` is built once and never mutated; it flattens to the query
// string the server expects. A `Query` binds a parameter set to an endpoint
// and resolves it either to uuids or to full records.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Local};

use crate::api::ApiClient;
use crate::error::Result;
use crate::models::FileRecord;
use crate::time;

pub const DEFAULT_COUNT: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    Name,
    #[default]
    Time,
    Uuid,
    Size,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Time => "time",
            SortKey::Uuid => "uuid",
            SortKey::Size => "size",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable filter, pagination and sort specification.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpec {
    name: Option<String>,
    begin: Option<DateTime<Local>>,
    end: Option<DateTime<Local>>,
    minimum: Option<u64>,
    maximum: Option<u64>,
    uuid: Option<String>,
    mime: Option<String>,
    extension: Option<String>,
    tags: Option<Vec<String>>,
    loose: bool,
    count: u32,
    page: u32,
    sort: SortKey,
    order: SortOrder,
}

impl Default for SearchSpec {
    fn default() -> Self {
        SearchSpec {
            name: None,
            begin: None,
            end: None,
            minimum: None,
            maximum: None,
            uuid: None,
            mime: None,
            extension: None,
            tags: None,
            loose: false,
            count: DEFAULT_COUNT,
            page: 0,
            sort: SortKey::default(),
            order: SortOrder::default(),
        }
    }
}

impl SearchSpec {
    pub fn builder() -> SearchBuilder {
        SearchBuilder::default()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Flatten into query parameters. Unset filters produce no key at all.
    pub fn params(&self) -> BTreeMap<&'static str, String> {
        let mut params = BTreeMap::new();
        params.insert("count", self.count.to_string());
        params.insert("page", self.page.to_string());
        params.insert("loose", self.loose.to_string());
        params.insert("sort", self.sort.as_str().to_string());
        params.insert("order", self.order.as_str().to_string());

        let mut put = |key: &'static str, value: Option<String>| {
            if let Some(value) = value {
                params.insert(key, value);
            }
        };
        put("name", self.name.clone());
        put("begin", self.begin.as_ref().map(|t| time::to_millis(t).to_string()));
        put("end", self.end.as_ref().map(|t| time::to_millis(t).to_string()));
        put("minimum", self.minimum.map(|n| n.to_string()));
        put("maximum", self.maximum.map(|n| n.to_string()));
        put("uuid", self.uuid.clone());
        put("mime", self.mime.clone());
        put("extension", self.extension.clone());
        put(
            "tags",
            self.tags.as_ref().filter(|tags| !tags.is_empty()).map(|tags| tags.join(",")),
        );
        params
    }
}

/// Collects [`SearchSpec`] fields; every field is optional.
#[derive(Debug, Clone, Default)]
pub struct SearchBuilder {
    spec: SearchSpec,
}

impl SearchBuilder {
    /// Substring the record name must contain.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.spec.name = Some(name.into());
        self
    }

    /// Only records with a time after `begin`.
    pub fn begin(mut self, begin: DateTime<Local>) -> Self {
        self.spec.begin = Some(begin);
        self
    }

    /// Only records with a time before `end`.
    pub fn end(mut self, end: DateTime<Local>) -> Self {
        self.spec.end = Some(end);
        self
    }

    /// Minimum size in bytes, inclusive.
    pub fn minimum(mut self, bytes: u64) -> Self {
        self.spec.minimum = Some(bytes);
        self
    }

    /// Maximum size in bytes, inclusive.
    pub fn maximum(mut self, bytes: u64) -> Self {
        self.spec.maximum = Some(bytes);
        self
    }

    pub fn uuid(mut self, uuid: impl Into<String>) -> Self {
        self.spec.uuid = Some(uuid.into());
        self
    }

    pub fn mime(mut self, mime: impl Into<String>) -> Self {
        self.spec.mime = Some(mime.into());
        self
    }

    /// Extension without the leading dot.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.spec.extension = Some(extension.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Match when any filter matches instead of all of them.
    pub fn loose(mut self, loose: bool) -> Self {
        self.spec.loose = loose;
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.spec.count = count;
        self
    }

    /// Zero-based page index.
    pub fn page(mut self, page: u32) -> Self {
        self.spec.page = page;
        self
    }

    pub fn sort(mut self, sort: SortKey) -> Self {
        self.spec.sort = sort;
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.spec.order = order;
        self
    }

    pub fn build(self) -> SearchSpec {
        self.spec
    }
}

/// A deferred listing request. Resolving never mutates it, so both terminal
/// operations may be called any number of times.
pub struct Query<'a> {
    api: &'a ApiClient,
    endpoint: String,
    params: BTreeMap<&'static str, String>,
}

impl<'a> Query<'a> {
    pub(crate) fn new(api: &'a ApiClient, endpoint: impl Into<String>, params: BTreeMap<&'static str, String>) -> Self {
        Query {
            api,
            endpoint: endpoint.into(),
            params,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Parameters sent for the given execution mode.
    pub fn params_for(&self, full_records: bool) -> Vec<(&'static str, String)> {
        let mut pairs: Vec<_> = self.params.iter().map(|(key, value)| (*key, value.clone())).collect();
        pairs.push(("query", full_records.to_string()));
        pairs
    }

    /// Matching uuids in server order.
    pub async fn resolve_ids(&self) -> Result<Vec<String>> {
        self.api.json(&self.endpoint, &self.params_for(false), None).await
    }

    /// Matching records in server order.
    pub async fn resolve_records(&self) -> Result<Vec<FileRecord>> {
        self.api.json(&self.endpoint, &self.params_for(true), None).await
    }
}
