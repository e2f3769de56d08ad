// Resource models decoded from service payloads.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One stored file: server-side metadata plus arbitrary user data.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub uuid: String,
    pub name: String,
    pub mime: String,
    pub size: u64,
    pub tags: Vec<String>,
    #[serde(with = "crate::time::millis")]
    pub time: DateTime<Local>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Snapshot of the store's limits and usage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub file_limit: u64,
    pub store_limit: u64,
    /// Number of records currently stored.
    pub store_length: u64,
    /// Total size of stored content in bytes.
    pub store_size: u64,
    pub protected: bool,
}

impl StoreStats {
    /// Used share of the store as a percentage, `0.0` when the limit is zero.
    pub fn usage_percent(&self) -> f64 {
        if self.store_limit == 0 {
            return 0.0;
        }
        self.store_size as f64 / self.store_limit as f64 * 100.0
    }
}

/// Result of a create, update or remove call. Older server generations only
/// acknowledge mutations with a boolean.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Mutation {
    Record(FileRecord),
    Acknowledged(bool),
}

impl Mutation {
    pub fn record(&self) -> Option<&FileRecord> {
        match self {
            Mutation::Record(record) => Some(record),
            Mutation::Acknowledged(_) => None,
        }
    }

    pub fn succeeded(&self) -> bool {
        match self {
            Mutation::Record(_) => true,
            Mutation::Acknowledged(ok) => *ok,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

/// Catalogue entry from the data service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Anime {
    pub id: String,
    pub name: String,
    pub title: String,
    pub tags: Vec<String>,
    #[serde(default, with = "crate::time::date_only")]
    pub begin: Option<NaiveDate>,
    #[serde(default, with = "crate::time::date_only")]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub wiki: Option<String>,
}

/// An [`Anime`] entry plus the users who played it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Game {
    #[serde(flatten)]
    pub entry: Anime,
    pub users: Vec<String>,
}
