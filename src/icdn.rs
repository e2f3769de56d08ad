// iCDN service client: record lookup, search, listing, upload and removal.

use std::collections::BTreeMap;

use tracing::info;

use crate::api::{self, ApiClient, Profile};
use crate::error::Result;
use crate::models::{FileRecord, Mutation, StoreStats};
use crate::search::{Query, SearchSpec};
use crate::upload::{self, NewRecord, RecordPatch};

pub const DEFAULT_URL: &str = "https://dmmdgm.dev";

/// Endpoint layout of one server generation. Generations are not negotiated;
/// the layout follows the configured profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub record: &'static str,
    pub listing: &'static str,
    pub stats: &'static str,
}

impl Endpoints {
    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::StatusDriven => Endpoints {
                record: "/query",
                listing: "/list",
                stats: "/details",
            },
            Profile::Envelope => Endpoints {
                record: "/data",
                listing: "/all",
                stats: "/store",
            },
        }
    }
}

pub struct Icdn {
    api: ApiClient,
    endpoints: Endpoints,
}

impl Icdn {
    pub fn new(base_url: impl Into<String>, profile: Profile) -> Self {
        Icdn {
            api: ApiClient::new(base_url, profile),
            endpoints: Endpoints::for_profile(profile),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn close(&self) {
        self.api.close();
    }

    /// Fetch one record's metadata.
    pub async fn query(&self, uuid: &str) -> Result<FileRecord> {
        let endpoint = format!("{}/{}", self.endpoints.record, urlencoding::encode(uuid));
        self.api.json(&endpoint, &[], None).await
    }

    /// Raw content bytes of a record.
    pub async fn file(&self, uuid: &str, token: Option<&str>) -> Result<Vec<u8>> {
        let endpoint = format!("/file/{}", urlencoding::encode(uuid));
        self.api.request(&endpoint, &token_param(token), None).await
    }

    /// Raw content addressed by scope and path.
    pub async fn scoped_file(&self, scope: &str, path: &str, token: Option<&str>) -> Result<Vec<u8>> {
        let endpoint = format!("/files/{}/{}", urlencoding::encode(scope), api::encode_path(path));
        self.api.request(&endpoint, &token_param(token), None).await
    }

    /// Deferred filtered search.
    pub fn search(&self, spec: &SearchSpec) -> Query<'_> {
        Query::new(&self.api, "/search", spec.params())
    }

    /// Deferred unfiltered listing; `page` is zero-based.
    pub fn list(&self, count: u32, page: u32) -> Query<'_> {
        let mut params = BTreeMap::new();
        params.insert("count", count.to_string());
        params.insert("page", page.to_string());
        Query::new(&self.api, self.endpoints.listing, params)
    }

    pub async fn add(&self, record: NewRecord) -> Result<Mutation> {
        let form = record.into_form().await?;
        let outcome: Mutation = self.api.json("/add", &[], Some(form)).await?;
        if let Some(record) = outcome.record() {
            info!(uuid = %record.uuid, "record created");
        }
        Ok(outcome)
    }

    pub async fn update(&self, patch: RecordPatch) -> Result<Mutation> {
        let uuid = patch.uuid().to_string();
        let form = patch.into_form().await?;
        let outcome: Mutation = self.api.json("/update", &[], Some(form)).await?;
        if outcome.succeeded() {
            info!(%uuid, "record updated");
        }
        Ok(outcome)
    }

    pub async fn remove(&self, uuid: &str, token: Option<&str>) -> Result<Mutation> {
        let form = upload::removal_form(uuid, token)?;
        let outcome: Mutation = self.api.json("/remove", &[], Some(form)).await?;
        if outcome.succeeded() {
            info!(%uuid, "record removed");
        }
        Ok(outcome)
    }

    pub async fn details(&self) -> Result<StoreStats> {
        self.api.json(self.endpoints.stats, &[], None).await
    }
}

fn token_param(token: Option<&str>) -> Vec<(&'static str, String)> {
    token.map(|t| ("token", t.to_string())).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_profile_has_its_own_endpoint_layout() {
        assert_eq!(Endpoints::for_profile(Profile::StatusDriven).record, "/query");
        assert_eq!(Endpoints::for_profile(Profile::Envelope).record, "/data");
        assert_eq!(Endpoints::for_profile(Profile::StatusDriven).stats, "/details");
        assert_eq!(Endpoints::for_profile(Profile::Envelope).listing, "/all");
    }

    #[test]
    fn token_is_only_sent_when_present() {
        assert!(token_param(None).is_empty());
        assert_eq!(token_param(Some("t")), vec![("token", "t".to_string())]);
    }

    #[test]
    fn building_queries_does_not_open_a_connection() {
        let cdn = Icdn::new("http://localhost:9", Profile::Envelope);
        let _ = cdn.list(10, 2);
        let _ = cdn.search(&SearchSpec::default());
        assert_eq!(cdn.api().session().connections_opened(), 0);
    }
}
