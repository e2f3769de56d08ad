// Static file host: directory listings under `/d/` and raw files under `/f/`.

use crate::api::{self, ApiClient, Profile};
use crate::error::Result;

pub const DEFAULT_URL: &str = "https://static.dmmdgm.dev";

pub struct StaticHost {
    api: ApiClient,
}

impl StaticHost {
    pub fn new(base_url: impl Into<String>, profile: Profile) -> Self {
        StaticHost {
            api: ApiClient::new(base_url, profile),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn close(&self) {
        self.api.close();
    }

    /// Entry names of a directory; the empty path lists the root.
    pub async fn directory(&self, path: &str) -> Result<Vec<String>> {
        self.api.json(&format!("/d/{}", api::encode_path(path)), &[], None).await
    }

    pub async fn file(&self, path: &str) -> Result<Vec<u8>> {
        self.api.request(&format!("/f/{}", api::encode_path(path)), &[], None).await
    }
}
