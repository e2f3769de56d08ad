// Data service: tag, anime and game catalogues.

use crate::api::{ApiClient, Profile};
use crate::error::Result;
use crate::models::{Anime, Game, Tag};

pub const DEFAULT_URL: &str = "https://dmmdgm.dev";

pub struct DataService {
    api: ApiClient,
}

impl DataService {
    pub fn new(base_url: impl Into<String>, profile: Profile) -> Self {
        DataService {
            api: ApiClient::new(base_url, profile),
        }
    }

    pub fn close(&self) {
        self.api.close();
    }

    pub async fn tags(&self) -> Result<Vec<Tag>> {
        self.api.json("/api/data/tags", &[], None).await
    }

    pub async fn anime(&self) -> Result<Vec<Anime>> {
        self.api.json("/api/data/anime", &[], None).await
    }

    pub async fn games(&self) -> Result<Vec<Game>> {
        self.api.json("/api/data/games", &[], None).await
    }
}
