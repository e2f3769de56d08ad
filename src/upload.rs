// Upload encoder: multipart payloads made of a `json` sidecar field and an
// optional `file` content part.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::time;

/// Everything needed to create a record.
#[derive(Debug, Clone)]
pub struct NewRecord {
    file: PathBuf,
    name: String,
    tags: Vec<String>,
    data: Map<String, Value>,
    time: Option<DateTime<Local>>,
    token: Option<String>,
}

#[derive(Serialize)]
struct CreateSidecar<'a> {
    data: &'a Map<String, Value>,
    name: &'a str,
    tags: &'a [String],
    time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<&'a str>,
}

impl NewRecord {
    pub fn new(file: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        NewRecord {
            file: file.into(),
            name: name.into(),
            tags: Vec::new(),
            data: Map::new(),
            time: None,
            token: None,
        }
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Record time; defaults to the moment the sidecar is encoded.
    pub fn time(mut self, time: DateTime<Local>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn sidecar(&self) -> Result<Value> {
        let sidecar = CreateSidecar {
            data: &self.data,
            name: &self.name,
            tags: &self.tags,
            time: self.time.as_ref().map(time::to_millis).unwrap_or_else(time::now_millis),
            token: self.token.as_deref(),
        };
        Ok(serde_json::to_value(sidecar)?)
    }

    /// Open the source file and build the multipart body.
    pub async fn into_form(self) -> Result<Form> {
        let sidecar = self.sidecar()?;
        encode(&sidecar, Some(&self.file)).await
    }
}

/// Partial update of an existing record. Fields left unset are absent from
/// the sidecar, which the server reads as "leave unchanged".
#[derive(Debug, Clone)]
pub struct RecordPatch {
    uuid: String,
    file: Option<PathBuf>,
    name: Option<String>,
    data: Option<Map<String, Value>>,
    tags: Option<Vec<String>>,
    time: Option<DateTime<Local>>,
    token: Option<String>,
}

#[derive(Serialize)]
struct PatchSidecar<'a> {
    uuid: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<&'a str>,
}

impl RecordPatch {
    pub fn new(uuid: impl Into<String>) -> Self {
        RecordPatch {
            uuid: uuid.into(),
            file: None,
            name: None,
            data: None,
            tags: None,
            time: None,
            token: None,
        }
    }

    /// Replace the stored content.
    pub fn file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn time(mut self, time: DateTime<Local>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn has_content(&self) -> bool {
        self.file.is_some()
    }

    pub fn sidecar(&self) -> Result<Value> {
        let sidecar = PatchSidecar {
            uuid: &self.uuid,
            data: self.data.as_ref(),
            name: self.name.as_deref(),
            tags: self.tags.as_deref(),
            time: self.time.as_ref().map(time::to_millis),
            token: self.token.as_deref(),
        };
        Ok(serde_json::to_value(sidecar)?)
    }

    /// Build the multipart body; the file is only opened when new content
    /// was supplied.
    pub async fn into_form(self) -> Result<Form> {
        let sidecar = self.sidecar()?;
        encode(&sidecar, self.file.as_deref()).await
    }
}

/// Sidecar-only form used by removal.
pub fn removal_form(uuid: &str, token: Option<&str>) -> Result<Form> {
    let mut sidecar = Map::new();
    sidecar.insert("uuid".into(), Value::from(uuid));
    if let Some(token) = token {
        sidecar.insert("token".into(), Value::from(token));
    }
    Ok(Form::new().text("json", serde_json::to_string(&sidecar)?))
}

async fn encode(sidecar: &Value, content: Option<&Path>) -> Result<Form> {
    let form = Form::new().text("json", serde_json::to_string(sidecar)?);
    match content {
        Some(path) => Ok(form.part("file", content_part(path).await?)),
        None => Ok(form),
    }
}

// The open file moves into the request body and is dropped with it.
async fn content_part(path: &Path) -> Result<Part> {
    let io = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = tokio::fs::File::open(path).await.map_err(io)?;
    let length = file.metadata().await.map_err(io)?.len();
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("upload")
        .to_string();
    Ok(Part::stream_with_length(file, length).file_name(file_name))
}
