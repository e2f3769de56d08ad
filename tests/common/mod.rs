#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Multipart;
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock server");
    let addr = listener.local_addr().expect("mock server address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server crashed");
    });
    format!("http://{addr}")
}

/// A base URL nothing is listening on.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn record_json(uuid: &str) -> Value {
    json!({
        "uuid": uuid,
        "name": format!("file {uuid}"),
        "mime": "text/plain",
        "size": 11,
        "tags": ["fixture"],
        "time": 1_745_000_000_000i64,
        "data": {"origin": "test"}
    })
}

pub fn envelope(code: &str, message: &str) -> Value {
    json!({ "code": code, "message": message })
}

/// One multipart field as the mock server received it.
#[derive(Debug, Clone)]
pub struct ReceivedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub body: Vec<u8>,
}

impl ReceivedPart {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("sidecar is valid JSON")
    }
}

/// What the mock server saw, shared with the test body.
#[derive(Default)]
pub struct Recorder {
    pub queries: Mutex<Vec<HashMap<String, String>>>,
    pub uploads: Mutex<Vec<Vec<ReceivedPart>>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Recorder::default())
    }

    pub async fn record_multipart(&self, mut multipart: Multipart) -> Vec<ReceivedPart> {
        let mut parts = Vec::new();
        while let Some(field) = multipart.next_field().await.expect("multipart field") {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let body = field.bytes().await.expect("field body").to_vec();
            parts.push(ReceivedPart { name, file_name, body });
        }
        self.uploads.lock().push(parts.clone());
        parts
    }

    pub fn last_upload(&self) -> Vec<ReceivedPart> {
        self.uploads.lock().last().cloned().expect("no upload received")
    }
}

pub fn sidecar_keys(part: &ReceivedPart) -> Vec<String> {
    let mut keys: Vec<String> = part.json().as_object().expect("sidecar object").keys().cloned().collect();
    keys.sort();
    keys
}
