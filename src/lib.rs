// Library root
// -----------
// Typed async client for the iCDN file service, its static file host and the
// data catalogue. The binary (`main.rs`) wires these modules into a CLI.
//
// Module responsibilities:
// - `api`: request core. Owns the connection session and maps responses to
//   payloads or typed errors under the configured protocol profile.
// - `session`: lazily created connection with an explicit `close`.
// - `error`: error type and the server error-code table.
// - `time`: epoch-millisecond and date-only codecs.
// - `models`: decoded records (file records, store stats, catalogue entries).
// - `search`: immutable search specification and deferred queries.
// - `upload`: multipart encoding for create, update and remove.
// - `icdn`, `static_host`, `data`: one client per service.
// - `config`: environment configuration and token persistence.
// - `ui`: terminal rendering and interactive prompts for the CLI.
pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod icdn;
pub mod models;
pub mod search;
pub mod session;
pub mod static_host;
pub mod time;
pub mod ui;
pub mod upload;

pub use api::{ApiClient, Profile};
pub use error::{Error, Result};
pub use icdn::Icdn;
pub use models::{FileRecord, Mutation, StoreStats};
pub use search::{SearchSpec, SortKey, SortOrder};
pub use upload::{NewRecord, RecordPatch};
