// Error taxonomy: every failure the client can surface, plus the flat table
// mapping server-emitted codes onto those kinds.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

pub type Result<T> = std::result::Result<T, Error>;

/// Request field a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Data,
    Name,
    Tags,
    Time,
    Token,
    Uuid,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Data => "data",
            Field::Name => "name",
            Field::Tags => "tags",
            Field::Time => "time",
            Field::Token => "token",
            Field::Uuid => "uuid",
        })
    }
}

/// Missing or unusable content or asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceFault {
    MissingAsset,
    MissingContent,
    BadFile,
    BadJson,
    LargeSource,
    UnsupportedMime,
}

impl fmt::Display for ResourceFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceFault::MissingAsset => "missing asset",
            ResourceFault::MissingContent => "missing content",
            ResourceFault::BadFile => "bad file",
            ResourceFault::BadJson => "bad json",
            ResourceFault::LargeSource => "source too large",
            ResourceFault::UnsupportedMime => "unsupported mime type",
        })
    }
}

/// Unknown endpoint or path, mostly raised by the static host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingFault {
    MissingEndpoint,
    UnknownEndpoint,
    OutOfBoundsFile,
    UnknownDirectory,
    UnknownFile,
    RouteAbort,
}

impl fmt::Display for RoutingFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RoutingFault::MissingEndpoint => "missing endpoint",
            RoutingFault::UnknownEndpoint => "unknown endpoint",
            RoutingFault::OutOfBoundsFile => "file out of bounds",
            RoutingFault::UnknownDirectory => "unknown directory",
            RoutingFault::UnknownFile => "unknown file",
            RoutingFault::RouteAbort => "route aborted",
        })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unauthorized token: {message}")]
    Authorization { message: String },

    #[error("invalid {field}: {message}")]
    Validation { field: Field, message: String },

    #[error("{fault}: {message}")]
    Resource { fault: ResourceFault, message: String },

    #[error("{fault}: {message}")]
    Routing { fault: RoutingFault, message: String },

    #[error("server error: {message}")]
    Server { status: Option<u16>, message: String },

    #[error("unknown error ({code}): {message}")]
    Unknown { code: String, message: String },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("timestamp out of range: {0}")]
    InvalidTimestamp(i64),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("client session is closed")]
    SessionClosed,
}

/// Stable code a server emits to classify a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    UnauthorizedToken,
    Invalid(Field),
    Resource(ResourceFault),
    Routing(RoutingFault),
    ServerException,
    UnknownException,
}

const CODES: &[(&str, ErrorCode)] = &[
    // core / auth
    ("UNAUTHORIZED_TOKEN", ErrorCode::UnauthorizedToken),
    ("INVALID_DATA", ErrorCode::Invalid(Field::Data)),
    ("INVALID_NAME", ErrorCode::Invalid(Field::Name)),
    ("INVALID_TAGS", ErrorCode::Invalid(Field::Tags)),
    ("INVALID_TIME", ErrorCode::Invalid(Field::Time)),
    ("INVALID_TOKEN", ErrorCode::Invalid(Field::Token)),
    ("INVALID_UUID", ErrorCode::Invalid(Field::Uuid)),
    ("SERVER_EXCEPTION", ErrorCode::ServerException),
    ("UNKNOWN_EXCEPTION", ErrorCode::UnknownException),
    // file content
    ("MISSING_ASSET", ErrorCode::Resource(ResourceFault::MissingAsset)),
    ("MISSING_CONTENT", ErrorCode::Resource(ResourceFault::MissingContent)),
    ("BAD_FILE", ErrorCode::Resource(ResourceFault::BadFile)),
    ("BAD_JSON", ErrorCode::Resource(ResourceFault::BadJson)),
    ("LARGE_SOURCE", ErrorCode::Resource(ResourceFault::LargeSource)),
    ("UNSUPPORTED_MIME", ErrorCode::Resource(ResourceFault::UnsupportedMime)),
    // static host
    ("MISSING_ENDPOINT", ErrorCode::Routing(RoutingFault::MissingEndpoint)),
    ("UNKNOWN_ENDPOINT", ErrorCode::Routing(RoutingFault::UnknownEndpoint)),
    ("OUT_OF_BOUNDS_FILE", ErrorCode::Routing(RoutingFault::OutOfBoundsFile)),
    ("UNKNOWN_DIRECTORY", ErrorCode::Routing(RoutingFault::UnknownDirectory)),
    ("UNKNOWN_FILE", ErrorCode::Routing(RoutingFault::UnknownFile)),
    ("ROUTE_ABORT", ErrorCode::Routing(RoutingFault::RouteAbort)),
];

impl ErrorCode {
    /// Case-sensitive lookup of a wire code.
    pub fn from_wire(code: &str) -> Option<Self> {
        CODES.iter().find(|(wire, _)| *wire == code).map(|(_, kind)| *kind)
    }

    pub fn as_wire(&self) -> &'static str {
        CODES
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(wire, _)| *wire)
            .unwrap_or("UNKNOWN_EXCEPTION")
    }

    fn into_error(self, message: String) -> Error {
        match self {
            ErrorCode::UnauthorizedToken => Error::Authorization { message },
            ErrorCode::Invalid(field) => Error::Validation { field, message },
            ErrorCode::Resource(fault) => Error::Resource { fault, message },
            ErrorCode::Routing(fault) => Error::Routing { fault, message },
            ErrorCode::ServerException => Error::Server { status: None, message },
            ErrorCode::UnknownException => Error::Unknown {
                code: self.as_wire().to_string(),
                message,
            },
        }
    }
}

/// Map a server `{code, message}` pair onto an error. Never fails: codes
/// missing from the table become [`Error::Unknown`] with both parts intact.
pub fn resolve(code: &str, message: impl Into<String>) -> Error {
    let message = message.into();
    match ErrorCode::from_wire(code) {
        Some(kind) => kind.into_error(message),
        None => {
            warn!(code, "server returned an unmapped error code");
            Error::Unknown {
                code: code.to_string(),
                message,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_code_round_trips_through_its_wire_string() {
        for (wire, kind) in CODES {
            assert_eq!(ErrorCode::from_wire(wire), Some(*kind));
            assert_eq!(kind.as_wire(), *wire);
        }
    }

    #[test]
    fn invalid_uuid_is_a_validation_error_with_the_server_message() {
        match resolve("INVALID_UUID", "bad uuid") {
            Error::Validation { field, message } => {
                assert_eq!(field, Field::Uuid);
                assert_eq!(message, "bad uuid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unmapped_code_keeps_code_and_message() {
        match resolve("TEAPOT", "short and stout") {
            Error::Unknown { code, message } => {
                assert_eq!(code, "TEAPOT");
                assert_eq!(message, "short and stout");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(ErrorCode::from_wire("invalid_uuid").is_none());
        assert!(matches!(resolve("invalid_uuid", "x"), Error::Unknown { .. }));
    }

    #[test]
    fn categories_land_on_their_kinds() {
        assert!(matches!(resolve("UNAUTHORIZED_TOKEN", "no"), Error::Authorization { .. }));
        assert!(matches!(
            resolve("LARGE_SOURCE", "too big"),
            Error::Resource { fault: ResourceFault::LargeSource, .. }
        ));
        assert!(matches!(
            resolve("UNKNOWN_DIRECTORY", "/nope"),
            Error::Routing { fault: RoutingFault::UnknownDirectory, .. }
        ));
        assert!(matches!(resolve("SERVER_EXCEPTION", "boom"), Error::Server { status: None, .. }));
        assert!(matches!(resolve("UNKNOWN_EXCEPTION", "?"), Error::Unknown { .. }));
    }

    #[test]
    fn display_preserves_the_server_message() {
        let err = resolve("MISSING_CONTENT", "no file attached");
        assert_eq!(err.to_string(), "missing content: no file attached");
    }
}
