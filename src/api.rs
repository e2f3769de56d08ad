// Request core: a small async HTTP client shared by the iCDN, static host and
// data services. It owns the connection session and turns raw responses into
// payload bytes or typed errors according to the configured protocol profile.

use std::fmt;
use std::str::FromStr;

use reqwest::multipart::Form;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{self, Error, Result};
use crate::session::Session;

/// Wire convention a server generation uses to report failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Older servers: failures are signalled by the HTTP status alone.
    StatusDriven,
    /// Newer servers: failures carry a `{code, message}` JSON body.
    #[default]
    Envelope,
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Profile::StatusDriven => "status",
            Profile::Envelope => "envelope",
        })
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "status" | "a" => Ok(Profile::StatusDriven),
            "envelope" | "b" => Ok(Profile::Envelope),
            other => Err(format!("unknown protocol profile '{other}' (expected 'status' or 'envelope')")),
        }
    }
}

/// Error body sent by envelope-profile servers.
#[derive(Deserialize, Debug)]
struct ErrorEnvelope {
    code: String,
    #[serde(default)]
    message: String,
}

/// HTTP client bound to one base URL and one protocol profile.
pub struct ApiClient {
    session: Session,
    profile: Profile,
}

impl ApiClient {
    /// No connection is opened until the first request.
    pub fn new(base_url: impl Into<String>, profile: Profile) -> Self {
        ApiClient {
            session: Session::new(base_url),
            profile,
        }
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Release the underlying connection. Later requests fail with
    /// [`Error::SessionClosed`].
    pub fn close(&self) {
        self.session.close();
    }

    /// Issue a request and return the successful payload bytes.
    ///
    /// The request is a POST when `form` is present and a GET otherwise.
    pub async fn request(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        form: Option<Form>,
    ) -> Result<Vec<u8>> {
        let client = self.session.ensure_active()?;
        let url = self.session.url(endpoint);
        let method = if form.is_some() { Method::POST } else { Method::GET };

        let mut req = client.request(method.clone(), url.as_str());
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(form) = form {
            req = req.multipart(form);
        }

        let res = req.send().await?;
        let status = res.status().as_u16();
        let body = res.bytes().await?.to_vec();
        debug!(%method, endpoint, status, bytes = body.len(), "request finished");

        interpret(self.profile, endpoint, status, body)
    }

    /// Issue a request and decode the payload as JSON.
    pub async fn json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        form: Option<Form>,
    ) -> Result<T> {
        let body = self.request(endpoint, query, form).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Decide what a response means under the given profile.
pub fn interpret(profile: Profile, endpoint: &str, status: u16, body: Vec<u8>) -> Result<Vec<u8>> {
    if status == 200 {
        return Ok(body);
    }

    match profile {
        Profile::StatusDriven => match status {
            400 => Err(Error::BadRequest(String::from_utf8_lossy(&body).into_owned())),
            404 => Err(Error::NotFound(endpoint.to_string())),
            code => Err(Error::Server {
                status: Some(code),
                message: format!("Unexpected response status received: {code}"),
            }),
        },
        Profile::Envelope => match serde_json::from_slice::<ErrorEnvelope>(&body) {
            Ok(envelope) => Err(error::resolve(&envelope.code, envelope.message)),
            Err(_) => Err(Error::Server {
                status: Some(status),
                message: String::from_utf8_lossy(&body).into_owned(),
            }),
        },
    }
}

/// Percent-encode each `/`-separated segment of a path, dropping leading
/// slashes. Reserved characters such as `?` and `#` stay inside their segment.
pub fn encode_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
