// Connection session: one lazily created HTTP client per service client,
// closed explicitly by the owner.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use reqwest::Client;
use tracing::debug;

use crate::error::{Error, Result};

enum State {
    Uninitialized,
    Active(Client),
    Closed,
}

/// Owns the underlying connection for one base address.
///
/// The connection is created on first use and never recreated once the
/// session has been closed.
pub struct Session {
    base_url: String,
    state: Mutex<State>,
    opened: AtomicUsize,
}

impl Session {
    pub fn new(base_url: impl Into<String>) -> Self {
        Session {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            state: Mutex::new(State::Uninitialized),
            opened: AtomicUsize::new(0),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint path such as `/query/abc`.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Return the live connection, creating it on first use.
    ///
    /// The state lock is held across creation, so concurrent first callers
    /// all observe the same connection.
    pub fn ensure_active(&self) -> Result<Client> {
        let mut state = self.state.lock();
        match &*state {
            State::Active(client) => Ok(client.clone()),
            State::Closed => Err(Error::SessionClosed),
            State::Uninitialized => {
                let client = Client::builder().cookie_store(true).build()?;
                self.opened.fetch_add(1, Ordering::SeqCst);
                debug!(base_url = %self.base_url, "opened connection");
                *state = State::Active(client.clone());
                Ok(client)
            }
        }
    }

    /// Release the connection. Safe to call more than once.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if let State::Active(_) = &*state {
            debug!(base_url = %self.base_url, "closed connection");
        }
        *state = State::Closed;
    }

    pub fn is_active(&self) -> bool {
        matches!(&*self.state.lock(), State::Active(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(&*self.state.lock(), State::Closed)
    }

    /// How many times a connection has been created for this session.
    pub fn connections_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn no_connection_until_first_use() {
        let session = Session::new("http://localhost:9");
        assert!(!session.is_active());
        assert_eq!(session.connections_opened(), 0);

        session.ensure_active().unwrap();
        session.ensure_active().unwrap();
        assert!(session.is_active());
        assert_eq!(session.connections_opened(), 1);
    }

    #[test]
    fn close_is_idempotent_and_final() {
        let session = Session::new("http://localhost:9");
        session.ensure_active().unwrap();
        session.close();
        session.close();

        assert!(session.is_closed());
        assert!(matches!(session.ensure_active(), Err(Error::SessionClosed)));
        assert_eq!(session.connections_opened(), 1);
    }

    #[test]
    fn closing_an_unused_session_never_opens_a_connection() {
        let session = Session::new("http://localhost:9");
        session.close();
        assert_eq!(session.connections_opened(), 0);
        assert!(matches!(session.ensure_active(), Err(Error::SessionClosed)));
    }

    #[test]
    fn url_joins_without_doubling_slashes() {
        let session = Session::new("https://dmmdgm.dev/");
        assert_eq!(session.url("/query/abc"), "https://dmmdgm.dev/query/abc");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_use_creates_one_connection() {
        let session = Arc::new(Session::new("http://localhost:9"));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let session = session.clone();
                tokio::spawn(async move { session.ensure_active().map(|_| ()) })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(session.connections_opened(), 1);
    }
}
