//! Session establishment.
//!
//! A saved session is tried first. If the device rejects it, the file is
//! discarded and a fresh login is performed. At most two attempts are made
//! per invocation.

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::client::SysbusClient;
use crate::error::AuthError;
use crate::protocol::{ERROR_EXCERPT_LEN, truncate};
use crate::session::{LoadOutcome, SessionState, SessionStore};
use crate::transport::{Cookies, RequestHeaders, Transport, with_trailing_slash};

/// Attempts made by [`Authenticator::authenticate`] before giving up.
pub const MAX_ATTEMPTS: usize = 2;

/// Where and as whom to log in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(url: &str, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            url: with_trailing_slash(url),
            username: username.into(),
            password: password.into(),
        }
    }
}

/// A session the device accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    state: SessionState,
    headers: RequestHeaders,
    restored: bool,
}

impl Session {
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    /// Whether the session came from the session file rather than a login.
    #[must_use]
    pub fn is_restored(&self) -> bool {
        self.restored
    }
}

/// Restores or creates the session used by a [`SysbusClient`].
pub struct Authenticator {
    credentials: Credentials,
    store: SessionStore,
}

impl Authenticator {
    #[must_use]
    pub fn new(credentials: Credentials, store: SessionStore) -> Self {
        Self { credentials, store }
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Give `client` a session the device accepts.
    ///
    /// On success the client carries the session headers and its transport
    /// holds the session cookies.
    ///
    /// # Errors
    ///
    /// Login failures are returned as soon as they happen. When both
    /// attempts end with a rejected time check, returns `AuthError::Rejected` and
    /// no session file remains.
    pub fn authenticate<T: Transport>(
        &self,
        client: &mut SysbusClient<T>,
    ) -> Result<Session, AuthError> {
        let mut may_restore = true;

        for attempt in 1..=MAX_ATTEMPTS {
            let (state, restored) = match self.restore(client, may_restore)? {
                Some(state) => (state, true),
                None => (self.login(client)?, false),
            };

            let headers = state.headers();
            client.set_headers(headers.clone());

            if client.probe() {
                debug!("Session accepted (attempt {attempt}/{MAX_ATTEMPTS})");
                return Ok(Session {
                    state,
                    headers,
                    restored,
                });
            }

            warn!("Session rejected by device (attempt {attempt}/{MAX_ATTEMPTS})");
            if let Err(e) = self.store.clear() {
                warn!("Cannot discard rejected session: {e}");
            }
            may_restore = false;
        }

        client.set_headers(RequestHeaders::unauthenticated());
        error!("authentication impossible");
        Err(AuthError::Rejected {
            attempts: MAX_ATTEMPTS,
        })
    }

    fn restore<T: Transport>(
        &self,
        client: &mut SysbusClient<T>,
        may_restore: bool,
    ) -> Result<Option<SessionState>, AuthError> {
        if !may_restore {
            return Ok(None);
        }

        match self.store.load() {
            LoadOutcome::Loaded(state) => {
                info!("Restoring saved session");
                client.transport_mut().reset(&state.cookies)?;
                Ok(Some(state))
            }
            LoadOutcome::Missing => Ok(None),
            LoadOutcome::Corrupt(reason) => {
                warn!(
                    "Ignoring unreadable session file {}: {reason}",
                    self.store.path().display()
                );
                Ok(None)
            }
        }
    }

    fn login<T: Transport>(&self, client: &mut SysbusClient<T>) -> Result<SessionState, AuthError> {
        info!("New session for {} at {}", self.credentials.username, self.credentials.url);
        client.transport_mut().reset(&Cookies::new())?;

        let transport = client.transport();
        let body = transport.authenticate(&self.credentials.username, &self.credentials.password)?;
        let text = String::from_utf8_lossy(&body);
        let raw = || truncate(&text, ERROR_EXCERPT_LEN).into_owned();

        let answer: Value =
            serde_json::from_str(&text).map_err(|_| AuthError::MalformedLogin { raw: raw() })?;
        let Some(context) = answer.pointer("/data/contextID").and_then(Value::as_str) else {
            return Err(AuthError::MissingContext { raw: raw() });
        };

        let state = SessionState::new(transport.cookies(), context);
        if let Err(e) = self.store.save(&state) {
            warn!("Cannot save session to {}: {e}", self.store.path().display());
        }
        Ok(state)
    }
}
