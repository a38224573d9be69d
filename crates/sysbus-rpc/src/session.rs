//! Persisted session state.
//!
//! The cookie jar and the context token survive between invocations in a
//! single file under the system temp directory. The file holds two JSON
//! values one after the other: the cookie mapping, then the token string.
//! There is no locking; two concurrent invocations may race on it.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::{Deserializer, Value};
use tracing::{debug, warn};

use crate::error::Result;
use crate::transport::{Cookies, RequestHeaders};

/// File name of the session state under the temp directory.
pub const STATE_FILE_NAME: &str = "sysbus_state";

/// Default location of the session file.
#[must_use]
pub fn state_file() -> PathBuf {
    std::env::temp_dir().join(STATE_FILE_NAME)
}

/// Cookies and context token of an authenticated session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub cookies: Cookies,
    pub context_token: String,
}

impl SessionState {
    #[must_use]
    pub fn new(cookies: Cookies, context_token: impl Into<String>) -> Self {
        Self {
            cookies,
            context_token: context_token.into(),
        }
    }

    /// Headers for requests made within this session.
    #[must_use]
    pub fn headers(&self) -> RequestHeaders {
        RequestHeaders::authenticated(&self.context_token)
    }
}

/// What [`SessionStore::load`] found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(SessionState),
    Missing,
    Corrupt(String),
}

/// Reads and writes the session file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved session. Never fails: unreadable or malformed files
    /// are reported as [`LoadOutcome::Corrupt`].
    #[must_use]
    pub fn load(&self) -> LoadOutcome {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No saved session at {}", self.path.display());
                return LoadOutcome::Missing;
            }
            Err(e) => return LoadOutcome::Corrupt(e.to_string()),
        };

        match decode_state(&content) {
            Ok(state) => LoadOutcome::Loaded(state),
            Err(reason) => LoadOutcome::Corrupt(reason),
        }
    }

    /// Overwrite the session file with `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self, state: &SessionState) -> Result<()> {
        let mut content = serde_json::to_string(&state.cookies)?;
        content.push('\n');
        content.push_str(&serde_json::to_string(&state.context_token)?);
        content.push('\n');

        let mut file = open_private(&self.path)?;
        file.write_all(content.as_bytes())?;
        debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    /// Delete the session file; a missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed session file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!("Cannot remove {}: {}", self.path.display(), e);
                Err(e.into())
            }
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(state_file())
    }
}

fn decode_state(content: &str) -> std::result::Result<SessionState, String> {
    let mut values = Deserializer::from_str(content).into_iter::<Value>();

    let cookies = values
        .next()
        .ok_or("empty session file")?
        .map_err(|e| format!("bad cookie mapping: {e}"))?;
    let cookies: Cookies =
        serde_json::from_value(cookies).map_err(|e| format!("bad cookie mapping: {e}"))?;

    let token = values
        .next()
        .ok_or("missing context token")?
        .map_err(|e| format!("bad context token: {e}"))?;
    let Value::String(context_token) = token else {
        return Err("context token is not a string".to_string());
    };

    Ok(SessionState {
        cookies,
        context_token,
    })
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    fs::File::create(path)
}
