//! Error types for the sysbus-rpc crate.
//!
//! The taxonomy follows the layers of the client: transport failures,
//! protocol violations in what the device sent back, errors the device
//! reported itself, authentication failures and mistakes in the compact
//! call notation typed by the user.

use crate::path::ParseError;

/// Failure to exchange bytes with the device.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("device answered HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Unified error type for sysbus calls
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Protocol error: {reason} (raw: {raw})")]
    Protocol { reason: String, raw: String },

    #[error("Remote error: {raw}")]
    Remote { raw: String },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn protocol(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    pub fn remote(raw: impl Into<String>) -> Self {
        Self::Remote { raw: raw.into() }
    }
}

/// Errors raised while establishing an authenticated session
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("login request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("login response is not JSON: {raw}")]
    MalformedLogin { raw: String },

    #[error("login response carries no context ID: {raw}")]
    MissingContext { raw: String },

    #[error("authentication impossible: session rejected after {attempts} attempts")]
    Rejected { attempts: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
