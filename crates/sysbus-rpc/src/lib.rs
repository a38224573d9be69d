//! Client for the sysbus JSON-RPC interface of Livebox routers.
//!
//! The device exposes its datamodel over HTTP: objects are addressed by
//! dotted paths under `sysbus`, methods are invoked with a POST carrying a
//! `{"parameters": ...}` body, and the tree is read back with GET requests.
//!
//! # Modules
//!
//! - [`path`]: object paths and the compact call notation
//! - [`protocol`]: request bodies, response decoding and envelope handling
//! - [`transport`]: the HTTP exchange and its cookie jar
//! - [`session`]: the persisted session file
//! - [`auth`]: restoring or creating a session the device accepts
//! - [`client`]: [`SysbusClient`], which ties the above together
//! - [`error`]: error types
//!
//! # Example
//!
//! ```no_run
//! use sysbus_rpc::{
//!     Authenticator, Credentials, HttpTransport, SessionStore, SysbusClient, DEFAULT_TIMEOUT,
//! };
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials::new("http://livebox.home", "admin", "secret");
//! let transport = HttpTransport::new(&credentials.url, DEFAULT_TIMEOUT)?;
//! let mut client = SysbusClient::new(transport);
//!
//! Authenticator::new(credentials, SessionStore::default()).authenticate(&mut client)?;
//!
//! if let Some(info) = client.request("DeviceInfo:get") {
//!     println!("{info:#}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod path;
pub mod protocol;
pub mod session;
pub mod transport;

#[cfg(test)]
mod fixtures;

pub use auth::{Authenticator, Credentials, MAX_ATTEMPTS, Session};
pub use client::{PROBE_TARGET, SysbusClient};
pub use error::{AuthError, Error, Result, TransportError};
pub use path::{Mode, ObjectPath, Parameters, ParseError, RpcCall};
pub use session::{LoadOutcome, SessionState, SessionStore, state_file};
pub use transport::{Cookies, DEFAULT_TIMEOUT, HttpTransport, RequestHeaders, Transport};
