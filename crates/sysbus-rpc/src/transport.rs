//! HTTP transport to the device.
//!
//! The [`Transport`] trait is the only seam between the protocol logic and
//! the network; [`HttpTransport`] implements it with a blocking `reqwest`
//! client and a cookie jar that the session store can export and seed.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::cookie::{CookieStore, Jar};
use tracing::{debug, trace};

use crate::error::TransportError;
use crate::protocol::{ERROR_EXCERPT_LEN, truncate};

pub const PROTOTYPE_VERSION: &str = "1.7";
pub const CONTENT_TYPE: &str = "application/x-sah-ws-1-call+json; charset=UTF-8";
pub const ACCEPT: &str = "text/javascript";

/// Endpoint receiving credentials, relative to the base URL.
pub const AUTHENTICATE_PATH: &str = "authenticate";

/// Default timeout applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Cookie name to value, as stored in the session file.
pub type Cookies = BTreeMap<String, String>;

/// Headers attached to every sysbus request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    context: Option<String>,
}

impl RequestHeaders {
    /// Headers carrying the context token of an authenticated session.
    #[must_use]
    pub fn authenticated(context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
        }
    }

    /// Reduced header set without `X-Context`.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self { context: None }
    }

    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Header name/value pairs in sending order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::with_capacity(4);
        if let Some(context) = &self.context {
            pairs.push(("X-Context", context.as_str()));
        }
        pairs.push(("X-Prototype-Version", PROTOTYPE_VERSION));
        pairs.push(("Content-Type", CONTENT_TYPE));
        pairs.push(("Accept", ACCEPT));
        pairs
    }
}

/// Raw byte exchange with the device.
///
/// `path` arguments are relative to the base URL (`sysbus/...`).
pub trait Transport {
    /// # Errors
    ///
    /// Returns a `TransportError` on network failure or non-2xx status.
    fn get(&self, path: &str, headers: &RequestHeaders) -> Result<Vec<u8>, TransportError>;

    /// # Errors
    ///
    /// Returns a `TransportError` on network failure or non-2xx status.
    fn post(
        &self,
        path: &str,
        headers: &RequestHeaders,
        body: String,
    ) -> Result<Vec<u8>, TransportError>;

    /// Send credentials to the login endpoint and return the raw answer.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` on network failure or non-2xx status.
    fn authenticate(&self, username: &str, password: &str) -> Result<Vec<u8>, TransportError>;

    /// Cookies currently held for the device.
    fn cookies(&self) -> Cookies;

    /// Start over with a jar holding exactly `cookies`.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` if the underlying client cannot be rebuilt.
    fn reset(&mut self, cookies: &Cookies) -> Result<(), TransportError>;
}

/// Blocking HTTP transport.
pub struct HttpTransport {
    base: Url,
    timeout: Duration,
    jar: Arc<Jar>,
    client: Client,
}

impl HttpTransport {
    /// Create a transport for `base_url` with an empty cookie jar.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidUrl` if the URL does not parse and
    /// `TransportError::Http` if the client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let base = Url::parse(&with_trailing_slash(base_url)).map_err(|e| {
            TransportError::InvalidUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let jar = Arc::new(Jar::default());
        let client = build_client(&jar, timeout)?;

        Ok(Self {
            base,
            timeout,
            jar,
            client,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn send(request: RequestBuilder, headers: &RequestHeaders) -> Result<Vec<u8>, TransportError> {
        let request = headers
            .pairs()
            .into_iter()
            .fold(request, |request, (name, value)| request.header(name, value));

        let response = request.send()?;
        let status = response.status();
        let body = response.bytes()?.to_vec();
        trace!("HTTP {} ({} bytes)", status, body.len());

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate(&text, ERROR_EXCERPT_LEN).into_owned(),
            });
        }

        Ok(body)
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str, headers: &RequestHeaders) -> Result<Vec<u8>, TransportError> {
        let url = self.url(path);
        debug!("GET {url}");
        Self::send(self.client.get(url), headers)
    }

    fn post(
        &self,
        path: &str,
        headers: &RequestHeaders,
        body: String,
    ) -> Result<Vec<u8>, TransportError> {
        let url = self.url(path);
        debug!("POST {url}");
        Self::send(self.client.post(url).body(body), headers)
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<Vec<u8>, TransportError> {
        let url = self.url(AUTHENTICATE_PATH);
        debug!("POST {url} as {username}");
        let request = self
            .client
            .post(url)
            .query(&[("username", username), ("password", password)]);
        Self::send(request, &RequestHeaders::unauthenticated())
    }

    fn cookies(&self) -> Cookies {
        self.jar
            .cookies(&self.base)
            .as_ref()
            .and_then(|header| header.to_str().ok())
            .map(parse_cookie_header)
            .unwrap_or_default()
    }

    fn reset(&mut self, cookies: &Cookies) -> Result<(), TransportError> {
        let jar = Arc::new(Jar::default());
        for (name, value) in cookies {
            jar.add_cookie_str(&format!("{name}={value}"), &self.base);
        }
        self.client = build_client(&jar, self.timeout)?;
        self.jar = jar;
        Ok(())
    }
}

fn build_client(jar: &Arc<Jar>, timeout: Duration) -> Result<Client, TransportError> {
    Ok(Client::builder()
        .cookie_provider(Arc::clone(jar))
        .timeout(timeout)
        .build()?)
}

/// Append `/` to a base URL unless already present.
#[must_use]
pub fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Split a `Cookie:` header value (`a=1; b=2`) into a mapping.
#[must_use]
pub fn parse_cookie_header(header: &str) -> Cookies {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}
