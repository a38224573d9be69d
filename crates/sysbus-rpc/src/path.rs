//! Object paths and the compact call notation.
//!
//! A call target is typed on the command line in one of two forms:
//!
//! ```text
//! NMC.Wifi:get                                   colon form
//! sysbus/NMC/Wifi:get                            same call, slash separators
//! NeMo.Intf.wl1.getParameters(name="x", flag="") call form
//! ```
//!
//! Both produce an [`RpcCall`] whose [`ObjectPath`] is canonical: no leading
//! `/`, `/`-separated, always rooted at `sysbus`.

use std::fmt;

use serde_json::{Map, Value};
use tracing::warn;

/// Prefix of every canonical object path.
pub const ROOT_PREFIX: &str = "sysbus/";

/// Depth sent as `_restDepth` when a GET names none (unlimited).
pub const UNLIMITED_DEPTH: i32 = -1;

/// Ordered parameter mapping sent as `{"parameters": ...}`.
pub type Parameters = Map<String, Value>;

/// Errors in a call target or a `name=value` argument.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty object path")]
    Empty,

    #[error("missing method name in '{0}'")]
    MissingMethod(String),

    #[error("argument '{0}' has no '='")]
    MissingEquals(String),

    #[error("empty argument name at offset {0}")]
    EmptyKey(usize),

    #[error("unterminated quoted value starting at offset {0}")]
    UnterminatedQuote(usize),

    #[error("unexpected '{found}' at offset {offset}")]
    Unexpected { found: char, offset: usize },
}

/// Canonical object path, e.g. `sysbus/NeMo/Intf/wl1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectPath(String);

impl ObjectPath {
    /// Canonicalize a user supplied object reference.
    ///
    /// Dots become slashes, a single leading slash is dropped and `sysbus/`
    /// is prepended when missing, so `sysbus` alone becomes `sysbus/sysbus`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Empty` when nothing remains to address.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let slashed = raw.trim().replace('.', "/");
        let path = slashed.strip_prefix('/').unwrap_or(&slashed);

        if path.is_empty() {
            return Err(ParseError::Empty);
        }
        if path.starts_with(ROOT_PREFIX) {
            Ok(Self(path.to_string()))
        } else {
            Ok(Self(format!("{ROOT_PREFIX}{path}")))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the call travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `GET <path>?_restDepth=<n>`, used to read the datamodel.
    Get,
    /// `POST <path>:<method>` with a `{"parameters": ...}` body.
    Post,
}

/// A structured sysbus call.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcCall {
    pub path: ObjectPath,
    pub method: Option<String>,
    pub parameters: Parameters,
    pub mode: Mode,
    pub depth: Option<i32>,
}

impl RpcCall {
    /// Parse a POST call target in colon form or call form.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` for an empty path, an empty method name or a
    /// malformed argument list.
    pub fn parse(target: &str) -> Result<Self, ParseError> {
        let (path, method, parameters) = parse_target(target)?;
        Ok(Self {
            path,
            method,
            parameters,
            mode: Mode::Post,
            depth: None,
        })
    }

    /// A datamodel read of `target`, `depth` levels deep (unlimited if `None`).
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` when the target is malformed.
    pub fn get(target: &str, depth: Option<i32>) -> Result<Self, ParseError> {
        let mut call = Self::parse(target)?;
        call.mode = Mode::Get;
        call.depth = depth;
        Ok(call)
    }

    /// Add one parameter unless the key is already present.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters
            .entry(name.into())
            .or_insert_with(|| value.into());
        self
    }

    /// Merge the keys of a JSON object; anything else is ignored.
    #[must_use]
    pub fn with_params(mut self, params: Value) -> Self {
        if let Value::Object(map) = params {
            for (name, value) in map {
                self.parameters.entry(name).or_insert(value);
            }
        }
        self
    }

    /// Merge `name=value` tokens from the command line.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingEquals` for a token without `=`.
    pub fn with_assignments<I, S>(mut self, tokens: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for token in tokens {
            let (name, value) = parse_assignment(token.as_ref())?;
            self.parameters
                .entry(name)
                .or_insert(Value::String(value));
        }
        Ok(self)
    }

    /// `path[:method]` as addressed on the device.
    #[must_use]
    pub fn target(&self) -> String {
        match &self.method {
            Some(method) => format!("{}:{method}", self.path),
            None => self.path.to_string(),
        }
    }

    /// Request path relative to the base URL, query string included.
    #[must_use]
    pub fn wire_path(&self) -> String {
        match self.mode {
            Mode::Post => self.target(),
            Mode::Get => format!(
                "{}?_restDepth={}",
                self.target(),
                self.depth.unwrap_or(UNLIMITED_DEPTH)
            ),
        }
    }
}

fn parse_target(target: &str) -> Result<(ObjectPath, Option<String>, Parameters), ParseError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(ParseError::Empty);
    }

    if let Some(open) = target.find('(') {
        let head = &target[..open];

        // an explicit method before the parenthesis wins over the call form
        if head.contains(':') && target.ends_with(')') {
            let suffix = &target[open..];
            if suffix != "()" {
                warn!("ignoring '{suffix}' after explicit method in '{target}'");
            }
            let (path, method) = split_method(head)?;
            return Ok((path, method, Parameters::new()));
        }

        if target.ends_with(')')
            && let Some((path, method)) = head.rsplit_once('.')
        {
            if method.is_empty() {
                return Err(ParseError::MissingMethod(target.to_string()));
            }
            let mut parameters = Parameters::new();
            for (name, value) in parse_arguments(&target[open + 1..target.len() - 1])? {
                parameters.entry(name).or_insert(Value::String(value));
            }
            return Ok((ObjectPath::parse(path)?, Some(method.to_string()), parameters));
        }
    }

    let (path, method) = split_method(target)?;
    Ok((path, method, Parameters::new()))
}

/// Split at the last `:`; object keys such as MAC addresses may contain colons.
fn split_method(target: &str) -> Result<(ObjectPath, Option<String>), ParseError> {
    match target.rsplit_once(':') {
        Some((_, "")) => Err(ParseError::MissingMethod(target.to_string())),
        Some((path, method)) => Ok((ObjectPath::parse(path)?, Some(method.to_string()))),
        None => Ok((ObjectPath::parse(target)?, None)),
    }
}

/// Parse a single `name=value` token; the value is kept verbatim.
///
/// # Errors
///
/// Returns `ParseError::MissingEquals` or `ParseError::EmptyKey`.
pub fn parse_assignment(token: &str) -> Result<(String, String), ParseError> {
    let Some((name, value)) = token.split_once('=') else {
        return Err(ParseError::MissingEquals(token.to_string()));
    };
    if name.trim().is_empty() {
        return Err(ParseError::EmptyKey(0));
    }
    Ok((name.trim().to_string(), value.to_string()))
}

/// Parse the inside of a call-form parenthesis: `a="1", b=2, c=""`.
///
/// Values lose one layer of double quotes. Commas inside quotes belong to
/// the value. There is no escape syntax.
///
/// # Errors
///
/// Returns a `ParseError` locating the first malformed argument.
pub fn parse_arguments(src: &str) -> Result<Vec<(String, String)>, ParseError> {
    ArgParser { src, pos: 0 }.arguments()
}

struct ArgParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> ArgParser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &src[start..self.pos]
    }

    fn arguments(mut self) -> Result<Vec<(String, String)>, ParseError> {
        let mut args = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Ok(args),
                Some(',') => {
                    self.bump();
                    continue;
                }
                Some(_) => args.push(self.argument()?),
            }

            self.skip_whitespace();
            match self.bump() {
                None => return Ok(args),
                Some(',') => {}
                Some(found) => {
                    return Err(ParseError::Unexpected {
                        found,
                        offset: self.pos - found.len_utf8(),
                    });
                }
            }
        }
    }

    fn argument(&mut self) -> Result<(String, String), ParseError> {
        let start = self.pos;
        let name = self.take_while(|c| c != '=' && c != ',' && c != '"');

        if self.peek() != Some('=') {
            let piece = self.take_while(|c| c != ',');
            return Err(ParseError::MissingEquals(format!("{name}{piece}").trim().to_string()));
        }
        self.bump();

        let name = name.trim();
        if name.is_empty() {
            return Err(ParseError::EmptyKey(start));
        }

        self.skip_whitespace();
        let value = if self.peek() == Some('"') {
            let open = self.pos;
            self.bump();
            let value = self.take_while(|c| c != '"');
            if self.bump().is_none() {
                return Err(ParseError::UnterminatedQuote(open));
            }
            value
        } else {
            self.take_while(|c| c != ',').trim_end()
        };

        Ok((name.to_string(), value.to_string()))
    }
}
