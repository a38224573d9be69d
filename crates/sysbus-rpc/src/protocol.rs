//! The device's JSON dialect.
//!
//! Requests are `{"parameters": {...}}` bodies; answers are wrapped in a
//! `{"result": ...}` envelope. Datamodel reads may come back as several
//! objects glued together (`{...}{...}`) and some firmware leaks a stray
//! byte sequence that is not valid UTF-8. This module turns all of that into
//! plain `serde_json::Value`s.

use std::borrow::Cow;

use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::path::{Mode, Parameters};

/// Firmware artifact found in some device names.
pub const VENDOR_ARTIFACT: [u8; 4] = [0xf0, 0x44, 0x6e, 0x22];

/// Same-length replacement for [`VENDOR_ARTIFACT`].
pub const ARTIFACT_PLACEHOLDER: [u8; 4] = *b"aaaa";

/// Length of response previews in debug logs.
pub const PREVIEW_LEN: usize = 50;

/// Length of raw text attached to protocol and remote errors.
pub const ERROR_EXCERPT_LEN: usize = 512;

/// Serialize the POST body for a parameter mapping.
#[must_use]
pub fn request_body(parameters: &Parameters) -> String {
    json!({ "parameters": parameters }).to_string()
}

/// Replace every [`VENDOR_ARTIFACT`] with [`ARTIFACT_PLACEHOLDER`].
#[must_use]
pub fn scrub(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len());
    let mut rest = body;
    while !rest.is_empty() {
        if rest.starts_with(&VENDOR_ARTIFACT) {
            out.extend_from_slice(&ARTIFACT_PLACEHOLDER);
            rest = &rest[VENDOR_ARTIFACT.len()..];
        } else {
            out.push(rest[0]);
            rest = &rest[1..];
        }
    }
    out
}

/// Rewrite concatenated objects `{..}{..}` into a JSON array.
///
/// Purely textual: a `}{` inside a string value is rewritten too.
#[must_use]
pub fn repair_concatenated(text: &str) -> Cow<'_, str> {
    if text.contains("}{") {
        Cow::Owned(format!("[{}]", text.replace("}{", "},{")))
    } else {
        Cow::Borrowed(text)
    }
}

/// Cut `text` to at most `max` characters, marking the cut with `...`.
#[must_use]
pub fn truncate(text: &str, max: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max) {
        Some((end, _)) => Cow::Owned(format!("{}...", &text[..end])),
        None => Cow::Borrowed(text),
    }
}

/// Decode a scrubbed response body according to the call mode.
///
/// GET bodies are repaired and returned as decoded. POST bodies must be an
/// envelope; the content of `result` is returned.
///
/// # Errors
///
/// Returns `Error::Protocol` when the body is not JSON or the envelope has
/// no `result`, and `Error::Remote` when the device reports errors.
pub fn decode(body: &[u8], mode: Mode) -> Result<Value> {
    let text = String::from_utf8_lossy(body);
    let text = match mode {
        Mode::Get => repair_concatenated(&text).into_owned(),
        Mode::Post => text.into_owned(),
    };

    let value: Value = serde_json::from_str(&text).map_err(|e| {
        Error::protocol(
            format!("bad JSON: {e}"),
            truncate(&text, ERROR_EXCERPT_LEN),
        )
    })?;

    match mode {
        Mode::Get => Ok(value),
        Mode::Post => unwrap_envelope(value, &text),
    }
}

/// Extract `result` from a POST envelope.
///
/// # Errors
///
/// Returns `Error::Remote` for `{"result": {"errors": ...}}` and
/// `Error::Protocol` for any shape without `result`.
pub fn unwrap_envelope(value: Value, raw: &str) -> Result<Value> {
    let Value::Object(mut envelope) = value else {
        return Err(Error::protocol(
            "envelope is not an object",
            truncate(raw, ERROR_EXCERPT_LEN),
        ));
    };

    let Some(result) = envelope.remove("result") else {
        return Err(Error::protocol(
            "envelope has no result",
            truncate(raw, ERROR_EXCERPT_LEN),
        ));
    };

    if result.get("errors").is_some() {
        return Err(Error::remote(truncate(raw, ERROR_EXCERPT_LEN)));
    }

    Ok(result)
}

/// Whether a session check result reports success (`{"status": true}`).
#[must_use]
pub fn is_success(result: &Value) -> bool {
    result.get("status").and_then(Value::as_bool) == Some(true)
}
