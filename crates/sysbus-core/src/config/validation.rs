//! Config validation - warns about unknown fields

use serde_json::Value;
use tracing::warn;

/// Keys understood by `Config` (settings.rs)
const CONFIG_KEYS: &[&str] = &["url", "user", "password", "timeoutSecs"];

/// Validate JSON config and warn about unknown fields.
pub fn warn_unknown_fields(content: &str, config_name: &str) {
    for key in find_unknown_keys(content) {
        warn!("Unknown config field in {config_name}: {key}");
    }
}

/// Top-level keys of `content` that `Config` does not know about.
/// Content that is not a JSON object yields nothing; parsing reports it.
fn find_unknown_keys(content: &str) -> Vec<String> {
    let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(content) else {
        return Vec::new();
    };

    obj.keys()
        .filter(|key| !CONFIG_KEYS.contains(&key.as_str()))
        .cloned()
        .collect()
}
