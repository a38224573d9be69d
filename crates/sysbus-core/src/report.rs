//! Text formatting of device answers for the command-line reports.

use std::collections::BTreeSet;

use serde_json::Value;

/// Width of the label column in `info`-style reports.
const LABEL_WIDTH: usize = 20;

/// Scalar as plain text: strings unquoted, `null` empty, the rest as JSON.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Text of `value` at a JSON pointer, empty when absent.
#[must_use]
pub fn text_at(value: &Value, pointer: &str) -> String {
    value.pointer(pointer).map(display_value).unwrap_or_default()
}

/// Pretty JSON, falling back to the compact form.
#[must_use]
pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// `            UpTime : 1 day, 2:03:04`
#[must_use]
pub fn labeled(label: &str, value: &str) -> String {
    format!("{label:>LABEL_WIDTH$} : {value}")
}

/// Format a duration like `2 days, 3:04:05` or `0:00:42`.
#[must_use]
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = seconds % 86_400 / 3_600;
    let minutes = seconds % 3_600 / 60;
    let seconds = seconds % 60;
    let clock = format!("{hours}:{minutes:02}:{seconds:02}");

    match days {
        0 => clock,
        1 => format!("1 day, {clock}"),
        n => format!("{n} days, {clock}"),
    }
}

fn as_seconds(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Lines for a `DeviceInfo:get` result.
#[must_use]
pub fn device_info_lines(result: &Value) -> Vec<String> {
    let uptime = result
        .pointer("/status/UpTime")
        .and_then(as_seconds)
        .map(format_uptime)
        .unwrap_or_default();

    vec![
        labeled("SoftwareVersion", &text_at(result, "/status/SoftwareVersion")),
        labeled("UpTime", &uptime),
        labeled("ExternalIPAddress", &text_at(result, "/status/ExternalIPAddress")),
    ]
}

/// Lines for a `NMC:getWANStatus` result.
#[must_use]
pub fn wan_lines(result: &Value) -> Vec<String> {
    vec![
        labeled("IPv6DelegatedPrefix", &text_at(result, "/data/IPv6DelegatedPrefix")),
        labeled("IPv6Address", &text_at(result, "/data/IPv6Address")),
    ]
}

/// Enabled directory numbers from a `VoiceApplication:listTrunks` result.
#[must_use]
pub fn phone_number_lines(result: &Value) -> Vec<String> {
    status_array(result)
        .iter()
        .filter_map(|trunk| trunk.get("trunk_lines").and_then(Value::as_array))
        .flatten()
        .filter(|line| line.get("enable").and_then(Value::as_str) == Some("Enabled"))
        .map(|line| labeled("directoryNumber", &text_at(line, "/directoryNumber")))
        .collect()
}

/// One line per wireless VAP of a `NeMo.Intf.lan:getMIBs` result.
#[must_use]
pub fn wifi_lines(result: &Value) -> Vec<String> {
    let Some(Value::Object(vaps)) = result.pointer("/status/wlanvap") else {
        return Vec::new();
    };

    vaps.iter()
        .map(|(name, vap)| {
            format!(
                "{name} {} {} {} {}",
                text_at(vap, "/BSSID"),
                text_at(vap, "/SSID"),
                text_at(vap, "/Security/KeyPassPhrase"),
                text_at(vap, "/Security/ModeEnabled")
            )
        })
        .collect()
}

/// The `status` array of a result, empty when absent.
#[must_use]
pub fn status_array(result: &Value) -> &[Value] {
    result
        .get("status")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Names under `status`: array items or object keys.
#[must_use]
pub fn status_names(result: &Value) -> BTreeSet<String> {
    match result.get("status") {
        Some(Value::Array(items)) => items.iter().map(display_value).collect(),
        Some(Value::Object(entries)) => entries.keys().cloned().collect(),
        _ => BTreeSet::new(),
    }
}

/// Table row for a host of `Hosts:getDevices`; inactive hosts are starred.
#[must_use]
pub fn host_line(host: &Value) -> String {
    let active = host.get("active").and_then(Value::as_bool).unwrap_or(false);
    format!(
        "{:<18} {:<5} {} {:<30} {}",
        text_at(host, "/physAddress"),
        text_at(host, "/layer2Interface"),
        if active { ' ' } else { '*' },
        text_at(host, "/ipAddress"),
        text_at(host, "/hostName")
    )
}

/// Hosts whose MAC, client id or IP equals one of `filters`, in filter order.
#[must_use]
pub fn filter_hosts<'a, S: AsRef<str>>(hosts: &'a [Value], filters: &[S]) -> Vec<&'a Value> {
    filters
        .iter()
        .flat_map(|filter| {
            let filter = filter.as_ref();
            hosts.iter().filter(move |host| {
                ["physAddress", "clientID", "ipAddress"]
                    .iter()
                    .any(|key| host.get(*key).and_then(Value::as_str) == Some(filter))
            })
        })
        .collect()
}

/// Row for a device with a global IPv6 address, `None` otherwise.
#[must_use]
pub fn ipv6_line(device: &Value) -> Option<String> {
    let address = device
        .get("IPv6Address")
        .and_then(Value::as_array)?
        .iter()
        .rev()
        .filter(|entry| entry.get("Scope").and_then(Value::as_str) != Some("link"))
        .find_map(|entry| entry.get("Address").map(display_value))?;

    let ipv4 = device
        .get("IPAddress")
        .map_or_else(|| "-".to_string(), display_value);

    Some(format!(
        "{:>4} {:<32} {:<5} {:<16} {}",
        text_at(device, "/Index"),
        text_at(device, "/Name"),
        text_at(device, "/Active"),
        ipv4,
        address
    ))
}

/// MAC addresses of a `getStaticLeases` result.
#[must_use]
pub fn lease_macs(result: &Value) -> Vec<String> {
    status_array(result)
        .iter()
        .filter_map(|lease| lease.get("MACAddress").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}
