//! Graphviz export of the `NeMo` interface stack and the device topology.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::report::display_value;
use crate::{Error, Result};

/// Keys present on every topology node; left out of detailed labels.
const COMMON_DEVICE_KEYS: &[&str] = &[
    "Tags",
    "DiscoverySource",
    "Key",
    "Alternative",
    "Active",
    "Index",
    "LastConnection",
    "Name",
    "LastChanged",
    "Names",
    "DeviceType",
    "Master",
    "DeviceTypes",
    "Children",
];

/// Noisy keys left out of detailed labels.
const IGNORED_DEVICE_KEYS: &[&str] = &["ClientID", "Ageing", "IPAddressSource", "VendorClassID"];

/// Keys listed first in detailed labels.
const HEADLINE_DEVICE_KEYS: &[&str] = &["Name", "Index", "DeviceType", "LastConnection"];

/// A directed graph in the DOT language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digraph {
    name: String,
    statements: Vec<String>,
}

impl Digraph {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            statements: Vec::new(),
        }
    }

    /// Default attributes for `graph`, `node` or `edge`.
    pub fn attr(&mut self, kind: &str, attrs: &[(&str, &str)]) {
        self.statements.push(format!("{kind}{}", attr_list(attrs)));
    }

    pub fn node(&mut self, id: &str, attrs: &[(&str, &str)]) {
        self.statements.push(format!("{}{}", quote(id), attr_list(attrs)));
    }

    pub fn edge(&mut self, from: &str, to: &str) {
        self.statements
            .push(format!("{} -> {}", quote(from), quote(to)));
    }

    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = format!("digraph {} {{\n", quote(&self.name));
        for statement in &self.statements {
            let _ = writeln!(dot, "\t{statement}");
        }
        dot.push_str("}\n");
        dot
    }

    /// Write the DOT source to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.to_dot())
    }
}

/// Quote an identifier; backslash escapes such as `\n` are kept for Graphviz.
fn quote(text: &str) -> String {
    let mut quoted = format!("\"{}", text.replace('"', "\\\""));
    // a dangling backslash would escape the closing quote
    let trailing = quoted.chars().rev().take_while(|&c| c == '\\').count();
    if trailing % 2 == 1 {
        quoted.push('\\');
    }
    quoted.push('"');
    quoted
}

fn attr_list(attrs: &[(&str, &str)]) -> String {
    if attrs.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = attrs
        .iter()
        .map(|(name, value)| format!("{name}={}", quote(value)))
        .collect();
    format!(" [{}]", pairs.join(" "))
}

/// Interface graph from the `base` MIB of every `NeMo` interface.
///
/// Enabled interfaces are boxes, disabled ones grey ellipses; interfaces
/// without an `Enable` flag are grey boxes. Edges follow `LLIntf`.
#[must_use]
pub fn interface_graph(base: &Map<String, Value>) -> Digraph {
    let mut dot = Digraph::new("NeMo.Intf");
    dot.attr("node", &[("fontname", "Helvetica")]);

    for (name, intf) in base {
        match intf.get("Enable").map(|enable| enable.as_bool() == Some(true)) {
            Some(true) => dot.node(name, &[("shape", "box")]),
            Some(false) => dot.node(name, &[("shape", "ellipse"), ("color", "lightgrey")]),
            None => dot.node(name, &[("shape", "box"), ("color", "lightgrey")]),
        }
    }

    for (name, intf) in base {
        let lower = intf.get("LLIntf").and_then(Value::as_array);
        for target in lower.into_iter().flatten().filter_map(Value::as_str) {
            dot.edge(name, target);
        }
    }

    dot
}

/// Topology graph rooted at the devices of `Devices.Device.HGW:topology`.
///
/// With `simple`, nodes are labelled with the device name only.
#[must_use]
pub fn topology_graph(roots: &[Value], simple: bool) -> Digraph {
    let mut dot = Digraph::new("Devices");
    dot.attr("graph", &[("rankdir", "LR")]);
    dot.attr("node", &[("shape", "box")]);

    for root in roots {
        add_device(&mut dot, root, simple);
    }
    dot
}

fn device_id(device: &Value) -> String {
    device
        .get("Key")
        .map(display_value)
        .unwrap_or_default()
        .replace(':', "_")
}

fn add_device(dot: &mut Digraph, device: &Value, simple: bool) {
    let id = device_id(device);
    let label = if simple {
        device.get("Name").map(display_value).unwrap_or_default()
    } else {
        device_label(device)
    };
    let active = device.get("Active").and_then(Value::as_bool).unwrap_or(false);
    let color = if active { "black" } else { "lightgrey" };
    dot.node(&id, &[("label", label.as_str()), ("color", color)]);

    if let Some(Value::Array(children)) = device.get("Children") {
        for child in children {
            dot.edge(&id, &device_id(child));
            add_device(dot, child, simple);
        }
    }
}

fn device_label(device: &Value) -> String {
    let mut label = String::new();
    for key in HEADLINE_DEVICE_KEYS {
        let text = device.get(*key).map(display_value).unwrap_or_default();
        if !text.is_empty() {
            let _ = write!(label, "{key}: {text}\\n");
        }
    }
    label.push_str("\\n");

    if let Value::Object(entries) = device {
        for (key, value) in entries {
            if COMMON_DEVICE_KEYS.contains(&key.as_str())
                || IGNORED_DEVICE_KEYS.contains(&key.as_str())
                || value.is_array()
            {
                continue;
            }
            let text = display_value(value);
            if !text.is_empty() {
                let _ = write!(label, "{key}: {text}\\n");
            }
        }
    }
    label
}

/// Render `dot_file` to SVG next to it with the `dot` executable.
///
/// Returns `Ok(None)` when Graphviz is not installed.
///
/// # Errors
///
/// Returns `Error::Render` if `dot` fails.
pub fn render_svg(dot_file: &Path) -> Result<Option<PathBuf>> {
    let svg = dot_file.with_extension("svg");
    let output = match Command::new("dot")
        .arg("-Tsvg")
        .arg("-o")
        .arg(&svg)
        .arg(dot_file)
        .output()
    {
        Ok(output) => output,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Graphviz 'dot' not found, leaving {}", dot_file.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    if !output.status.success() {
        return Err(Error::Render(format!(
            "dot exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    debug!("Rendered {}", svg.display());
    Ok(Some(svg))
}
