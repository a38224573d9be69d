//! Analysis of the web interface bundle `scripts.js`.
//!
//! The bundle references sysbus objects as string literals such as
//! `"sysbus.NMC.Wifi:get"` and concatenates its modules, each introduced by a
//! `/*jsdep web/js/... */` comment.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};

use crate::Result;

/// Name of the bundle on the device and in the working directory.
pub const SCRIPTS_FILE: &str = "scripts.js";

/// Output file for what precedes the first module marker.
pub const MAIN_MODULE: &str = "web/js/MAIN.js";

/// Object path to the method names referenced on it.
pub type References = BTreeMap<String, BTreeSet<String>>;

/// Collect the sysbus references found in `source`.
///
/// Dynamic parts of a path (`"...` + expr + `..."`) collapse to `<o>`, and
/// slash-separated paths are reported in dotted form.
///
/// # Errors
///
/// Returns `Error::Pattern` if a pattern fails to compile.
pub fn scan(source: &str) -> Result<References> {
    let reference = Regex::new(r#""/?(sysbus[./].*)""#)?;
    let quoted = Regex::new(r#""(.*)""#)?;

    let mut references = References::new();
    for captures in reference.captures_iter(source) {
        let literal = &captures[1];
        let (object, method) = literal.split_once(':').unwrap_or((literal, ""));
        let method = method.split('"').next().unwrap_or_default();

        let object = quoted.replace_all(object, "<o>").replace('/', ".");
        references
            .entry(object)
            .or_default()
            .insert(method.to_string());
    }

    debug!("Found {} sysbus objects", references.len());
    Ok(references)
}

/// `object [method, ...]` lines, sorted by object.
#[must_use]
pub fn format_references(references: &References) -> Vec<String> {
    references
        .iter()
        .map(|(object, methods)| {
            let methods: Vec<&str> = methods.iter().map(String::as_str).collect();
            format!("{object} [{}]", methods.join(", "))
        })
        .collect()
}

/// One module of the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptModule {
    pub path: PathBuf,
    pub content: String,
}

/// The bundle split at its module markers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    /// Modules in bundle order.
    pub modules: Vec<ScriptModule>,
    /// Text before the first marker.
    pub main: String,
}

/// Split `source` at its `/*jsdep ... */` markers.
///
/// Each module runs from its marker to the next one; its path is the
/// `web/js...` name inside the marker. Markers without a usable name are
/// dropped with a warning.
///
/// # Errors
///
/// Returns `Error::Pattern` if a pattern fails to compile.
pub fn split_bundle(source: &str) -> Result<Bundle> {
    let marker = Regex::new(r"/\*jsdep.*\*/")?;
    let name = Regex::new(r"(web/js.*) ")?;

    let starts: Vec<usize> = marker.find_iter(source).map(|m| m.start()).collect();
    let ends = starts.iter().skip(1).copied().chain([source.len()]);

    let mut modules = Vec::with_capacity(starts.len());
    for (start, end) in starts.iter().copied().zip(ends) {
        let content = &source[start..end];
        let Some(captures) = name.captures(content) else {
            warn!("Module marker at offset {start} has no web/js name");
            continue;
        };

        let path = PathBuf::from(&captures[1]);
        if !is_relative_inside(&path) {
            warn!("Skipping module with unsafe path {}", path.display());
            continue;
        }

        modules.push(ScriptModule {
            path,
            content: content.to_string(),
        });
    }

    let main_end = starts.first().copied().unwrap_or(source.len());
    Ok(Bundle {
        modules,
        main: source[..main_end].to_string(),
    })
}

/// Write the modules and [`MAIN_MODULE`] under `root`; returns the module count.
///
/// # Errors
///
/// Returns an error if a directory or file cannot be written.
pub fn write_bundle(bundle: &Bundle, root: &Path) -> Result<usize> {
    for module in &bundle.modules {
        write_file(&root.join(&module.path), &module.content)?;
    }
    write_file(&root.join(MAIN_MODULE), &bundle.main)?;
    Ok(bundle.modules.len())
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

fn is_relative_inside(path: &Path) -> bool {
    path.components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}
