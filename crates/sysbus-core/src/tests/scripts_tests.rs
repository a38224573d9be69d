//! Tests for `scripts.js` scanning and module extraction

use crate::scripts::{Bundle, MAIN_MODULE, format_references, scan, split_bundle, write_bundle};
use std::path::PathBuf;
use tempfile::TempDir;

const SOURCE: &str = r#"var a = "sysbus.NMC.Wifi:get";
b("/sysbus/Devices/Device/" + mac + ":setName");
c = "sysbus.NMC.Wifi:set";
d = "sysbus.Time";
e = "not/sysbus.Nothing:here";
"#;

#[test]
fn test_scan_collects_objects_and_methods() {
    let references = scan(SOURCE).unwrap();

    let keys: Vec<&str> = references.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["sysbus.Devices.Device.<o>", "sysbus.NMC.Wifi", "sysbus.Time"]
    );

    let wifi: Vec<&str> = references["sysbus.NMC.Wifi"]
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(wifi, vec!["get", "set"]);
    assert!(references["sysbus.Devices.Device.<o>"].contains("setName"));
    assert!(references["sysbus.Time"].contains(""));
}

#[test]
fn test_scan_truncates_method_at_quote() {
    let references = scan(r#"x = "sysbus.Hosts:getDevices"; y = "other";"#).unwrap();
    assert!(references["sysbus.Hosts"].contains("getDevices"));
}

#[test]
fn test_scan_empty_source() {
    assert!(scan("").unwrap().is_empty());
}

#[test]
fn test_format_references() {
    let lines = format_references(&scan(SOURCE).unwrap());
    assert_eq!(lines[1], "sysbus.NMC.Wifi [get, set]");
    assert_eq!(lines[2], "sysbus.Time []");
}

const BUNDLE: &str = "var main = 1;
/*jsdep web/js/app/a.js */
a();
/*jsdep web/js/app/b.js */
b();
";

#[test]
fn test_split_bundle() {
    let bundle = split_bundle(BUNDLE).unwrap();

    assert_eq!(bundle.main, "var main = 1;\n");
    assert_eq!(bundle.modules.len(), 2);
    assert_eq!(bundle.modules[0].path, PathBuf::from("web/js/app/a.js"));
    assert_eq!(bundle.modules[0].content, "/*jsdep web/js/app/a.js */\na();\n");
    assert_eq!(bundle.modules[1].path, PathBuf::from("web/js/app/b.js"));
    assert_eq!(bundle.modules[1].content, "/*jsdep web/js/app/b.js */\nb();\n");
}

#[test]
fn test_split_bundle_without_markers() {
    let bundle = split_bundle("plain();\n").unwrap();
    assert!(bundle.modules.is_empty());
    assert_eq!(bundle.main, "plain();\n");
}

#[test]
fn test_split_bundle_skips_bad_markers() {
    let source = "m();\n/*jsdep */\nx();\n/*jsdep web/js/../../etc/passwd */\ny();\n";
    let bundle = split_bundle(source).unwrap();

    assert!(bundle.modules.is_empty());
    assert_eq!(bundle.main, "m();\n");
}

#[test]
fn test_write_bundle() {
    let dir = TempDir::new().unwrap();
    let bundle = split_bundle(BUNDLE).unwrap();

    let written = write_bundle(&bundle, dir.path()).unwrap();

    assert_eq!(written, 2);
    let a = std::fs::read_to_string(dir.path().join("web/js/app/a.js")).unwrap();
    assert!(a.ends_with("a();\n"));
    let main = std::fs::read_to_string(dir.path().join(MAIN_MODULE)).unwrap();
    assert_eq!(main, "var main = 1;\n");
}

#[test]
fn test_write_empty_bundle_still_writes_main() {
    let dir = TempDir::new().unwrap();
    let written = write_bundle(&Bundle::default(), dir.path()).unwrap();

    assert_eq!(written, 0);
    assert!(dir.path().join(MAIN_MODULE).exists());
}
