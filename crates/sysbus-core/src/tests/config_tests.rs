//! Tests for configuration loading and defaults
//!
//! Tests the config system including:
//! - Config defaults
//! - Partial files and unknown keys
//! - Command-line overrides
//! - Save/load round trips
//! - Missing configuration handling

use crate::Error;
use crate::config::{Config, Directories, Overrides};
use std::time::Duration;
use tempfile::TempDir;

fn config_path(dir: &TempDir) -> std::path::PathBuf {
    Directories::with_base(dir.path().to_path_buf()).config_file
}

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.url, "http://livebox.home/");
    assert_eq!(config.user, "admin");
    assert_eq!(config.password, "admin");
    assert_eq!(config.timeout_secs, 30);
    assert_eq!(config.timeout(), Duration::from_secs(30));
}

#[test]
fn test_config_parse_minimal() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_parse_partial() {
    let json = r#"{"password": "1234ABCD", "timeoutSecs": 5}"#;
    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.password, "1234ABCD");
    assert_eq!(config.timeout_secs, 5);
    assert_eq!(config.user, "admin");
}

#[test]
fn test_load_missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load(&config_path(&dir)).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_load_invalid_json_fails() {
    let dir = TempDir::new().unwrap();
    let path = config_path(&dir);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(Config::load(&path), Err(Error::Json(_))));
}

#[test]
fn test_load_rejects_zero_timeout() {
    let dir = TempDir::new().unwrap();
    let path = config_path(&dir);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, r#"{"timeoutSecs": 0}"#).unwrap();

    assert!(matches!(Config::load(&path), Err(Error::Config(_))));
}

#[test]
fn test_load_tolerates_unknown_keys() {
    let dir = TempDir::new().unwrap();
    let path = config_path(&dir);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, r#"{"user": "root", "pasword": "typo"}"#).unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.user, "root");
    assert_eq!(config.password, "admin");
}

#[test]
fn test_save_load_roundtrip_creates_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let config = Config {
        url: "http://192.168.1.1/".to_string(),
        user: "admin".to_string(),
        password: "secret".to_string(),
        timeout_secs: 10,
    };
    config.save(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"timeoutSecs\": 10"));
    assert_eq!(Config::load(&path).unwrap(), config);
}

#[cfg(unix)]
#[test]
fn test_saved_config_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = config_path(&dir);
    Config::default().save(&path).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[cfg(unix)]
#[test]
fn test_save_narrows_existing_file_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = config_path(&dir);
    std::fs::write(&path, "{}").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

    Config::default().save(&path).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    assert_eq!(Config::load(&path).unwrap(), Config::default());
}

#[test]
fn test_load_required_without_file() {
    let dir = TempDir::new().unwrap();
    let path = config_path(&dir);

    let err = Config::load_required(&path, &Overrides::default()).unwrap_err();
    assert!(matches!(err, Error::NotConfigured { .. }));

    let overrides = Overrides {
        password: Some("pw".to_string()),
        ..Overrides::default()
    };
    let config = Config::load_required(&path, &overrides)
        .unwrap()
        .with_overrides(&overrides);
    assert_eq!(config.password, "pw");
}

#[test]
fn test_overrides_win_and_url_gets_slash() {
    let overrides = Overrides {
        url: Some("http://192.168.1.1".to_string()),
        user: Some("root".to_string()),
        password: None,
    };
    let config = Config::default().with_overrides(&overrides);

    assert_eq!(config.url, "http://192.168.1.1/");
    assert_eq!(config.user, "root");
    assert_eq!(config.password, "admin");
}

#[test]
fn test_credentials_from_config() {
    let credentials = Config::default().credentials();
    assert_eq!(credentials.url, "http://livebox.home/");
    assert_eq!(credentials.username, "admin");
    assert_eq!(credentials.password, "admin");
}
