use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use sysbus_rpc::Credentials;
use sysbus_rpc::transport::with_trailing_slash;
use tracing::debug;

pub const DEFAULT_URL: &str = "http://livebox.home/";
pub const DEFAULT_USER: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_password")]
    pub password: String,

    /// Timeout applied to every HTTP request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}
fn default_user() -> String {
    DEFAULT_USER.to_string()
}
fn default_password() -> String {
    DEFAULT_PASSWORD.to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: default_url(),
            user: default_user(),
            password: default_password(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Values given on the command line; they win over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Config {
    /// Load config from file, falling back to defaults when it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid JSON
    /// or sets a zero timeout.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        super::validation::warn_unknown_fields(&content, "config.json");
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config for a command that logs into the device.
    ///
    /// A missing file is only acceptable when the password comes from the
    /// command line.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotConfigured` for a missing file without a password
    /// override, otherwise the errors of [`Config::load`].
    pub fn load_required(path: &Path, overrides: &Overrides) -> Result<Self> {
        if !path.exists() && overrides.password.is_none() {
            return Err(Error::NotConfigured {
                path: path.to_path_buf(),
            });
        }
        Self::load(path)
    }

    /// Save config to file, creating the parent directory.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        let mut file = open_private(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(url) = &overrides.url {
            self.url.clone_from(url);
        }
        if let Some(user) = &overrides.user {
            self.user.clone_from(user);
        }
        if let Some(password) = &overrides.password {
            self.password.clone_from(password);
        }
        self.url = with_trailing_slash(&self.url);
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.url, &self.user, &self.password)
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeoutSecs must be positive".to_string()));
        }
        if self.url.trim().is_empty() {
            return Err(Error::Config("url must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Open `path` for writing, readable by the owner only, before any content
/// lands in it. An existing file is narrowed to the same mode.
#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<File> {
    File::create(path)
}
