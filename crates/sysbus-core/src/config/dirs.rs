use directories::ProjectDirs;
use std::path::PathBuf;

use crate::{Error, Result};

/// Per-user configuration location
#[derive(Debug, Clone)]
pub struct Directories {
    /// Config directory (~/.config/sysbus)
    pub config: PathBuf,

    /// Config file path
    pub config_file: PathBuf,
}

impl Directories {
    /// Resolve the standard per-user config directory.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if no home directory can be determined.
    pub fn new() -> Result<Self> {
        let project = ProjectDirs::from("", "", "sysbus")
            .ok_or_else(|| Error::Config("cannot determine the home directory".to_string()))?;
        Ok(Self::with_base(project.config_dir().to_path_buf()))
    }

    #[must_use]
    pub fn with_base(base: PathBuf) -> Self {
        Self {
            config_file: base.join("config.json"),
            config: base,
        }
    }
}
