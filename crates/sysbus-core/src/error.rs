use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no configuration found at {}; run `sysbus config` first", path.display())]
    NotConfigured { path: PathBuf },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Graphviz error: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, Error>;
