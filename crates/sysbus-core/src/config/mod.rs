mod dirs;
mod settings;
mod validation;

pub use dirs::Directories;
pub use settings::{
    Config, DEFAULT_PASSWORD, DEFAULT_TIMEOUT_SECS, DEFAULT_URL, DEFAULT_USER, Overrides,
};
pub use validation::warn_unknown_fields;
