//! Test module for sysbus-core
//!
//! This module contains tests for:
//! - Configuration loading, defaults, overrides and saving
//! - Datamodel rendering
//! - Report formatting of device answers
//! - `scripts.js` reference scanning and module extraction
//! - Graphviz export
//! - The shortcut table

mod config_tests;
mod fixtures;
mod scripts_tests;
