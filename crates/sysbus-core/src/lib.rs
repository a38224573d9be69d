//! Everything the `sysbus` command needs besides the protocol itself:
//! configuration, the shortcut table, and the text, datamodel, Graphviz and
//! `scripts.js` outputs built from device answers.

pub mod config;
pub mod graph;
pub mod model;
pub mod report;
pub mod scripts;
pub mod shortcuts;

mod error;

#[cfg(test)]
mod tests;

pub use error::{Error, Result};
