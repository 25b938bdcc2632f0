//! CLI functionality for the vsql tool
//!
//! This module contains all CLI-related functionality including:
//! - Request configuration (config file plus flags)
//! - Interactive code-type prompting
//! - Compile, predicates, export, list and validate commands
//! - Output formatting

pub mod compile;
pub mod config;
pub mod export;
pub mod list;
pub mod output;
pub mod resolver;
pub mod validate;

use anyhow::{Context, Result};
use vsql_model::{DocumentSource, ValueSetDocument};

/// Loads the document named on the command line.
pub fn load_document(location: &str) -> Result<ValueSetDocument> {
    let source = DocumentSource::parse(location);
    ValueSetDocument::load(&source).with_context(|| format!("Failed to load document: {}", source))
}
