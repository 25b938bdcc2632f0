//! Export command implementation

use super::{load_document, output};
use anyhow::Result;
use std::path::PathBuf;
use vsql_compiler::{RangeExpander, RangePadding, export_reference};

/// Configuration for export command
pub struct ExportConfig {
    pub document: String,
    pub range_padding: RangePadding,
    pub max_range_len: u64,
    pub output_file: Option<PathBuf>,
}

/// Write the flat reference CSV for a document
pub fn export(config: ExportConfig) -> Result<()> {
    let document = load_document(&config.document)?;
    let writer = output::open_output(config.output_file.as_deref())?;
    let expander = RangeExpander::new(config.range_padding).with_max_len(config.max_range_len);
    let rows = export_reference(&document, &expander, writer)?;

    if let Some(path) = &config.output_file {
        eprintln!(
            "{}",
            output::format_success(&format!("Exported {} codes to {}", rows, path.display()))
        );
    }
    Ok(())
}
