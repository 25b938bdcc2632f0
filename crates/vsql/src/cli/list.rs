//! List command implementation

use super::{load_document, output};
use anyhow::Result;
use std::path::PathBuf;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use vsql_model::{ValueSetDocument, ValueSetEntry};

/// Configuration for list command
pub struct ListConfig {
    pub document: String,
    pub output_file: Option<PathBuf>,
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Topic")]
    topic: String,
    #[tabled(rename = "Value type")]
    value_type: String,
    #[tabled(rename = "Systems")]
    systems: String,
}

impl From<&ValueSetEntry> for EntryRow {
    fn from(entry: &ValueSetEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            topic: entry.topic.map(|t| t.to_string()).unwrap_or_default(),
            value_type: entry.value_type().map(|v| v.to_string()).unwrap_or_default(),
            systems: entry
                .systems()
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Render the entries of a document as a table
pub fn format_entries(document: &ValueSetDocument) -> String {
    if document.is_empty() {
        return "(no entries)".to_string();
    }
    let rows: Vec<EntryRow> = document.iter().map(EntryRow::from).collect();
    Table::new(rows).with(Style::modern()).to_string()
}

/// Print a table of a document's entries
pub fn list(config: ListConfig) -> Result<()> {
    let document = load_document(&config.document)?;
    output::write_output(&format_entries(&document), config.output_file.as_deref())
}
