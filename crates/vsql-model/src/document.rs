//! Value-set document loading and validation.

use crate::value_set::{Criteria, ValueSetEntry};
use log::{debug, info};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use vsql_diagnostics::{Result, VSQL0003, VsqlError, decode_error, read_error};

/// Where a value-set document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// Local JSON file
    Path(PathBuf),
    /// Raw-content HTTP(S) URL
    Url(String),
}

impl DocumentSource {
    /// Classifies a location string: `http://` and `https://` are URLs,
    /// anything else is a local path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Url(location.to_string())
        } else {
            Self::Path(PathBuf::from(location))
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// An ordered, validated sequence of value-set entries
///
/// Entry order is preserved from the source; it drives the order of the
/// compiled predicates and of the `UNION ALL` branches.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValueSetDocument {
    entries: Vec<ValueSetEntry>,
}

impl ValueSetDocument {
    /// Builds a document from entries, validating them.
    pub fn new(entries: Vec<ValueSetEntry>) -> Result<Self> {
        let document = Self { entries };
        document.validate()?;
        Ok(document)
    }

    /// Loads a document from its source.
    pub fn load(source: &DocumentSource) -> Result<Self> {
        let document = match source {
            DocumentSource::Path(path) => Self::from_path(path),
            DocumentSource::Url(url) => Self::from_url(url),
        }?;
        info!("Loaded {} value-set entries from {}", document.len(), source);
        Ok(document)
    }

    /// Parses a document from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: Vec<ValueSetEntry> = serde_json::from_str(json).map_err(decode_error)?;
        Self::new(entries)
    }

    /// Parses a document from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let entries: Vec<ValueSetEntry> =
            serde_json::from_reader(reader).map_err(decode_error)?;
        Self::new(entries)
    }

    /// Reads a document from a local file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| read_error(e, path.display().to_string()))?;
        Self::from_reader(BufReader::new(file)).map_err(|e| with_origin(e, path.display()))
    }

    /// Fetches a document over HTTP(S).
    #[cfg(feature = "http")]
    pub fn from_url(url: &str) -> Result<Self> {
        use vsql_diagnostics::VSQL0004;

        debug!("Fetching value-set document from {}", url);
        let body = reqwest::blocking::get(url)
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|e| VsqlError::document_at(VSQL0004, e.to_string(), url))?;
        Self::from_json_str(&body).map_err(|e| with_origin(e, url))
    }

    /// Fetching is compiled out without the `http` feature.
    #[cfg(not(feature = "http"))]
    pub fn from_url(url: &str) -> Result<Self> {
        Err(VsqlError::document_at(
            vsql_diagnostics::VSQL0004,
            "built without the `http` feature",
            url,
        ))
    }

    /// Entries in document order
    pub fn entries(&self) -> &[ValueSetEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValueSetEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an entry by name
    pub fn get(&self, name: &str) -> Option<&ValueSetEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Checks document-level invariants.
    ///
    /// Ids and names are unique, every include block has a non-empty
    /// concept or filter list with no blank codes, and a declared purpose
    /// belongs to the declared topic.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();

        for entry in &self.entries {
            if !ids.insert(entry.id.as_str()) {
                return Err(invalid(format!("duplicate entry id '{}'", entry.id)));
            }
            if !names.insert(entry.name.as_str()) {
                return Err(invalid(format!("duplicate entry name '{}'", entry.name)));
            }

            if let (Some(topic), Some(purpose)) = (entry.topic, entry.purpose) {
                if purpose.topic() != topic {
                    return Err(invalid(format!(
                        "entry '{}': purpose '{}' does not belong to topic '{}'",
                        entry.name, purpose, topic
                    )));
                }
            }

            for (index, block) in entry.includes().iter().enumerate() {
                if block.criteria() == Criteria::Empty {
                    return Err(invalid(format!(
                        "entry '{}': include block {} ({}) has neither concepts nor filters",
                        entry.name, index, block.system
                    )));
                }
                // A blank code becomes a zero-length prefix that matches every row.
                let blank_concept = block.concept.iter().flatten().any(|c| c.code.trim().is_empty());
                let blank_value = block
                    .filter
                    .iter()
                    .flatten()
                    .any(|f| f.value.iter().any(|v| v.trim().is_empty()));
                if blank_concept || blank_value {
                    return Err(invalid(format!(
                        "entry '{}': include block {} ({}) contains a blank code",
                        entry.name, index, block.system
                    )));
                }
            }
        }

        Ok(())
    }
}

impl<'a> IntoIterator for &'a ValueSetDocument {
    type Item = &'a ValueSetEntry;
    type IntoIter = std::slice::Iter<'a, ValueSetEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn invalid(message: String) -> VsqlError {
    VsqlError::document(VSQL0003, message)
}

fn with_origin(error: VsqlError, origin: impl fmt::Display) -> VsqlError {
    match error {
        VsqlError::Document {
            code,
            message,
            origin: None,
        } => VsqlError::document_at(code, message, origin.to_string()),
        other => other,
    }
}
