//! Flat reference export
//!
//! Writes one CSV row per leaf code so a value-set document can be reviewed
//! in spreadsheet tooling. Columns: `id,name,description,codesystem,code,op`.

use crate::range::RangeExpander;
use log::info;
use serde::Serialize;
use std::io::Write;
use vsql_diagnostics::{Result, VsqlError};
use vsql_model::{FilterOperator, FilterProperty, ValueSetDocument, ValueSetEntry};

/// One exported code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub codesystem: String,
    pub code: String,
    pub op: String,
}

impl ReferenceRow {
    fn new(entry: &ValueSetEntry, system: &str, code: &str, op: FilterOperator) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            description: entry.description.clone(),
            codesystem: system.to_string(),
            code: code.trim().to_string(),
            op: op.as_str().to_string(),
        }
    }
}

/// Flattens a document into reference rows, in document order.
///
/// Code ranges are expanded and exported with op `exists`; other filter
/// values keep their filter's op; concepts use their own op or `exists`.
pub fn reference_rows(document: &ValueSetDocument, expander: &RangeExpander) -> Result<Vec<ReferenceRow>> {
    let mut rows = Vec::new();

    for entry in document {
        for block in entry.includes() {
            let system = block.system.as_str();

            for filter in block.filter.iter().flatten() {
                for value in &filter.value {
                    if filter.property == FilterProperty::CodeRange {
                        let codes = expander.expand(value).map_err(|e| e.with_entry(&entry.name))?;
                        rows.extend(
                            codes
                                .iter()
                                .map(|code| ReferenceRow::new(entry, system, code, FilterOperator::Exists)),
                        );
                    } else {
                        rows.push(ReferenceRow::new(entry, system, value, filter.op));
                    }
                }
            }

            for concept in block.concept.iter().flatten() {
                let op = concept.op.unwrap_or(FilterOperator::Exists);
                rows.push(ReferenceRow::new(entry, system, &concept.code, op));
            }
        }
    }

    Ok(rows)
}

/// Writes the reference CSV, header included, and returns the row count.
pub fn export_reference<W: Write>(
    document: &ValueSetDocument,
    expander: &RangeExpander,
    writer: W,
) -> Result<usize> {
    let rows = reference_rows(document, expander)?;
    let mut csv = csv::Writer::from_writer(writer);
    for row in &rows {
        csv.serialize(row).map_err(|e| VsqlError::export(e.to_string()))?;
    }
    csv.flush().map_err(|e| VsqlError::export(e.to_string()))?;
    info!("Exported {} reference rows from {} entries", rows.len(), document.len());
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vsql_diagnostics::VSQL0103;

    const DOC: &str = r#"[{
        "id": "CDE9", "name": "IBD", "description": "inflammatory bowel disease",
        "compose": {"include": [
            {"system": "icd10cm", "filter": [
                {"property": "codeRange", "op": "in", "value": ["K50-K51"]},
                {"property": "codePrecision", "op": "descendent-of", "value": ["556"]}
            ]},
            {"system": "snomed", "concept": [{"code": "24526004", "op": "is-a"}, {"code": "34000006"}]}
        ]}
    }]"#;

    #[test]
    fn test_rows_cover_every_filter_and_concept() {
        let doc = ValueSetDocument::from_json_str(DOC).unwrap();
        let rows = reference_rows(&doc, &RangeExpander::default()).unwrap();

        let flat: Vec<(&str, &str, &str)> = rows
            .iter()
            .map(|r| (r.codesystem.as_str(), r.code.as_str(), r.op.as_str()))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("icd10cm", "K50", "exists"),
                ("icd10cm", "K51", "exists"),
                ("icd10cm", "556", "descendent-of"),
                ("snomedct", "24526004", "is-a"),
                ("snomedct", "34000006", "exists"),
            ]
        );
    }

    #[test]
    fn test_csv_layout() {
        let doc = ValueSetDocument::from_json_str(DOC).unwrap();
        let mut out = Vec::new();
        let count = export_reference(&doc, &RangeExpander::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(count, 5);
        assert_eq!(lines[0], "id,name,description,codesystem,code,op");
        assert_eq!(lines[1], "CDE9,IBD,inflammatory bowel disease,icd10cm,K50,exists");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_bad_range_names_entry() {
        let doc = ValueSetDocument::from_json_str(&DOC.replace("K50-K51", "K50-")).unwrap();
        let err = reference_rows(&doc, &RangeExpander::default()).unwrap_err();
        assert_eq!(err.code(), VSQL0103);
        assert_eq!(err.entry(), Some("IBD"));
    }
}
