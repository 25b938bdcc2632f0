//! Validate command implementation
//!
//! A document is valid when it loads and compiles under every domain. Code
//! types are answered with placeholders, so no site configuration is needed.

use super::{load_document, output};
use anyhow::{Result, bail};
use colored::Colorize;
use vsql_compiler::{CompileRequest, Compiler, FilterMode};
use vsql_diagnostics::Diagnostic;
use vsql_model::{CodingSystem, Domain, ValueSetDocument};

/// Configuration for validate command
pub struct ValidateConfig {
    pub documents: Vec<String>,
    /// Treat warnings as errors
    pub strict: bool,
    pub verbose: bool,
}

/// Validation result for a single document
struct ValidationResult {
    document: String,
    error: Option<String>,
    warnings: Vec<Diagnostic>,
}

/// Validate value-set documents
pub fn validate(config: ValidateConfig) -> Result<()> {
    if config.documents.is_empty() {
        bail!("No documents specified for validation");
    }

    let results: Vec<ValidationResult> = config
        .documents
        .iter()
        .map(|document| validate_document(document, config.verbose))
        .collect();

    for result in &results {
        print_validation_result(result);
    }

    let errors = results.iter().filter(|r| r.error.is_some()).count();
    let warnings: usize = results.iter().map(|r| r.warnings.len()).sum();

    println!();
    if errors == 0 && (warnings == 0 || !config.strict) {
        println!(
            "{}",
            output::format_success(&format!(
                "{} document(s) validated ({} warning(s))",
                results.len(),
                warnings
            ))
        );
        return Ok(());
    }

    if config.strict && warnings > 0 {
        eprintln!("{}", "Strict mode: treating warnings as errors".yellow());
    }
    bail!("Validation failed: {} error(s), {} warning(s)", errors, warnings)
}

fn validate_document(location: &str, verbose: bool) -> ValidationResult {
    if verbose {
        eprintln!("Validating: {}", location);
    }

    let mut result = ValidationResult {
        document: location.to_string(),
        error: None,
        warnings: Vec::new(),
    };

    match load_document(location).and_then(|document| check_compiles(&document)) {
        Ok(warnings) => result.warnings = warnings,
        Err(e) => result.error = Some(format!("{:#}", e)),
    }
    result
}

/// Compiles the document for each domain, collecting warnings.
///
/// Lenient mode lets one pass report every dropped filter.
fn check_compiles(document: &ValueSetDocument) -> Result<Vec<Diagnostic>> {
    let mut warnings = Vec::new();
    let mut placeholder = |system: CodingSystem| system.as_str().to_uppercase();

    for domain in Domain::ALL {
        let request = CompileRequest::builder()
            .dialect("snow")
            .domain(domain.as_str())
            .code_field("CODE")
            .code_type_field("CODE_TYPE")
            .value_field("RESULT_NUM")
            .date_fields(["CODE_DATE"])
            .source_table("SOURCE")
            .filter_mode(FilterMode::Lenient)
            .build()?;
        let predicates = Compiler::new(request)?.predicates(document, &mut placeholder)?;
        for diagnostic in predicates.diagnostics() {
            if !warnings.contains(diagnostic) {
                warnings.push(diagnostic.clone());
            }
        }
    }
    Ok(warnings)
}

fn print_validation_result(result: &ValidationResult) {
    let status = if result.error.is_none() {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("{} {}", status, result.document.cyan());

    if let Some(error) = &result.error {
        println!("  {}: {}", "error".red().bold(), error);
    }
    for warning in &result.warnings {
        println!("  {}", output::format_diagnostic(warning));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use vsql_diagnostics::{VSQL0102, VSQL0103};

    const DROPPED_FILTERS: &str = r#"[
        {
            "id": "CDE1",
            "name": "MI",
            "compose": {"include": [{"system": "icd10cm", "filter": [
                {"property": "codeList", "op": "exists", "value": ["I21.9"]},
                {"property": "textRegex", "op": "regex", "value": ["^I21"]},
                {"property": "textRegex", "op": "regex", "value": ["^I21"]}
            ]}]}
        },
        {
            "id": "CDE2",
            "name": "eGFR",
            "compose": {"include": [{"system": "loinc", "filter": [
                {"property": "codeList", "op": "exists", "value": ["33914-3"]},
                {"property": "textRegex", "op": "regex", "value": ["GFR"]}
            ]}]}
        }
    ]"#;

    fn document(json: &str) -> ValueSetDocument {
        ValueSetDocument::from_json_str(json).unwrap()
    }

    #[test]
    fn test_warnings_collected_across_domains() {
        let warnings = check_compiles(&document(DROPPED_FILTERS)).unwrap();

        let entries: Vec<_> = warnings.iter().map(|w| w.entry.as_deref()).collect();
        assert_eq!(entries, vec![Some("MI"), Some("eGFR")]);
        assert!(warnings.iter().all(|w| w.code == VSQL0102));
    }

    #[test]
    fn test_clean_document_has_no_warnings() {
        let json = DROPPED_FILTERS.replace("textRegex", "codeList").replace("\"regex\"", "\"exists\"");
        assert!(check_compiles(&document(&json)).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_range_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"[{"id": "CDE3", "name": "CKD", "compose": {"include": [
                {"system": "icd10cm", "filter": [{"property": "codeRange", "op": "in", "value": ["N19-N18"]}]}
            ]}}]"#,
        )
        .unwrap();

        let result = validate_document(file.path().to_str().unwrap(), false);
        let error = result.error.unwrap();
        assert!(error.contains(&VSQL0103.to_string()));
        assert!(error.contains("CKD"));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_strict_mode_fails_on_warnings() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(DROPPED_FILTERS.as_bytes()).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let lenient = ValidateConfig {
            documents: vec![path.clone()],
            strict: false,
            verbose: false,
        };
        assert!(validate(lenient).is_ok());

        let strict = ValidateConfig {
            documents: vec![path],
            strict: true,
            verbose: false,
        };
        assert!(validate(strict).is_err());
    }
}
