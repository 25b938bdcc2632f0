//! Compile and predicates command implementation

use super::config::{RequestArgs, RequestConfig};
use super::resolver::CliResolver;
use super::{load_document, output};
use anyhow::{Context, Result};
use log::debug;
use std::path::PathBuf;
use vsql_compiler::Compiler;
use vsql_diagnostics::Diagnostic;

/// Configuration for compile and predicates commands
pub struct CompileConfig {
    pub document: String,
    pub request: RequestArgs,
    pub output_file: Option<PathBuf>,
}

/// What the command prints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutput {
    /// The assembled `UNION ALL` query
    Sql,
    /// The entry-name to predicate mapping as JSON
    Predicates { pretty: bool },
}

/// Compile a document and print the query or the predicates
pub fn compile(config: CompileConfig, mode: CompileOutput) -> Result<()> {
    let request_config = RequestConfig::from_args(&config.request)?;
    let request = request_config.to_request().context("Invalid compile request")?;
    debug!("Compile request: {:?}", request);

    let document = load_document(&config.document)?;
    let compiler = Compiler::new(request)?;
    let mut resolver = CliResolver::new(request_config.code_types, !config.request.no_prompt);

    let content = match mode {
        CompileOutput::Sql => {
            let query = compiler.compile(&document, &mut resolver)?;
            report(&query.diagnostics);
            if query.is_empty() {
                eprintln!("{}", output::format_warning("No entry has applicable codes for this request"));
            }
            query.sql
        }
        CompileOutput::Predicates { pretty } => {
            let predicates = compiler.predicates(&document, &mut resolver)?;
            report(predicates.diagnostics());
            output::format_json(&predicates, pretty)?
        }
    };

    output::write_output(&content, config.output_file.as_deref())
}

fn report(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{}", output::format_diagnostic(diagnostic));
    }
}
