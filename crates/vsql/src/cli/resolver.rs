//! Code-type resolution for the CLI
//!
//! Tokens come from the request's static table first; anything missing is
//! asked for on the terminal unless prompting is disabled.

use std::io::{self, BufRead, Write};
use vsql_compiler::{CodeTypeResolver, FallbackResolver, StaticCodeTypes};
use vsql_diagnostics::{Result, VSQL0200, VsqlError};
use vsql_model::CodingSystem;

/// Asks for each code-type token on an interactive channel
#[derive(Debug)]
pub struct PromptResolver<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptResolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptResolver<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr so stdout carries only the compiled output.
    pub fn terminal() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> CodeTypeResolver for PromptResolver<R, W> {
    fn resolve(&mut self, system: CodingSystem) -> Result<String> {
        write!(self.output, "Enter Code Type Value for {}: ", system)
            .and_then(|()| self.output.flush())
            .map_err(|e| VsqlError::io(&e, "prompt"))?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| VsqlError::io(&e, "prompt"))?;
        if read == 0 {
            return Err(VsqlError::resolution(
                VSQL0200,
                system.as_str(),
                format!("input closed before a code type was entered for '{}'", system),
            ));
        }
        Ok(line.trim().to_string())
    }
}

/// The resolver a CLI compile uses
pub enum CliResolver {
    /// Configured tokens only
    Static(StaticCodeTypes),
    /// Configured tokens, then the terminal
    Prompting(FallbackResolver<StaticCodeTypes, PromptResolver<io::StdinLock<'static>, io::Stderr>>),
}

impl CliResolver {
    pub fn new(code_types: StaticCodeTypes, prompt: bool) -> Self {
        if prompt {
            Self::Prompting(code_types.or_else(PromptResolver::terminal()))
        } else {
            Self::Static(code_types)
        }
    }
}

impl CodeTypeResolver for CliResolver {
    fn resolve(&mut self, system: CodingSystem) -> Result<String> {
        match self {
            Self::Static(table) => table.resolve(system),
            Self::Prompting(chain) => chain.resolve(system),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use vsql_compiler::resolve_code_types;
    use vsql_model::Domain;

    #[test]
    fn test_prompts_once_per_system() {
        let mut output = Vec::new();
        let mut resolver = PromptResolver::new(Cursor::new("RX\n  ND \n"), &mut output);
        let map = resolve_code_types(Some(Domain::Medication), &mut resolver).unwrap();

        assert_eq!(map.get(CodingSystem::RxNorm), Some("RX"));
        assert_eq!(map.get(CodingSystem::Ndc), Some("ND"));
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Enter Code Type Value for rxnorm: Enter Code Type Value for ndc: "
        );
    }

    #[test]
    fn test_closed_input_is_an_error() {
        let mut resolver = PromptResolver::new(Cursor::new(""), Vec::new());
        let err = resolver.resolve(CodingSystem::Loinc).unwrap_err();
        assert_eq!(err.code(), VSQL0200);
    }

    #[test]
    fn test_table_answers_before_prompt() {
        let table = StaticCodeTypes::new().with(CodingSystem::RxNorm, "RX");
        let mut chain = table.or_else(PromptResolver::new(Cursor::new("ND\n"), Vec::new()));
        let map = resolve_code_types(Some(Domain::Medication), &mut chain).unwrap();

        assert_eq!(map.get(CodingSystem::RxNorm), Some("RX"));
        assert_eq!(map.get(CodingSystem::Ndc), Some("ND"));
    }
}
