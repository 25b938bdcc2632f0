//! Document compiler
//!
//! Ties the stages together: resolve code types for the domain, build one
//! predicate per entry, then assemble the `UNION ALL` query.

use crate::code_type::{CodeTypeMap, CodeTypeResolver, resolve_code_types};
use crate::predicate::{PredicateBuilder, PredicateSet};
use crate::query::QueryAssembler;
use crate::request::CompileRequest;
use log::{info, warn};
use serde::Serialize;
use vsql_diagnostics::{Diagnostic, Result, VSQL0106};
use vsql_model::ValueSetDocument;

/// Output of a full compile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    /// `UNION ALL` query text; empty when no entry has applicable codes
    pub sql: String,
    pub predicates: PredicateSet,
    /// Non-fatal findings (dropped filters, empty blocks, unknown keys)
    pub diagnostics: Vec<Diagnostic>,
}

impl CompiledQuery {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn branch_count(&self) -> usize {
        if self.sql.is_empty() {
            0
        } else {
            self.sql.matches(" UNION ALL ").count() + 1
        }
    }
}

/// Compiles value-set documents for one request
///
/// A compiler holds no state between calls; the same request can compile
/// any number of documents.
#[derive(Debug, Clone)]
pub struct Compiler {
    request: CompileRequest,
}

impl Compiler {
    /// Validates the request and creates a compiler for it.
    pub fn new(request: CompileRequest) -> Result<Self> {
        request.validate()?;
        Ok(Self { request })
    }

    pub fn request(&self) -> &CompileRequest {
        &self.request
    }

    /// Asks the resolver for the token of every system relevant to the domain.
    pub fn code_types<R>(&self, resolver: &mut R) -> Result<CodeTypeMap>
    where
        R: CodeTypeResolver + ?Sized,
    {
        resolve_code_types(self.request.domain, resolver)
    }

    /// Builds the entry-name to predicate mapping.
    pub fn predicates<R>(&self, document: &ValueSetDocument, resolver: &mut R) -> Result<PredicateSet>
    where
        R: CodeTypeResolver + ?Sized,
    {
        let code_types = self.code_types(resolver)?;
        self.predicates_with(document, &code_types)
    }

    /// Builds predicates with an already resolved code-type map.
    pub fn predicates_with(
        &self,
        document: &ValueSetDocument,
        code_types: &CodeTypeMap,
    ) -> Result<PredicateSet> {
        PredicateBuilder::new(&self.request, code_types).build(document)
    }

    /// Compiles the document into a `UNION ALL` query.
    pub fn compile<R>(&self, document: &ValueSetDocument, resolver: &mut R) -> Result<CompiledQuery>
    where
        R: CodeTypeResolver + ?Sized,
    {
        let code_types = self.code_types(resolver)?;
        self.compile_with(document, &code_types)
    }

    /// Compiles with an already resolved code-type map.
    pub fn compile_with(
        &self,
        document: &ValueSetDocument,
        code_types: &CodeTypeMap,
    ) -> Result<CompiledQuery> {
        let predicates = self.predicates_with(document, code_types)?;
        let mut diagnostics = predicates.diagnostics().to_vec();

        for key in &self.request.sel_keys {
            if document.get(key).is_none() {
                warn!("Selected key '{}' is not an entry of the document", key);
                diagnostics.push(
                    Diagnostic::warning(VSQL0106, format!("selected key '{}' not found", key))
                        .with_entry(key),
                );
            }
        }

        let sql = QueryAssembler::from_request(&self.request).assemble(&predicates, &self.request.sel_keys);
        let query = CompiledQuery {
            sql,
            predicates,
            diagnostics,
        };
        info!(
            "Compiled {} of {} entries into {} branches ({} dialect, {} domain)",
            query.predicates.len(),
            document.len(),
            query.branch_count(),
            self.request.dialect,
            self.request.domain.map_or("every", |d| d.as_str()),
        );
        Ok(query)
    }
}
