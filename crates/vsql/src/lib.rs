//! Clinical value-set to SQL compiler
//!
//! This crate bundles:
//! - The value-set document model and loaders ([`model`])
//! - The compiler: code-type resolution, predicate building and `UNION ALL`
//!   assembly for six SQL dialects ([`compiler`])
//! - Error codes and diagnostics ([`diagnostics`])
//! - The `vsql` command-line tool (feature `cli`)
//!
//! # Example
//!
//! ```
//! use vsql::{CodingSystem, CompileRequest, Compiler, ValueSetDocument};
//!
//! let document = ValueSetDocument::from_json_str(r#"[{
//!     "id": "CDE001", "name": "KTx",
//!     "compose": {"include": [{"system": "cpt4", "concept": [{"code": "50360"}, {"code": "50365"}]}]}
//! }]"#)?;
//! let request = CompileRequest::builder()
//!     .dialect("snow")
//!     .domain("px")
//!     .code_field("PX")
//!     .date_fields(["PX_DATE", "ADMIT_DATE"])
//!     .other_fields(["PATID"])
//!     .source_table("PROC")
//!     .build()?;
//!
//! let query = Compiler::new(request)?.compile(&document, &mut |_: CodingSystem| "CH".to_string())?;
//! assert!(query.sql.starts_with("SELECT PATID,PX,coalesce(PX_DATE,ADMIT_DATE) as CD_DATE"));
//! # Ok::<(), vsql::VsqlError>(())
//! ```

pub use vsql_compiler as compiler;
pub use vsql_diagnostics as diagnostics;
pub use vsql_model as model;

pub use vsql_compiler::{
    CodeTypeResolver, CompileRequest, CompiledQuery, Compiler, FilterMode, PredicateSet,
    RangeExpander, RangePadding, SqlDialect, StaticCodeTypes, export_reference,
};
pub use vsql_diagnostics::{Diagnostic, Result, VsqlError};
pub use vsql_model::{CodingSystem, DocumentSource, Domain, ValueSetDocument};

#[cfg(feature = "cli")]
pub mod cli;
