//! Value-set to SQL compiler
//!
//! Compilation runs in stages:
//! - [`resolve_code_types`] asks a [`CodeTypeResolver`] for the site token of
//!   each coding system relevant to the requested domain
//! - [`FilterResolver`], [`concept_codes`] and [`RangeExpander`] normalize each
//!   include block's criteria into [`CodeBuckets`]
//! - [`PredicateBuilder`] emits one predicate per entry, using the
//!   [`SqlDialect`] for string splitting and prefixes
//! - [`QueryAssembler`] wraps the predicates into `UNION ALL` branches
//!
//! [`Compiler`] runs all of them for a validated [`CompileRequest`].
//!
//! ```no_run
//! use vsql_compiler::{CompileRequest, Compiler, StaticCodeTypes};
//! use vsql_model::{CodingSystem, ValueSetDocument};
//!
//! # fn main() -> vsql_diagnostics::Result<()> {
//! let document = ValueSetDocument::from_path("vs-cde.json")?;
//! let request = CompileRequest::builder()
//!     .dialect("snow")
//!     .domain("px")
//!     .code_field("PX")
//!     .code_type_field("PX_TYPE")
//!     .date_fields(["PX_DATE", "ADMIT_DATE"])
//!     .other_fields(["PATID"])
//!     .source_table("PROCEDURES")
//!     .build()?;
//! let mut code_types = StaticCodeTypes::new()
//!     .with(CodingSystem::Cpt4, "CH")
//!     .with(CodingSystem::Hcpcs, "CH")
//!     .with(CodingSystem::Icd9Proc, "09")
//!     .with(CodingSystem::Icd10Pcs, "10");
//! let query = Compiler::new(request)?.compile(&document, &mut code_types)?;
//! println!("{}", query.sql);
//! # Ok(())
//! # }
//! ```

mod code_type;
mod compiler;
mod concept;
pub mod dialect;
mod export;
mod filter;
mod predicate;
mod query;
pub mod range;
mod request;

pub use code_type::{
    CodeTypeMap, CodeTypeResolver, FallbackResolver, StaticCodeTypes, domain_systems,
    resolve_code_types,
};
pub use compiler::{CompiledQuery, Compiler};
pub use concept::concept_codes;
pub use dialect::SqlDialect;
pub use export::{ReferenceRow, export_reference, reference_rows};
pub use filter::{CodeBuckets, FilterMode, FilterResolver, PrecisionBucket, Selection};
pub use predicate::{PredicateBuilder, PredicateSet, quote};
pub use query::QueryAssembler;
pub use range::{MAX_RANGE_LEN, RangeExpander, RangePadding, expand_range};
pub use request::{CompileRequest, CompileRequestBuilder, FieldMapping};
