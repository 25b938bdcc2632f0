//! Value-set document model
//!
//! This crate provides:
//! - Closed vocabularies for every enumerated label a document carries
//! - Value-set entry, include-block, filter and concept structures
//! - Loading from a JSON string, reader, local path or HTTP(S) URL, with
//!   document-level validation

mod document;
mod value_set;
pub mod vocabulary;

pub use document::{DocumentSource, ValueSetDocument};
pub use value_set::{
    Compose, Concept, Criteria, Filter, IncludeBlock, RangeBound, RelatedArtifact, ValueRange,
    ValueSetEntry,
};
pub use vocabulary::{
    ArtifactClass, CodingSystem, Domain, FilterOperator, FilterProperty, Purpose, Topic, ValueType,
};
