//! Concept list projection

use vsql_model::Concept;

/// Literal codes of a concept list, in document order.
pub fn concept_codes(concepts: &[Concept]) -> Vec<&str> {
    concepts.iter().map(|c| c.code.trim()).collect()
}
