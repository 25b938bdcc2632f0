//! Value-set entry structures
//!
//! These mirror the JSON shape of a value-set document element:
//! `id`, `name`, `description`, `topic`, `purpose`, `relatedArtifact`
//! and `compose.include[]`.

use crate::vocabulary::{
    ArtifactClass, CodingSystem, FilterOperator, FilterProperty, Purpose, Topic, ValueType,
};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// A named value set: one common data element and the codes that define it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSetEntry {
    /// Unique identifier (e.g. `CDE0000012`)
    pub id: String,
    /// Name; keys the compiled predicate and labels the UNION branch
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Top-level classification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<Topic>,
    /// Second-level classification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<Purpose>,
    /// Value metadata (class, value type, value range)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_artifact: Option<RelatedArtifact>,
    /// Code composition
    pub compose: Compose,
}

impl ValueSetEntry {
    /// The element's value type, if declared
    pub fn value_type(&self) -> Option<ValueType> {
        self.related_artifact.as_ref().map(|a| a.value_type)
    }

    /// The element's value range, if declared
    pub fn value_range(&self) -> Option<&ValueRange> {
        self.related_artifact.as_ref().map(|a| &a.value_range)
    }

    /// Include blocks in document order
    pub fn includes(&self) -> &[IncludeBlock] {
        &self.compose.include
    }

    /// Coding systems referenced by this entry, in first-seen order
    pub fn systems(&self) -> Vec<CodingSystem> {
        let mut systems = Vec::new();
        for block in &self.compose.include {
            if !systems.contains(&block.system) {
                systems.push(block.system);
            }
        }
        systems
    }
}

/// Value metadata attached to an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedArtifact {
    #[serde(rename = "class", default, skip_serializing_if = "Option::is_none")]
    pub artifact_class: Option<ArtifactClass>,
    pub value_type: ValueType,
    #[serde(default)]
    pub value_range: ValueRange,
}

/// Shape-dependent value range
///
/// Discrete and continuous elements carry `min`/`max` and `low`/`high`
/// bounds; boolean elements carry a label map such as
/// `{"0": "absence", "1": "presence"}`, collected in `labels`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<RangeBound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<RangeBound>,
    #[serde(flatten)]
    pub labels: BTreeMap<String, Value>,
}

/// One side of a numeric value range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeBound {
    pub value: Number,
    #[serde(default)]
    pub unit: String,
    /// `1` when the bound is inclusive, `0` when exclusive
    #[serde(default = "inclusive")]
    pub incld: u8,
}

fn inclusive() -> u8 {
    1
}

impl RangeBound {
    pub fn is_inclusive(&self) -> bool {
        self.incld != 0
    }
}

/// Code composition of an entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Compose {
    #[serde(default)]
    pub include: Vec<IncludeBlock>,
}

/// Codes drawn from one coding system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncludeBlock {
    pub system: CodingSystem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept: Option<Vec<Concept>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Vec<Filter>>,
}

/// How an include block specifies its codes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Criteria<'a> {
    /// Filter list (takes precedence over concepts)
    Filters(&'a [Filter]),
    /// Explicit concept list
    Concepts(&'a [Concept]),
    /// Neither populated
    Empty,
}

impl IncludeBlock {
    /// The populated criteria of this block; a non-empty filter list wins.
    pub fn criteria(&self) -> Criteria<'_> {
        match (self.filter.as_deref(), self.concept.as_deref()) {
            (Some(filters), _) if !filters.is_empty() => Criteria::Filters(filters),
            (_, Some(concepts)) if !concepts.is_empty() => Criteria::Concepts(concepts),
            _ => Criteria::Empty,
        }
    }
}

/// A literal leaf code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub code: String,
    #[serde(default)]
    pub display: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<FilterOperator>,
}

impl Concept {
    pub fn new(code: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            display: display.into(),
            op: None,
        }
    }
}

/// A rule selecting codes by precision, range or list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub property: FilterProperty,
    pub op: FilterOperator,
    #[serde(default)]
    pub value: Vec<String>,
}

impl Filter {
    pub fn new(property: FilterProperty, op: FilterOperator, value: Vec<String>) -> Self {
        Self {
            property,
            op,
            value,
        }
    }
}
