//! Filter resolution into precision buckets
//!
//! An include block's filters are normalized into buckets keyed by code
//! precision. Buckets `0`, `1` and `2` hold hierarchical codes matched by
//! prefix; bucket `3` holds codes with three or more decimals and bucket `9`
//! holds explicit leaf codes (lists and expanded ranges). Both are matched
//! exactly.

use crate::range::RangeExpander;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use vsql_diagnostics::{Diagnostic, Result, VSQL0102, VsqlError};
use vsql_model::{Filter, FilterOperator, FilterProperty};

/// Precision class of a code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrecisionBucket {
    /// No decimals (`250`)
    #[serde(rename = "0")]
    Category,
    /// One decimal (`250.1`)
    #[serde(rename = "1")]
    OneDecimal,
    /// Two decimals (`250.12`)
    #[serde(rename = "2")]
    TwoDecimal,
    /// Three or more decimals
    #[serde(rename = "3")]
    Leaf,
    /// Explicitly listed codes
    #[serde(rename = "9")]
    Explicit,
}

impl PrecisionBucket {
    /// Bucket key as it appears in compiled output and logs.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Category => "0",
            Self::OneDecimal => "1",
            Self::TwoDecimal => "2",
            Self::Leaf => "3",
            Self::Explicit => "9",
        }
    }

    /// Classifies a code by the number of digits after its decimal point.
    pub fn for_code(code: &str) -> Self {
        let decimals = code.split_once('.').map_or(0, |(_, rest)| rest.len());
        match decimals {
            0 => Self::Category,
            1 => Self::OneDecimal,
            2 => Self::TwoDecimal,
            _ => Self::Leaf,
        }
    }

    /// Prefix length matched for the fixed-width hierarchical buckets.
    pub const fn prefix_len(self) -> Option<usize> {
        match self {
            Self::OneDecimal => Some(5),
            Self::TwoDecimal => Some(6),
            _ => None,
        }
    }
}

impl fmt::Display for PrecisionBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Non-empty precision buckets of one include block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CodeBuckets {
    buckets: BTreeMap<PrecisionBucket, Vec<String>>,
}

/// The bucket that decides how an include block is matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<'a> {
    /// Prefix match against codes from a hierarchical bucket
    Hierarchical {
        bucket: PrecisionBucket,
        codes: &'a [String],
    },
    /// Exact match against the union of buckets `3` and `9`
    Leaves(Vec<&'a str>),
}

impl CodeBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bucket: PrecisionBucket, code: impl Into<String>) {
        self.buckets.entry(bucket).or_default().push(code.into());
    }

    pub fn extend<I>(&mut self, bucket: PrecisionBucket, codes: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut codes = codes.into_iter().map(Into::into).peekable();
        if codes.peek().is_some() {
            self.buckets.entry(bucket).or_default().extend(codes);
        }
    }

    pub fn get(&self, bucket: PrecisionBucket) -> Option<&[String]> {
        self.buckets.get(&bucket).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Populated buckets in key order
    pub fn buckets(&self) -> impl Iterator<Item = PrecisionBucket> + '_ {
        self.buckets.keys().copied()
    }

    /// Picks the most general populated bucket; `None` when nothing is populated.
    pub fn select(&self) -> Option<Selection<'_>> {
        for bucket in [
            PrecisionBucket::Category,
            PrecisionBucket::OneDecimal,
            PrecisionBucket::TwoDecimal,
        ] {
            if let Some(codes) = self.get(bucket) {
                return Some(Selection::Hierarchical { bucket, codes });
            }
        }

        let leaves: Vec<&str> = [PrecisionBucket::Leaf, PrecisionBucket::Explicit]
            .into_iter()
            .filter_map(|bucket| self.get(bucket))
            .flatten()
            .map(String::as_str)
            .collect();
        (!leaves.is_empty()).then_some(Selection::Leaves(leaves))
    }
}

/// What happens to a filter with no compilation rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Fail the compile
    #[default]
    Strict,
    /// Drop the filter and report a warning diagnostic
    Lenient,
}

impl FilterMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = VsqlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(VsqlError::invalid_request(format!(
                "unknown filter mode '{}' (expected 'strict' or 'lenient')",
                other
            ))),
        }
    }
}

/// Normalizes filter lists into [`CodeBuckets`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterResolver {
    expander: RangeExpander,
    mode: FilterMode,
}

impl FilterResolver {
    pub fn new(expander: RangeExpander, mode: FilterMode) -> Self {
        Self { expander, mode }
    }

    /// Resolves a block's filters.
    ///
    /// In lenient mode, dropped filters are reported through `diagnostics`.
    pub fn resolve(&self, filters: &[Filter], diagnostics: &mut Vec<Diagnostic>) -> Result<CodeBuckets> {
        let mut buckets = CodeBuckets::new();

        for filter in filters {
            let values = filter.value.iter().map(|v| v.trim());
            match (filter.property, filter.op) {
                (FilterProperty::CodePrecision, FilterOperator::DescendentOf) => {
                    for code in values {
                        buckets.push(PrecisionBucket::for_code(code), code);
                    }
                }
                (FilterProperty::CodeRange, FilterOperator::In) => {
                    for expression in values {
                        let codes = self.expander.expand(expression)?;
                        debug!("Expanded range '{}' into {} codes", expression, codes.len());
                        buckets.extend(PrecisionBucket::Explicit, codes);
                    }
                }
                (FilterProperty::CodeList, FilterOperator::Exists) => {
                    buckets.extend(PrecisionBucket::Explicit, values);
                }
                (property, op) => match self.mode {
                    FilterMode::Strict => {
                        return Err(VsqlError::unsupported_filter(property.as_str(), op.as_str()));
                    }
                    FilterMode::Lenient => {
                        warn!("Dropping unsupported filter '{}' with operator '{}'", property, op);
                        diagnostics.push(Diagnostic::warning(
                            VSQL0102,
                            format!("dropped unsupported filter '{}' with operator '{}'", property, op),
                        ));
                    }
                },
            }
        }

        Ok(buckets)
    }
}
