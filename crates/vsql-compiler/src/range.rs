//! Code range expansion
//!
//! A range expression such as `K50-K52` or `1-3` names every code between
//! two bounds. Both bounds share an optional single-letter prefix; the
//! remainder must be decimal digits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use vsql_diagnostics::{Result, VsqlError};

/// Default upper limit on the number of codes a single range may produce.
pub const MAX_RANGE_LEN: u64 = 100_000;

/// How expanded numbers are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangePadding {
    /// Plain decimal rendering: `K01-K03` expands to `K1, K2, K3`
    #[default]
    Unpadded,
    /// Zero-pad to the digit width of the start bound: `K01, K02, K03`
    PreserveWidth,
}

impl RangePadding {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpadded => "unpadded",
            Self::PreserveWidth => "preserve-width",
        }
    }
}

impl fmt::Display for RangePadding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangePadding {
    type Err = VsqlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unpadded" => Ok(Self::Unpadded),
            "preserve-width" => Ok(Self::PreserveWidth),
            other => Err(VsqlError::invalid_request(format!(
                "unknown range padding '{}' (expected 'unpadded' or 'preserve-width')",
                other
            ))),
        }
    }
}

/// Expands `start-end` range expressions into explicit code lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeExpander {
    padding: RangePadding,
    max_len: u64,
}

impl Default for RangeExpander {
    fn default() -> Self {
        Self::new(RangePadding::default())
    }
}

impl RangeExpander {
    pub fn new(padding: RangePadding) -> Self {
        Self {
            padding,
            max_len: MAX_RANGE_LEN,
        }
    }

    /// Sets the most codes one range may expand to.
    pub fn with_max_len(mut self, max_len: u64) -> Self {
        self.max_len = max_len;
        self
    }

    /// Expands one range expression, inclusive of both bounds.
    ///
    /// A range wider than the configured maximum ([`MAX_RANGE_LEN`] unless
    /// changed with [`with_max_len`](Self::with_max_len)) is rejected even
    /// though its bounds are well formed. Pass `u64::MAX` to lift the limit.
    pub fn expand(&self, expression: &str) -> Result<Vec<String>> {
        let parts: Vec<&str> = expression.split('-').map(str::trim).collect();
        let [start, end] = parts.as_slice() else {
            return Err(VsqlError::range(
                expression,
                format!("expected two bounds separated by '-', found {}", parts.len()),
            ));
        };
        let (start, end) = (*start, *end);
        if start.is_empty() {
            return Err(VsqlError::range(expression, "missing start bound"));
        }
        if end.is_empty() {
            return Err(VsqlError::range(expression, "missing end bound"));
        }

        let prefix = start.chars().next().filter(|c| c.is_alphabetic());
        let (start_digits, end_digits) = match prefix {
            Some(letter) => (
                &start[letter.len_utf8()..],
                end.strip_prefix(letter).unwrap_or(end),
            ),
            None => (start, end),
        };

        let low = parse_bound(expression, start_digits)?;
        let high = parse_bound(expression, end_digits)?;
        if low > high {
            return Err(VsqlError::range(
                expression,
                format!("start bound {} exceeds end bound {}", low, high),
            ));
        }
        if high - low >= self.max_len {
            return Err(VsqlError::range(
                expression,
                format!("range spans more than {} codes", self.max_len),
            ));
        }

        let prefix = prefix.map(String::from).unwrap_or_default();
        let width = match self.padding {
            RangePadding::Unpadded => 0,
            RangePadding::PreserveWidth => start_digits.len(),
        };
        Ok((low..=high)
            .map(|n| format!("{}{:0width$}", prefix, n, width = width))
            .collect())
    }
}

fn parse_bound(expression: &str, digits: &str) -> Result<u64> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(VsqlError::range(
            expression,
            format!("bound '{}' is not numeric", digits),
        ));
    }
    digits
        .parse()
        .map_err(|e| VsqlError::range(expression, format!("bound '{}': {}", digits, e)))
}

/// Expands a range with the default (unpadded) rendering.
pub fn expand_range(expression: &str) -> Result<Vec<String>> {
    RangeExpander::default().expand(expression)
}
