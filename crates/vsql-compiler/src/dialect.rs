//! SQL dialect adapter
//!
//! Only two string operations differ between the supported engines: taking
//! the Nth delimiter-separated segment of a string, and taking a fixed-length
//! prefix. Everything else the compiler emits is portable SQL.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use vsql_diagnostics::{Result, VsqlError};

/// Target SQL engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum SqlDialect {
    /// Snowflake (`snow`)
    Snowflake,
    Postgres,
    Spark,
    MySql,
    SqlServer,
    Oracle,
}

impl SqlDialect {
    pub const ALL: &'static [Self] = &[
        Self::Snowflake,
        Self::Postgres,
        Self::Spark,
        Self::MySql,
        Self::SqlServer,
        Self::Oracle,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Snowflake => "snow",
            Self::Postgres => "postgres",
            Self::Spark => "spark",
            Self::MySql => "mysql",
            Self::SqlServer => "sqlserver",
            Self::Oracle => "oracle",
        }
    }

    /// SQL for the `index`-th (1-based) `delimiter`-separated segment of `expr`.
    pub fn split_part(self, expr: &str, delimiter: &str, index: usize) -> String {
        debug_assert!(index >= 1, "segment index is 1-based");
        let quoted = quote(delimiter);
        match self {
            Self::Snowflake | Self::Postgres => {
                format!("split_part({},{},{})", expr, quoted, index)
            }
            Self::Spark | Self::MySql if index == 1 => {
                format!("substring_index({},{},1)", expr, quoted)
            }
            Self::Spark | Self::MySql => format!(
                "substring_index(substring_index({},{},{}),{},-1)",
                expr, quoted, index, quoted
            ),
            Self::SqlServer => format!(
                "(select value from string_split({},{},1) where ordinal = {})",
                expr, quoted, index
            ),
            Self::Oracle => format!(
                "regexp_substr({},'[^{}]+',1,{})",
                expr,
                bracket_members(delimiter).replace('\'', "''"),
                index
            ),
        }
    }

    /// SQL for the first `length` characters of `expr`.
    pub fn prefix(self, expr: &str, length: usize) -> String {
        match self {
            Self::Oracle => format!("substr({},1,{})", expr, length),
            _ => format!("substring({},1,{})", expr, length),
        }
    }
}

fn quote(literal: &str) -> String {
    format!("'{}'", literal.replace('\'', "''"))
}

// Orders delimiter characters so they stay literal inside a negated bracket
// expression: `]` first, `-` last.
fn bracket_members(delimiter: &str) -> String {
    let mut members = String::new();
    if delimiter.contains(']') {
        members.push(']');
    }
    members.extend(delimiter.chars().filter(|c| !matches!(c, ']' | '-')));
    if delimiter.contains('-') {
        members.push('-');
    }
    members
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SqlDialect {
    type Err = VsqlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "snow" | "snowflake" => Ok(Self::Snowflake),
            "postgres" => Ok(Self::Postgres),
            "spark" => Ok(Self::Spark),
            "mysql" => Ok(Self::MySql),
            "sqlserver" => Ok(Self::SqlServer),
            "oracle" => Ok(Self::Oracle),
            other => Err(VsqlError::unsupported_dialect(other)),
        }
    }
}

impl TryFrom<String> for SqlDialect {
    type Error = VsqlError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<SqlDialect> for &'static str {
    fn from(value: SqlDialect) -> Self {
        value.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use vsql_diagnostics::VSQL0101;

    #[rstest]
    #[case(SqlDialect::Snowflake, "split_part(DX,'.',1)")]
    #[case(SqlDialect::Postgres, "split_part(DX,'.',1)")]
    #[case(SqlDialect::Spark, "substring_index(DX,'.',1)")]
    #[case(SqlDialect::MySql, "substring_index(DX,'.',1)")]
    #[case(
        SqlDialect::SqlServer,
        "(select value from string_split(DX,'.',1) where ordinal = 1)"
    )]
    #[case(SqlDialect::Oracle, "regexp_substr(DX,'[^.]+',1,1)")]
    fn test_first_segment(#[case] dialect: SqlDialect, #[case] expected: &str) {
        assert_eq!(dialect.split_part("DX", ".", 1), expected);
    }

    #[test]
    fn test_later_segment_is_exact() {
        assert_eq!(
            SqlDialect::MySql.split_part("DX", ".", 2),
            "substring_index(substring_index(DX,'.',2),'.',-1)"
        );
        assert_eq!(SqlDialect::Postgres.split_part("DX", ".", 2), "split_part(DX,'.',2)");
        assert_eq!(
            SqlDialect::Oracle.split_part("DX", "-", 3),
            "regexp_substr(DX,'[^-]+',1,3)"
        );
    }

    #[test]
    fn test_prefix() {
        assert_eq!(SqlDialect::Snowflake.prefix("PX", 5), "substring(PX,1,5)");
        assert_eq!(SqlDialect::Oracle.prefix("PX", 6), "substr(PX,1,6)");
    }

    #[rstest]
    #[case("snow", SqlDialect::Snowflake)]
    #[case("snowflake", SqlDialect::Snowflake)]
    #[case("sqlserver", SqlDialect::SqlServer)]
    #[case("oracle", SqlDialect::Oracle)]
    fn test_parse(#[case] input: &str, #[case] expected: SqlDialect) {
        assert_eq!(input.parse::<SqlDialect>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_dialect_fails() {
        let err = "db2".parse::<SqlDialect>().unwrap_err();
        assert_eq!(err.code(), VSQL0101);
        assert_eq!(err.to_string(), "VSQL0101: unsupported SQL dialect 'db2'");
    }

    #[test]
    fn test_labels_round_trip() {
        for dialect in SqlDialect::ALL {
            assert_eq!(dialect.as_str().parse::<SqlDialect>().unwrap(), *dialect);
        }
    }
}
