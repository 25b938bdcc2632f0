//! Compile request configuration
//!
//! A request is read from an optional JSON config file and then overridden by
//! command-line flags. Code-type tokens follow the same order: `--code-type`
//! flags win over the config file's `code_types` table.

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use vsql_compiler::{CompileRequest, FilterMode, RangePadding, StaticCodeTypes};
use vsql_model::CodingSystem;

/// Request flags shared by `compile` and `predicates`
#[derive(Debug, Clone, Default, Args)]
pub struct RequestArgs {
    /// Request configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// SQL dialect (snow, postgres, spark, mysql, sqlserver, oracle)
    #[arg(short, long)]
    pub dialect: Option<String>,

    /// Clinical domain (dx, px, lab, rx); omit for every domain
    #[arg(long)]
    pub domain: Option<String>,

    /// Column holding the code
    #[arg(long)]
    pub code_field: Option<String>,

    /// Column holding the site code-type token
    #[arg(long)]
    pub code_type_field: Option<String>,

    /// Numeric result column for continuous elements
    #[arg(long)]
    pub value_field: Option<String>,

    /// Date column coalesced into CD_DATE (repeatable, in priority order)
    #[arg(long = "date-field")]
    pub date_fields: Vec<String>,

    /// Extra column to return (repeatable)
    #[arg(long = "other-field")]
    pub other_fields: Vec<String>,

    /// Source table name
    #[arg(short = 't', long = "table")]
    pub source_table: Option<String>,

    /// Entry name to emit (repeatable); omit for every entry
    #[arg(short = 'k', long = "key")]
    pub sel_keys: Vec<String>,

    /// Unsupported filter handling (strict, lenient)
    #[arg(long)]
    pub filter_mode: Option<String>,

    /// Range expansion padding (unpadded, preserve-width)
    #[arg(long)]
    pub range_padding: Option<String>,

    /// Most codes a single range may expand to (default 100000)
    #[arg(long)]
    pub max_range_len: Option<u64>,

    /// Code-type token as system=TOKEN (repeatable)
    #[arg(long = "code-type")]
    pub code_types: Vec<String>,

    /// Fail instead of prompting for a missing code-type token
    #[arg(long)]
    pub no_prompt: bool,
}

/// Serialized compile request, as checked into a site's repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestConfig {
    pub dialect: Option<String>,
    pub domain: Option<String>,
    pub code_field: Option<String>,
    pub code_type_field: Option<String>,
    pub value_field: Option<String>,
    pub date_fields: Vec<String>,
    pub other_fields: Vec<String>,
    pub source_table: Option<String>,
    pub sel_keys: Vec<String>,
    pub filter_mode: Option<FilterMode>,
    pub range_padding: Option<RangePadding>,
    pub max_range_len: Option<u64>,
    pub code_types: StaticCodeTypes,
}

impl RequestConfig {
    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load the config named by the flags (if any) and apply the flags on top.
    pub fn from_args(args: &RequestArgs) -> Result<Self> {
        let base = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        base.merge(args)
    }

    /// Apply command-line flags over this config
    pub fn merge(mut self, args: &RequestArgs) -> Result<Self> {
        override_with(&mut self.dialect, &args.dialect);
        override_with(&mut self.domain, &args.domain);
        override_with(&mut self.code_field, &args.code_field);
        override_with(&mut self.code_type_field, &args.code_type_field);
        override_with(&mut self.value_field, &args.value_field);
        override_with(&mut self.source_table, &args.source_table);
        replace_if_given(&mut self.date_fields, &args.date_fields);
        replace_if_given(&mut self.other_fields, &args.other_fields);
        replace_if_given(&mut self.sel_keys, &args.sel_keys);

        if let Some(mode) = &args.filter_mode {
            self.filter_mode = Some(mode.parse::<FilterMode>()?);
        }
        if let Some(padding) = &args.range_padding {
            self.range_padding = Some(padding.parse::<RangePadding>()?);
        }
        if args.max_range_len.is_some() {
            self.max_range_len = args.max_range_len;
        }
        for pair in &args.code_types {
            let (system, token) = parse_code_type(pair)?;
            self.code_types.insert(system, token);
        }
        Ok(self)
    }

    /// Build the validated library request
    pub fn to_request(&self) -> Result<CompileRequest> {
        let mut builder = CompileRequest::builder()
            .domain(self.domain.clone().unwrap_or_default())
            .code_field(self.code_field.clone().unwrap_or_default())
            .code_type_field(self.code_type_field.clone().unwrap_or_default())
            .value_field(self.value_field.clone().unwrap_or_default())
            .date_fields(self.date_fields.iter().cloned())
            .other_fields(self.other_fields.iter().cloned())
            .source_table(self.source_table.clone().unwrap_or_default())
            .sel_keys(self.sel_keys.iter().cloned())
            .filter_mode(self.filter_mode.unwrap_or_default())
            .range_padding(self.range_padding.unwrap_or_default());
        if let Some(max_len) = self.max_range_len {
            builder = builder.max_range_len(max_len);
        }
        if let Some(dialect) = &self.dialect {
            builder = builder.dialect(dialect.clone());
        }
        Ok(builder.build()?)
    }
}

fn override_with(target: &mut Option<String>, value: &Option<String>) {
    if value.is_some() {
        target.clone_from(value);
    }
}

fn replace_if_given(target: &mut Vec<String>, values: &[String]) {
    if !values.is_empty() {
        *target = values.to_vec();
    }
}

/// Parse a `system=TOKEN` flag value
pub fn parse_code_type(pair: &str) -> Result<(CodingSystem, String)> {
    let Some((system, token)) = pair.split_once('=') else {
        bail!("Invalid code type '{}': expected system=TOKEN", pair);
    };
    let system = system.trim().parse::<CodingSystem>()?;
    Ok((system, token.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("cpt=CH", CodingSystem::Cpt4, "CH")]
    #[case("icd10pcs = 10", CodingSystem::Icd10Pcs, "10")]
    #[case("loinc=", CodingSystem::Loinc, "")]
    fn test_parse_code_type(#[case] pair: &str, #[case] system: CodingSystem, #[case] token: &str) {
        assert_eq!(parse_code_type(pair).unwrap(), (system, token.to_string()));
    }

    #[rstest]
    #[case("cpt")]
    #[case("icd11=X")]
    fn test_parse_code_type_errors(#[case] pair: &str) {
        assert!(parse_code_type(pair).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let config = RequestConfig {
            dialect: Some("snow".to_string()),
            code_field: Some("PX".to_string()),
            date_fields: vec!["PX_DATE".to_string()],
            source_table: Some("PROC".to_string()),
            code_types: StaticCodeTypes::new()
                .with(CodingSystem::Cpt4, "C4")
                .with(CodingSystem::Hcpcs, "HC"),
            ..RequestConfig::default()
        };
        let args = RequestArgs {
            dialect: Some("oracle".to_string()),
            filter_mode: Some("lenient".to_string()),
            max_range_len: Some(500),
            code_types: vec!["cpt4=CH".to_string()],
            ..RequestArgs::default()
        };

        let merged = config.merge(&args).unwrap();
        assert_eq!(merged.dialect.as_deref(), Some("oracle"));
        assert_eq!(merged.date_fields, vec!["PX_DATE"]);
        assert_eq!(merged.filter_mode, Some(FilterMode::Lenient));
        assert_eq!(merged.code_types.get(CodingSystem::Cpt4), Some("CH"));
        assert_eq!(merged.code_types.get(CodingSystem::Hcpcs), Some("HC"));

        let request = merged.to_request().unwrap();
        assert_eq!(request.dialect, vsql_compiler::SqlDialect::Oracle);
        assert_eq!(request.domain, None);
        assert_eq!(request.max_range_len, 500);
    }

    #[test]
    fn test_bad_filter_mode_flag() {
        let args = RequestArgs {
            filter_mode: Some("loose".to_string()),
            ..RequestArgs::default()
        };
        assert!(RequestConfig::default().merge(&args).is_err());
    }
}
