//! Compile request configuration

use crate::dialect::SqlDialect;
use crate::filter::FilterMode;
use crate::range::{MAX_RANGE_LEN, RangePadding};
use vsql_diagnostics::{Result, VsqlError};
use vsql_model::Domain;

/// Source-table columns the compiled SQL reads and returns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    /// Column holding the code
    pub code_field: String,
    /// Column holding the site code-type token; enables the code-type gate
    pub code_type_field: Option<String>,
    /// Numeric result column; enables value bounds for continuous elements
    pub value_field: Option<String>,
    /// Date columns coalesced into `CD_DATE`, in priority order
    pub date_fields: Vec<String>,
    /// Extra columns returned ahead of the code column
    pub other_fields: Vec<String>,
}

/// Everything needed to compile a document besides the document itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub dialect: SqlDialect,
    /// `None` compiles for every domain
    pub domain: Option<Domain>,
    pub fields: FieldMapping,
    pub source_table: String,
    /// Entry names to emit; empty emits every entry
    pub sel_keys: Vec<String>,
    pub filter_mode: FilterMode,
    pub range_padding: RangePadding,
    /// Most codes a single `codeRange` value may expand to
    pub max_range_len: u64,
}

impl CompileRequest {
    pub fn builder() -> CompileRequestBuilder {
        CompileRequestBuilder::default()
    }

    /// Checks that the required columns and table are named.
    pub fn validate(&self) -> Result<()> {
        if self.fields.code_field.trim().is_empty() {
            return Err(VsqlError::invalid_request("code field is required"));
        }
        if self.source_table.trim().is_empty() {
            return Err(VsqlError::invalid_request("source table is required"));
        }
        if self.max_range_len == 0 {
            return Err(VsqlError::invalid_request("max range length must be at least 1"));
        }
        if self.fields.date_fields.is_empty() {
            return Err(VsqlError::invalid_request("at least one date field is required"));
        }
        if let Some(blank) = self
            .fields
            .date_fields
            .iter()
            .chain(&self.fields.other_fields)
            .find(|f| f.trim().is_empty())
        {
            return Err(VsqlError::invalid_request(format!(
                "column names must not be blank (got '{}')",
                blank
            )));
        }
        Ok(())
    }
}

/// Builder for [`CompileRequest`]
///
/// Dialect and domain are taken as their textual identifiers and parsed by
/// [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct CompileRequestBuilder {
    dialect: Option<String>,
    domain: String,
    fields: FieldMapping,
    source_table: String,
    sel_keys: Vec<String>,
    filter_mode: FilterMode,
    range_padding: RangePadding,
    max_range_len: u64,
}

impl Default for CompileRequestBuilder {
    fn default() -> Self {
        Self {
            dialect: None,
            domain: String::new(),
            fields: FieldMapping::default(),
            source_table: String::new(),
            sel_keys: Vec::new(),
            filter_mode: FilterMode::default(),
            range_padding: RangePadding::default(),
            max_range_len: MAX_RANGE_LEN,
        }
    }
}

impl CompileRequestBuilder {
    pub fn dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = Some(dialect.into());
        self
    }

    /// Domain identifier (`dx`, `px`, `lab`, `rx`); empty means every domain.
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn code_field(mut self, field: impl Into<String>) -> Self {
        self.fields.code_field = field.into();
        self
    }

    /// An empty name leaves the code-type gate off.
    pub fn code_type_field(mut self, field: impl Into<String>) -> Self {
        self.fields.code_type_field = non_empty(field.into());
        self
    }

    /// An empty name leaves value bounds off.
    pub fn value_field(mut self, field: impl Into<String>) -> Self {
        self.fields.value_field = non_empty(field.into());
        self
    }

    pub fn date_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.date_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn other_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.other_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn source_table(mut self, table: impl Into<String>) -> Self {
        self.source_table = table.into();
        self
    }

    pub fn sel_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sel_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter_mode(mut self, mode: FilterMode) -> Self {
        self.filter_mode = mode;
        self
    }

    pub fn range_padding(mut self, padding: RangePadding) -> Self {
        self.range_padding = padding;
        self
    }

    /// Defaults to [`MAX_RANGE_LEN`].
    pub fn max_range_len(mut self, max_len: u64) -> Self {
        self.max_range_len = max_len;
        self
    }

    /// Parses identifiers and validates the request.
    pub fn build(self) -> Result<CompileRequest> {
        let dialect = self
            .dialect
            .ok_or_else(|| VsqlError::invalid_request("dialect is required"))?
            .parse::<SqlDialect>()?;
        let domain = Domain::parse_scope(&self.domain)?;

        let request = CompileRequest {
            dialect,
            domain,
            fields: self.fields,
            source_table: self.source_table,
            sel_keys: self.sel_keys,
            filter_mode: self.filter_mode,
            range_padding: self.range_padding,
            max_range_len: self.max_range_len,
        };
        request.validate()?;
        Ok(request)
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}
