//! Value-set compiler error types

use crate::{
    ErrorCode, VSQL0001, VSQL0002, VSQL0100, VSQL0101, VSQL0102, VSQL0103, VSQL0104, VSQL0300,
    VSQL0401,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Error - compilation cannot proceed
    Error,
    /// Warning - a criterion was dropped or ignored but output was produced
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message tied to a value-set entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Name of the value-set entry the diagnostic refers to
    pub entry: Option<String>,
    /// Additional context or help
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            entry: None,
            help: None,
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            entry: None,
            help: None,
        }
    }

    /// Set the entry name
    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = Some(entry.into());
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Whether this diagnostic is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(entry) = &self.entry {
            write!(f, " (entry '{}')", entry)?;
        }
        Ok(())
    }
}

fn in_entry(entry: &Option<String>) -> String {
    match entry {
        Some(name) => format!(" in entry '{}'", name),
        None => String::new(),
    }
}

/// Main value-set compiler error type
#[derive(Debug, Clone, Error)]
pub enum VsqlError {
    /// The document could not be read, decoded or validated
    #[error("{code}: {message}")]
    Document {
        code: ErrorCode,
        message: String,
        origin: Option<String>,
    },

    /// Requested clinical domain is not one of dx, px, lab, rx
    #[error("{}: unknown clinical domain '{domain}'", VSQL0100)]
    UnknownDomain { domain: String },

    /// Dialect is not one of the recognized SQL engines
    #[error("{}: unsupported SQL dialect '{dialect}'", VSQL0101)]
    UnsupportedDialect { dialect: String },

    /// A filter's (property, op) pair has no compilation rule
    #[error("{}: unsupported filter '{property}' with operator '{op}'{}", VSQL0102, in_entry(.entry))]
    UnsupportedFilter {
        property: String,
        op: String,
        entry: Option<String>,
    },

    /// A code range expression could not be expanded
    #[error("{}: cannot expand range '{expression}': {reason}{}", VSQL0103, in_entry(.entry))]
    RangeExpansion {
        expression: String,
        reason: String,
        entry: Option<String>,
    },

    /// Compile request is missing a required setting
    #[error("{}: {message}", VSQL0104)]
    InvalidRequest { message: String },

    /// The code-type resolver could not answer for a coding system
    #[error("{code}: {message}")]
    Resolution {
        code: ErrorCode,
        system: String,
        message: String,
    },

    /// Writing the flat reference export failed
    #[error("{}: {message}", VSQL0300)]
    Export { message: String },

    /// I/O failure outside document loading
    #[error("{code}: {message}")]
    System {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },
}

impl VsqlError {
    /// Create a document error
    pub fn document(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Document {
            code,
            message: message.into(),
            origin: None,
        }
    }

    /// Create a document error that names where the document came from
    pub fn document_at(code: ErrorCode, message: impl Into<String>, origin: impl Into<String>) -> Self {
        Self::Document {
            code,
            message: message.into(),
            origin: Some(origin.into()),
        }
    }

    /// Create an unknown-domain error
    pub fn unknown_domain(domain: impl Into<String>) -> Self {
        Self::UnknownDomain {
            domain: domain.into(),
        }
    }

    /// Create an unsupported-dialect error
    pub fn unsupported_dialect(dialect: impl Into<String>) -> Self {
        Self::UnsupportedDialect {
            dialect: dialect.into(),
        }
    }

    /// Create an unsupported-filter error
    pub fn unsupported_filter(property: impl Into<String>, op: impl Into<String>) -> Self {
        Self::UnsupportedFilter {
            property: property.into(),
            op: op.into(),
            entry: None,
        }
    }

    /// Create a range-expansion error
    pub fn range(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RangeExpansion {
            expression: expression.into(),
            reason: reason.into(),
            entry: None,
        }
    }

    /// Create an invalid-request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a resolution error
    pub fn resolution(code: ErrorCode, system: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            code,
            system: system.into(),
            message: message.into(),
        }
    }

    /// Create an export error
    pub fn export(message: impl Into<String>) -> Self {
        Self::Export {
            message: message.into(),
        }
    }

    /// Wrap an I/O error, naming the path or URL involved
    pub fn io(error: &std::io::Error, origin: impl Into<String>) -> Self {
        let origin = origin.into();
        Self::System {
            code: VSQL0401,
            message: format!("{}: {}", origin, error),
            context: Some(origin),
        }
    }

    /// Attach the name of the value-set entry being compiled
    pub fn with_entry(self, name: impl Into<String>) -> Self {
        match self {
            Self::UnsupportedFilter {
                property, op, entry: None,
            } => Self::UnsupportedFilter {
                property,
                op,
                entry: Some(name.into()),
            },
            Self::RangeExpansion {
                expression,
                reason,
                entry: None,
            } => Self::RangeExpansion {
                expression,
                reason,
                entry: Some(name.into()),
            },
            other => other,
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Document { code, .. } => *code,
            Self::UnknownDomain { .. } => VSQL0100,
            Self::UnsupportedDialect { .. } => VSQL0101,
            Self::UnsupportedFilter { .. } => VSQL0102,
            Self::RangeExpansion { .. } => VSQL0103,
            Self::InvalidRequest { .. } => VSQL0104,
            Self::Resolution { code, .. } => *code,
            Self::Export { .. } => VSQL0300,
            Self::System { code, .. } => *code,
        }
    }

    /// Get the entry name if the error is tied to one
    pub fn entry(&self) -> Option<&str> {
        match self {
            Self::UnsupportedFilter { entry, .. } | Self::RangeExpansion { entry, .. } => {
                entry.as_deref()
            }
            _ => None,
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.code(), self.to_string());
        if let Some(entry) = self.entry() {
            diag = diag.with_entry(entry);
        }
        if let Some(help) = self.code().info().help {
            diag = diag.with_help(help);
        }
        match self {
            Self::Document {
                origin: Some(origin),
                ..
            } => diag.with_help(format!("while loading {}", origin)),
            Self::System {
                context: Some(ctx), ..
            } => diag.with_help(ctx.clone()),
            _ => diag,
        }
    }
}

impl From<std::io::Error> for VsqlError {
    fn from(error: std::io::Error) -> Self {
        Self::System {
            code: VSQL0401,
            message: error.to_string(),
            context: None,
        }
    }
}

/// Convenience for document decoding failures
pub fn decode_error(error: impl fmt::Display) -> VsqlError {
    VsqlError::document(VSQL0002, error.to_string())
}

/// Convenience for document read failures
pub fn read_error(error: impl fmt::Display, origin: impl Into<String>) -> VsqlError {
    VsqlError::document_at(VSQL0001, error.to_string(), origin)
}
