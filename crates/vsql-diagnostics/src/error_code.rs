//! Value-set compiler error codes following a structured numbering system
//!
//! Error code ranges:
//! - VSQL0001-VSQL0099: Document errors (loading, decoding, validation)
//! - VSQL0100-VSQL0199: Request errors (domain, dialect, filter, range, request)
//! - VSQL0200-VSQL0299: Code-type resolution errors
//! - VSQL0300-VSQL0399: Export errors
//! - VSQL0400-VSQL0499: System errors (I/O)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a document error (0001-0099)
    pub const fn is_document_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a request error (0100-0199)
    pub const fn is_request_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is a code-type resolution error (0200-0299)
    pub const fn is_resolution_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is an export error (0300-0399)
    pub const fn is_export_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// Check if this is a system error (0400-0499)
    pub const fn is_system_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VSQL{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Document errors (0001-0099)
    map.insert(1, ErrorInfo::new("Document could not be read"));
    map.insert(
        2,
        ErrorInfo::new("Document is not a valid value-set array")
            .with_help("Check field names and that every enumerated label is spelled as in the vocabulary"),
    );
    map.insert(3, ErrorInfo::new("Document failed validation"));
    map.insert(4, ErrorInfo::new("Document could not be fetched"));

    // Request errors (0100-0199)
    map.insert(
        100,
        ErrorInfo::new("Unknown clinical domain").with_help("Use one of dx, px, lab, rx, or leave empty"),
    );
    map.insert(
        101,
        ErrorInfo::new("Unsupported SQL dialect")
            .with_help("Use one of snow, postgres, spark, mysql, sqlserver, oracle"),
    );
    map.insert(
        102,
        ErrorInfo::new("Unsupported filter property/operator")
            .with_help("Supported: codePrecision/descendent-of, codeRange/in, codeList/exists"),
    );
    map.insert(103, ErrorInfo::new("Malformed code range expression"));
    map.insert(104, ErrorInfo::new("Invalid compile request"));
    map.insert(105, ErrorInfo::new("Include block yields no codes"));
    map.insert(106, ErrorInfo::new("Selected key not present in document"));

    // Resolution errors (0200-0299)
    map.insert(200, ErrorInfo::new("Code-type resolution failed"));
    map.insert(201, ErrorInfo::new("No code-type token configured for coding system"));

    // Export errors (0300-0399)
    map.insert(300, ErrorInfo::new("Reference export failed"));

    // System errors (0400-0499)
    map.insert(401, ErrorInfo::new("I/O error"));

    map
});

// Document errors
pub const VSQL0001: ErrorCode = ErrorCode::new(1);
pub const VSQL0002: ErrorCode = ErrorCode::new(2);
pub const VSQL0003: ErrorCode = ErrorCode::new(3);
pub const VSQL0004: ErrorCode = ErrorCode::new(4);

// Request errors
pub const VSQL0100: ErrorCode = ErrorCode::new(100);
pub const VSQL0101: ErrorCode = ErrorCode::new(101);
pub const VSQL0102: ErrorCode = ErrorCode::new(102);
pub const VSQL0103: ErrorCode = ErrorCode::new(103);
pub const VSQL0104: ErrorCode = ErrorCode::new(104);
pub const VSQL0105: ErrorCode = ErrorCode::new(105);
pub const VSQL0106: ErrorCode = ErrorCode::new(106);

// Resolution errors
pub const VSQL0200: ErrorCode = ErrorCode::new(200);
pub const VSQL0201: ErrorCode = ErrorCode::new(201);

// Export errors
pub const VSQL0300: ErrorCode = ErrorCode::new(300);

// System errors
pub const VSQL0401: ErrorCode = ErrorCode::new(401);
