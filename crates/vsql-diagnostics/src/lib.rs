//! Value-set compiler diagnostics and error handling
//!
//! This crate provides the error handling infrastructure shared by the
//! document model, the SQL compiler and the command-line tool: structured
//! error codes, the [`VsqlError`] taxonomy and non-fatal [`Diagnostic`]s.

mod error;
mod error_code;

pub use error::*;
pub use error_code::*;

/// Result type for value-set compiler operations
pub type Result<T> = std::result::Result<T, VsqlError>;
