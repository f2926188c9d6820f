//! Core error types for the `momiji-util` crate.

use thiserror::Error;

/// Errors that can occur while building or rendering a [`crate::Diagnostic`].
#[derive(Debug, Error)]
pub enum DiagnosticError {
    /// The requested line does not exist in the source map.
    #[error("invalid line number: {line} (source has {max_lines} lines)")]
    InvalidLineNumber { line: usize, max_lines: usize },

    /// A span's end precedes its start.
    #[error("invalid span: start {start} > end {end}")]
    InvalidSpan { start: u32, end: u32 },
}
