//! Shared diagnostics, spans, and error types used across the Momiji
//! workspace.
//!
//! This crate has no knowledge of tokens, bytecode, or values; it only
//! knows how to describe *where* in a source file something went wrong
//! and how to render that description to a terminal.

mod error;

pub mod diagnostic;
pub mod span;

pub use diagnostic::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Level, SourceSnippet};
pub use error::DiagnosticError;
pub use span::Span;
