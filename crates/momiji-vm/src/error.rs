//! Runtime error type (spec §7 "Runtime error").

use thiserror::Error;

use momiji_util::diagnostic::SourceSnippet;
use momiji_util::{Diagnostic, DiagnosticCode, Span};

/// A runtime failure, carrying a rendered [`Diagnostic`] plus the frame
/// trace at the point of failure (spec §7: "print a stack trace, most
/// recent frame first, with source-line snippets").
#[derive(Debug, Error)]
#[error("{}", diagnostic.message)]
pub struct RuntimeError {
    pub diagnostic: Diagnostic,
    /// Most-recent-first lines like `[line 12] in makeCounter()`.
    pub trace: Vec<String>,
}

impl RuntimeError {
    #[must_use]
    pub fn new(message: impl Into<String>, line: u32, snippet_line: Option<&str>) -> Self {
        let mut builder = Diagnostic::error(DiagnosticCode::RuntimeError)
            .message(message)
            .span(Span::line_only(line));
        if let Some(text) = snippet_line {
            builder = builder.snippet(SourceSnippet::new(text, line, 0, 0, None));
        }
        Self { diagnostic: builder.build(), trace: Vec::new() }
    }

    #[must_use]
    pub fn with_trace(mut self, trace: Vec<String>) -> Self {
        self.trace = trace;
        self
    }
}
