//! Fluent construction of [`Diagnostic`] values.

use super::{Diagnostic, DiagnosticCode, Level};
use crate::span::Span;

/// A source code snippet for display beneath a diagnostic.
///
/// Contains the single source line affected by the diagnostic, plus
/// optional column highlighting.
#[derive(Clone, Debug)]
pub struct SourceSnippet {
    /// The source line's text, without the trailing newline.
    pub line: String,
    /// 1-based line number.
    pub line_number: u32,
    /// 1-based column where the highlighted range starts.
    pub start_column: u32,
    /// 1-based column where the highlighted range ends (exclusive).
    pub end_column: u32,
    /// Optional label printed under the highlight.
    pub label: Option<String>,
}

impl SourceSnippet {
    #[must_use]
    pub fn new(
        line: impl Into<String>,
        line_number: u32,
        start_column: u32,
        end_column: u32,
        label: Option<&str>,
    ) -> Self {
        Self {
            line: line.into(),
            line_number,
            start_column,
            end_column,
            label: label.map(str::to_string),
        }
    }
}

/// Builder for [`Diagnostic`]. Obtain one via [`Diagnostic::error`] or
/// [`Diagnostic::builder`].
pub struct DiagnosticBuilder {
    level: Level,
    code: DiagnosticCode,
    message: String,
    span: Option<Span>,
    snippet: Option<SourceSnippet>,
}

impl DiagnosticBuilder {
    pub(crate) fn new(level: Level, code: DiagnosticCode) -> Self {
        Self {
            level,
            code,
            message: String::new(),
            span: None,
            snippet: None,
        }
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    #[must_use]
    pub fn snippet(mut self, snippet: SourceSnippet) -> Self {
        self.snippet = Some(snippet);
        self
    }

    #[must_use]
    pub fn build(self) -> Diagnostic {
        Diagnostic {
            level: self.level,
            code: self.code,
            message: self.message,
            span: self.span,
            snippet: self.snippet,
        }
    }
}
