//! Diagnostic rendering.
//!
//! A [`Diagnostic`] is the Rust-native shape of spec §7's "errors are
//! written to standard error, prefixed with a colored tag, the token or
//! IP-resolved line number, and the offending source line". Construction
//! goes through [`DiagnosticBuilder`]; rendering goes through
//! [`Diagnostic::render`].

mod builder;
mod codes;
mod level;

pub use builder::{DiagnosticBuilder, SourceSnippet};
pub use codes::DiagnosticCode;
pub use level::Level;

use std::fmt::Write as _;

use crate::span::Span;

/// A fully constructed diagnostic, ready to render.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub level: Level,
    pub code: DiagnosticCode,
    pub message: String,
    pub span: Option<Span>,
    pub snippet: Option<SourceSnippet>,
}

impl Diagnostic {
    #[must_use]
    pub fn builder(level: Level, code: DiagnosticCode) -> DiagnosticBuilder {
        DiagnosticBuilder::new(level, code)
    }

    #[must_use]
    pub fn error(code: DiagnosticCode) -> DiagnosticBuilder {
        Self::builder(Level::Error, code)
    }

    /// Render this diagnostic as it would appear on stderr.
    ///
    /// `color` disables ANSI escapes entirely when false (e.g. output is
    /// not a TTY, or the user passed `--color never`).
    #[must_use]
    pub fn render(&self, color: bool) -> String {
        let mut out = String::new();
        let reset = if color { "\x1b[0m" } else { "" };
        let tag_color = if color { self.level.ansi_color() } else { "" };

        let _ = write!(out, "{tag_color}{}{reset}", self.code);
        if let Some(span) = self.span {
            let _ = write!(out, " [line {}]", span.line);
        }
        let _ = write!(out, ": {}\n", self.message);

        if let Some(snippet) = &self.snippet {
            let _ = writeln!(out, "  {} | {}", snippet.line_number, snippet.line);
            if snippet.start_column > 0 && snippet.end_column > snippet.start_column {
                let gutter_width = snippet.line_number.to_string().len();
                let pad = " ".repeat(gutter_width + 3 + (snippet.start_column as usize - 1));
                let carets = "^".repeat(
                    (snippet.end_column - snippet.start_column)
                        .max(1)
                        .min(80) as usize,
                );
                let _ = writeln!(out, "{pad}{carets}");
            }
            if let Some(label) = &snippet.label {
                let _ = writeln!(out, "  = {label}");
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_without_color() {
        let diag = Diagnostic::error(DiagnosticCode::SyntaxError)
            .message("unexpected character '@'")
            .span(Span::line_only(3))
            .build();
        let rendered = diag.render(false);
        assert!(rendered.contains("SyntaxError"));
        assert!(rendered.contains("line 3"));
        assert!(rendered.contains("unexpected character"));
        assert!(!rendered.contains("\x1b["));
    }

    #[test]
    fn renders_with_snippet_and_caret() {
        let diag = Diagnostic::error(DiagnosticCode::RuntimeError)
            .message("undefined global 'x'")
            .span(Span::new(5, 1, 2))
            .snippet(SourceSnippet::new("print x;", 5, 7, 8, None))
            .build();
        let rendered = diag.render(false);
        assert!(rendered.contains("print x;"));
        assert!(rendered.contains('^'));
    }
}
