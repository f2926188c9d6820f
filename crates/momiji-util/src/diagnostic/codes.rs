//! Diagnostic tags (spec §7: "colored tag `SyntaxError` / `RuntimeError`").

use std::fmt;

/// The tag printed before a diagnostic's message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticCode {
    /// A lex or parse/semantic compile-time error.
    SyntaxError,
    /// An error raised while executing bytecode.
    RuntimeError,
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCode::SyntaxError => write!(f, "SyntaxError"),
            DiagnosticCode::RuntimeError => write!(f, "RuntimeError"),
        }
    }
}
