//! Diagnostic severity.

/// Severity of a diagnostic. Controls the tag color when rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
}

impl Level {
    /// ANSI color code for this level's tag.
    #[must_use]
    pub const fn ansi_color(self) -> &'static str {
        match self {
            Level::Error => "\x1b[31;1m",   // bold red
            Level::Warning => "\x1b[33;1m", // bold yellow
        }
    }
}
