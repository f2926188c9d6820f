//! Top-level error type for the `momiji` binary.
//!
//! This is the Rust-native shape of spec §7's exit-code table: every
//! variant maps to one of the process exit codes `main` returns.

use thiserror::Error;

use momiji_compiler::CompileError;
use momiji_vm::RuntimeError;

/// Errors that can terminate the `momiji` process.
#[derive(Debug, Error)]
pub enum CliError {
    /// Too many positional arguments (spec §7: exit 64).
    #[error("usage: momiji [script]")]
    Usage,

    /// One or more compile errors (spec §7: exit 65).
    #[error("{} compile error(s)", .0.len())]
    Compile(Vec<CompileError>),

    /// A runtime error raised while executing bytecode (spec §7: exit 70).
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Failure to read the source file, or a config file I/O/parse
    /// failure (spec §7: exit 74).
    #[error("{0}")]
    Io(String),
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl CliError {
    /// The process exit code this error maps to (spec §7).
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage => 64,
            Self::Compile(_) => 65,
            Self::Runtime(_) => 70,
            Self::Io(_) => 74,
        }
    }

    /// Render every diagnostic this error carries, one per line, the way
    /// spec §7 describes: colored tag, line, offending source line.
    #[must_use]
    pub fn render(&self, color: bool) -> String {
        match self {
            Self::Usage => self.to_string(),
            Self::Compile(errors) => errors
                .iter()
                .map(|e| e.diagnostic.render(color))
                .collect::<Vec<_>>()
                .join(""),
            Self::Runtime(err) => {
                let mut out = err.diagnostic.render(color);
                for line in &err.trace {
                    out.push_str("  ");
                    out.push_str(line);
                    out.push('\n');
                }
                out
            }
            Self::Io(message) => format!("{message}\n"),
        }
    }
}
