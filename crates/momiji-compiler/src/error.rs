//! Compile-time error type.

use thiserror::Error;

use momiji_util::Diagnostic;

/// A single compile error, carrying its rendered [`Diagnostic`].
///
/// The compiler never stops at the first error (spec §4.3's
/// synchronization-on-panic-mode rule): it collects every `CompileError`
/// it recovers from and reports them all once parsing ends.
#[derive(Debug, Error)]
#[error("{}", diagnostic.message)]
pub struct CompileError {
    pub diagnostic: Diagnostic,
}

impl CompileError {
    #[must_use]
    pub fn new(diagnostic: Diagnostic) -> Self {
        Self { diagnostic }
    }
}

/// The outcome of a full compile: either a finished chunk, or the set of
/// errors gathered along the way.
pub type CompileResult<T> = Result<T, Vec<CompileError>>;
