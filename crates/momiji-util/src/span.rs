//! Source-position types.
//!
//! Momiji programs are a single source unit (no module system, spec §1
//! Non-goals), so a [`Span`] only needs a line number plus an optional
//! byte range within that line for underlining — there is no file id to
//! track.

/// A location in the source text, pinned to a single line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Span {
    /// 1-based source line.
    pub line: u32,
    /// 1-based start column, inclusive.
    pub start_column: u32,
    /// 1-based end column, exclusive.
    pub end_column: u32,
}

impl Span {
    #[must_use]
    pub const fn new(line: u32, start_column: u32, end_column: u32) -> Self {
        Self {
            line,
            start_column,
            end_column,
        }
    }

    /// A span covering only a line, with no column information.
    #[must_use]
    pub const fn line_only(line: u32) -> Self {
        Self::new(line, 0, 0)
    }
}
