//! Byte cursor for traversing source code.
//!
//! Momiji source is treated as a byte buffer, not a Unicode text stream
//! (spec §1 Non-goals: no Unicode-aware identifier lexing), so the cursor
//! walks bytes rather than `char`s. This keeps `peek`/`advance` O(1) with
//! no UTF-8 boundary bookkeeping.

/// A cursor over a byte slice, tracking a start/current position pair so
/// the scanner can slice out the current lexeme at any point.
pub struct Cursor<'a> {
    source: &'a [u8],
    start: usize,
    current: usize,
    line: u32,
}

impl<'a> Cursor<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    #[must_use]
    pub fn at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    #[must_use]
    pub fn peek(&self) -> u8 {
        self.byte_at(0)
    }

    #[must_use]
    pub fn peek_next(&self) -> u8 {
        self.byte_at(1)
    }

    #[must_use]
    fn byte_at(&self, offset: usize) -> u8 {
        *self.source.get(self.current + offset).unwrap_or(&0)
    }

    pub fn advance(&mut self) -> u8 {
        let b = self.peek();
        self.current += 1;
        b
    }

    /// Consumes the next byte if it matches `expected`.
    pub fn matches(&mut self, expected: u8) -> bool {
        if self.at_end() || self.peek() != expected {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn bump_line(&mut self) {
        self.line += 1;
    }

    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Begins a new lexeme at the current position.
    pub fn start_token(&mut self) {
        self.start = self.current;
    }

    /// The bytes consumed since the last [`Cursor::start_token`], as a
    /// string slice. Momiji source is required to be valid UTF-8 on input
    /// (spec doesn't forbid this — only identifier *lexing* is non-Unicode
    /// aware); re-slicing the original `&str` is always a valid boundary
    /// here because every scanning routine only advances past ASCII bytes
    /// or across whole multi-byte sequences inside string literals, never
    /// splitting one.
    #[must_use]
    pub fn lexeme(&self) -> &'a str {
        let bytes = &self.source[self.start..self.current];
        std::str::from_utf8(bytes).unwrap_or("")
    }

    #[must_use]
    pub const fn lexeme_len(&self) -> usize {
        self.current - self.start
    }
}
