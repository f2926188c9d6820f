//! The scanner's top-level dispatch loop.

mod comment;
mod identifier;
mod number;
mod operator;
mod string;

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Converts source text into a stream of [`Token`]s.
///
/// Call [`Scanner::scan_token`] repeatedly until it returns a token of
/// kind [`TokenKind::Eof`]. The scanner never looks behind itself: each
/// call resumes exactly where the previous one left off.
pub struct Scanner<'src> {
    source: &'src str,
    cursor: Cursor<'src>,
}

impl<'src> Scanner<'src> {
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            cursor: Cursor::new(source),
        }
    }

    /// Scans and returns the next token.
    pub fn scan_token(&mut self) -> Token<'src> {
        comment::skip_whitespace_and_comments(&mut self.cursor);
        self.cursor.start_token();

        if self.cursor.at_end() {
            return self.make(TokenKind::Eof);
        }

        let c = self.cursor.advance();
        match c {
            b'(' => self.make(TokenKind::ParenOpen),
            b')' => self.make(TokenKind::ParenClose),
            b'{' => self.make(TokenKind::BraceOpen),
            b'}' => self.make(TokenKind::BraceClose),
            b'[' => self.make(TokenKind::BracketOpen),
            b']' => self.make(TokenKind::BracketClose),
            b',' => self.make(TokenKind::Comma),
            b'.' => self.make(TokenKind::Dot),
            b';' => self.make(TokenKind::Semicolon),
            b':' => self.make(TokenKind::Colon),
            b'"' => match string::scan_string(&mut self.cursor) {
                Ok(()) => self.make(TokenKind::String),
                Err(msg) => self.error(msg),
            },
            _ if c.is_ascii_digit() => {
                number::scan_number(&mut self.cursor);
                self.make(TokenKind::Number)
            }
            _ if is_identifier_start(c) => {
                identifier::scan_identifier(&mut self.cursor);
                let kind = identifier::keyword_or_identifier(self.cursor.lexeme());
                self.make(kind)
            }
            _ => operator::scan_operator(&mut self.cursor, c)
                .map(|kind| self.make(kind))
                .unwrap_or_else(|| self.error("unexpected character")),
        }
    }

    fn make(&self, kind: TokenKind) -> Token<'src> {
        Token::new(kind, self.cursor.lexeme(), self.cursor.line())
    }

    fn error(&self, message: &'static str) -> Token<'src> {
        Token::new(TokenKind::Error, message, self.cursor.line())
    }

    /// Returns the full text of 1-based source line `line`, for
    /// diagnostic snippets (spec §4.1: "exposes it for error reporting").
    #[must_use]
    pub fn source_line(&self, line: u32) -> &'src str {
        self.source
            .lines()
            .nth(line.saturating_sub(1) as usize)
            .unwrap_or("")
    }
}

#[must_use]
const fn is_identifier_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(src);
        let mut out = Vec::new();
        loop {
            let tok = scanner.scan_token();
            let kind = tok.kind;
            out.push(kind);
            if kind == TokenKind::Eof {
                break;
            }
        }
        out
    }

    #[test]
    fn scans_arithmetic_expression() {
        let k = kinds("1 + 2 * 3;");
        assert_eq!(
            k,
            vec![
                TokenKind::Number,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Star,
                TokenKind::Number,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_keywords_vs_identifiers() {
        let k = kinds("local x = function(y) => y;");
        assert_eq!(k[0], TokenKind::Local);
        assert_eq!(k[1], TokenKind::Identifier);
        assert_eq!(k[3], TokenKind::Function);
    }

    #[test]
    fn line_comment_runs_to_newline() {
        let mut scanner = Scanner::new("1 // comment\n2");
        let a = scanner.scan_token();
        let b = scanner.scan_token();
        assert_eq!(a.line, 1);
        assert_eq!(b.line, 2);
    }

    #[test]
    fn block_comment_requires_contiguous_star_slash() {
        // A lone '*' not immediately followed by '/' must not terminate
        // the comment (spec §9 resolved open question).
        let mut scanner = Scanner::new("/* a * b */ 1");
        let tok = scanner.scan_token();
        assert_eq!(tok.kind, TokenKind::Number);
    }

    #[test]
    fn unterminated_string_is_error() {
        let mut scanner = Scanner::new("\"abc");
        let tok = scanner.scan_token();
        assert_eq!(tok.kind, TokenKind::Error);
    }

    #[test]
    fn reserved_keywords_tokenize_distinctly() {
        let k = kinds("break continue const static as after");
        assert_eq!(
            k,
            vec![
                TokenKind::Break,
                TokenKind::Continue,
                TokenKind::Const,
                TokenKind::Static,
                TokenKind::As,
                TokenKind::After,
                TokenKind::Eof,
            ]
        );
    }
}
