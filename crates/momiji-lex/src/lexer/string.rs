//! String literal scanning.

use crate::cursor::Cursor;

/// Scans a `"`-delimited string literal, assuming the opening quote has
/// already been consumed. May span multiple lines (each embedded newline
/// bumps the line counter, spec §4.1).
pub fn scan_string(cursor: &mut Cursor) -> Result<(), &'static str> {
    while cursor.peek() != b'"' && !cursor.at_end() {
        if cursor.peek() == b'\n' {
            cursor.bump_line();
        }
        cursor.advance();
    }

    if cursor.at_end() {
        return Err("unterminated string literal");
    }

    cursor.advance(); // closing quote
    Ok(())
}

/// Strips the surrounding quotes from a scanned string lexeme.
#[must_use]
pub fn unquote(lexeme: &str) -> &str {
    let inner = lexeme.strip_prefix('"').unwrap_or(lexeme);
    inner.strip_suffix('"').unwrap_or(inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;
    use crate::token::TokenKind;

    #[test]
    fn scans_multiline_string() {
        let mut scanner = Scanner::new("\"a\nb\" 1");
        let s = scanner.scan_token();
        assert_eq!(s.kind, TokenKind::String);
        assert_eq!(unquote(s.lexeme), "a\nb");
        let n = scanner.scan_token();
        assert_eq!(n.line, 2);
    }
}
