//! Whitespace and comment skipping.

use crate::cursor::Cursor;

/// Skips spaces, tabs, carriage returns, newlines (bumping the line
/// counter), `//` line comments, and `/* ... */` block comments.
///
/// Block comments terminate on the contiguous two-byte sequence `*/`,
/// matching C semantics (spec §9 resolved open question) — a lone `*`
/// not immediately followed by `/` does not end the comment, so
/// `/* a * b */` is one comment, not two fragments split at the first `*`.
pub fn skip_whitespace_and_comments(cursor: &mut Cursor) {
    loop {
        match cursor.peek() {
            b' ' | b'\r' | b'\t' => {
                cursor.advance();
            }
            b'\n' => {
                cursor.bump_line();
                cursor.advance();
            }
            b'/' if cursor.peek_next() == b'/' => {
                while cursor.peek() != b'\n' && !cursor.at_end() {
                    cursor.advance();
                }
            }
            b'/' if cursor.peek_next() == b'*' => {
                cursor.advance(); // '/'
                cursor.advance(); // '*'
                loop {
                    if cursor.at_end() {
                        break;
                    }
                    if cursor.peek() == b'*' && cursor.peek_next() == b'/' {
                        cursor.advance(); // '*'
                        cursor.advance(); // '/'
                        break;
                    }
                    if cursor.peek() == b'\n' {
                        cursor.bump_line();
                    }
                    cursor.advance();
                }
            }
            _ => return,
        }
    }
}
