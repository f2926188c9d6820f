//! Operator and punctuation scanning.
//!
//! Single-character punctuation is handled directly by the dispatch
//! `match` in `lexer::Scanner::scan_token`; this module handles the
//! characters whose meaning depends on a possible second byte (`+` vs
//! `+=` vs `++`, etc).

use crate::cursor::Cursor;
use crate::token::TokenKind;

/// Scans an operator starting with `first`, which has already been
/// consumed. Returns `None` for a byte that starts no valid token.
pub fn scan_operator(cursor: &mut Cursor, first: u8) -> Option<TokenKind> {
    use TokenKind as K;
    let kind = match first {
        b'+' => {
            if cursor.matches(b'+') {
                K::PlusPlus
            } else if cursor.matches(b'=') {
                K::PlusEqual
            } else {
                K::Plus
            }
        }
        b'-' => {
            if cursor.matches(b'-') {
                K::MinusMinus
            } else if cursor.matches(b'=') {
                K::MinusEqual
            } else {
                K::Minus
            }
        }
        b'*' => {
            if cursor.matches(b'=') {
                K::StarEqual
            } else {
                K::Star
            }
        }
        b'/' => {
            if cursor.matches(b'=') {
                K::SlashEqual
            } else {
                K::Slash
            }
        }
        b'%' => K::Percent,
        b'&' => K::Ampersand,
        b'|' => K::Pipe,
        b'!' => {
            if cursor.matches(b'=') {
                K::BangEqual
            } else {
                K::Bang
            }
        }
        b'=' => {
            if cursor.matches(b'=') {
                K::EqualEqual
            } else if cursor.matches(b'>') {
                K::FatArrow
            } else {
                K::Equal
            }
        }
        b'<' => {
            if cursor.matches(b'=') {
                K::LessEqual
            } else {
                K::Less
            }
        }
        b'>' => {
            if cursor.matches(b'=') {
                K::GreaterEqual
            } else {
                K::Greater
            }
        }
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;

    #[test]
    fn distinguishes_compound_operators() {
        let mut scanner = Scanner::new("+ ++ += - -- -= => ==");
        let kinds: Vec<_> = std::iter::from_fn(|| Some(scanner.scan_token().kind))
            .take(8)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Plus,
                TokenKind::PlusPlus,
                TokenKind::PlusEqual,
                TokenKind::Minus,
                TokenKind::MinusMinus,
                TokenKind::MinusEqual,
                TokenKind::FatArrow,
                TokenKind::EqualEqual,
            ]
        );
    }
}
