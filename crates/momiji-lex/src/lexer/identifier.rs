//! Identifier scanning and keyword dispatch.

use crate::cursor::Cursor;
use crate::token::TokenKind;

pub fn scan_identifier(cursor: &mut Cursor) {
    while is_identifier_continue(cursor.peek()) {
        cursor.advance();
    }
}

#[must_use]
const fn is_identifier_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Dispatches a scanned identifier to a keyword `TokenKind`, or
/// `TokenKind::Identifier` if it isn't one of the reserved words (spec
/// §4.1: "trie-style dispatch on the first, and occasionally second,
/// character").
#[must_use]
pub fn keyword_or_identifier(text: &str) -> TokenKind {
    let bytes = text.as_bytes();
    let Some(&first) = bytes.first() else {
        return TokenKind::Identifier;
    };

    let candidates: &[(&str, TokenKind)] = match first {
        b'a' => &[
            ("and", TokenKind::And),
            ("as", TokenKind::As),
            ("after", TokenKind::After),
        ],
        b'b' => &[("break", TokenKind::Break)],
        b'c' => &[
            ("class", TokenKind::Class),
            ("case", TokenKind::Case),
            ("const", TokenKind::Const),
            ("continue", TokenKind::Continue),
        ],
        b'd' => &[("default", TokenKind::Default)],
        b'e' => &[("else", TokenKind::Else)],
        b'f' => &[
            ("false", TokenKind::False),
            ("for", TokenKind::For),
            ("function", TokenKind::Function),
        ],
        b'g' => &[("global", TokenKind::Global)],
        b'i' => &[("if", TokenKind::If), ("is", TokenKind::Is)],
        b'l' => &[("local", TokenKind::Local)],
        b'm' => &[("maybe", TokenKind::Maybe)],
        b'n' => &[("null", TokenKind::Null)],
        b'o' => &[("or", TokenKind::Or)],
        b'p' => &[("print", TokenKind::Print)],
        b'r' => &[("return", TokenKind::Return)],
        b's' => &[
            ("switch", TokenKind::Switch),
            ("static", TokenKind::Static),
            ("super", TokenKind::Super),
        ],
        b't' => &[("this", TokenKind::This), ("true", TokenKind::True)],
        b'v' => &[("var", TokenKind::Var)],
        b'w' => &[("while", TokenKind::While)],
        _ => &[],
    };

    candidates
        .iter()
        .find(|(keyword, _)| *keyword == text)
        .map_or(TokenKind::Identifier, |(_, kind)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_all_keywords() {
        let pairs = [
            ("class", TokenKind::Class),
            ("function", TokenKind::Function),
            ("global", TokenKind::Global),
            ("local", TokenKind::Local),
            ("var", TokenKind::Var),
            ("if", TokenKind::If),
            ("else", TokenKind::Else),
            ("for", TokenKind::For),
            ("while", TokenKind::While),
            ("switch", TokenKind::Switch),
            ("case", TokenKind::Case),
            ("default", TokenKind::Default),
            ("return", TokenKind::Return),
            ("print", TokenKind::Print),
            ("true", TokenKind::True),
            ("false", TokenKind::False),
            ("null", TokenKind::Null),
            ("maybe", TokenKind::Maybe),
            ("this", TokenKind::This),
            ("super", TokenKind::Super),
            ("and", TokenKind::And),
            ("or", TokenKind::Or),
            ("is", TokenKind::Is),
            ("break", TokenKind::Break),
            ("continue", TokenKind::Continue),
            ("const", TokenKind::Const),
            ("static", TokenKind::Static),
            ("as", TokenKind::As),
            ("after", TokenKind::After),
        ];
        for (text, expected) in pairs {
            assert_eq!(keyword_or_identifier(text), expected, "for {text:?}");
        }
    }

    #[test]
    fn near_miss_prefixes_stay_identifiers() {
        for text in ["classy", "fora", "const2", "i", "cl", "thisx"] {
            assert_eq!(keyword_or_identifier(text), TokenKind::Identifier);
        }
    }
}
