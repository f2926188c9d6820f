//! The precedence ladder (spec §4.3).

use momiji_lex::TokenKind;

/// Binding power, ascending. `Precedence::next()` gives the level used
/// when parsing the right-hand side of a left-associative binary
/// operator (one tighter than the operator's own level).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call | Precedence::Primary => Precedence::Primary,
        }
    }
}

/// The precedence at which `kind` binds as an infix/postfix operator, or
/// `None` if it never appears in that position.
///
/// `%`, `&`, `|` bind at `Term` alongside `+`/`-` — confirmed against
/// `examples/original_source/src/compiler.c`'s `rules[]` table (see
/// `SPEC_FULL.md` §4.3). Assignment (`=`, `+=`, …) is deliberately absent
/// here: like the teacher's source material, it is consumed as a
/// special case inside the prefix handlers for assignable targets
/// (`variable`, `dot`, `index`), not through this generic infix loop.
#[must_use]
pub fn infix_precedence(kind: TokenKind) -> Precedence {
    use TokenKind as K;
    match kind {
        K::Or => Precedence::Or,
        K::And => Precedence::And,
        K::EqualEqual | K::BangEqual => Precedence::Equality,
        K::Less | K::LessEqual | K::Greater | K::GreaterEqual | K::Is => Precedence::Comparison,
        K::Plus | K::Minus | K::Percent | K::Ampersand | K::Pipe => Precedence::Term,
        K::Star | K::Slash => Precedence::Factor,
        K::ParenOpen | K::Dot | K::BracketOpen => Precedence::Call,
        K::PlusPlus | K::MinusMinus => Precedence::Call,
        _ => Precedence::None,
    }
}
