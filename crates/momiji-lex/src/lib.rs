//! Momiji's scanner: source text → token stream.
//!
//! The scanner holds the source's lifetime; every [`Token`] is a
//! non-owning view into it (a byte offset + length), never an owned
//! copy. This mirrors spec §4.1: "Tokens are non-owning views."

mod cursor;
mod token;

pub mod lexer;

pub use cursor::Cursor;
pub use lexer::Scanner;
pub use token::{Token, TokenKind};
