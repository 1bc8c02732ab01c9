//! msl-lex — turns MSL source text into a token stream.
//!
//! This is the first pipeline stage (`spec.md` §4.1): a single-pass,
//! non-backtracking scanner. It never panics on malformed input; lexical
//! errors are reported through a [`msl_util::Handler`] and scanning
//! continues, so a single source unit always yields a complete token
//! stream for [`msl_par`](../msl_par/index.html) to consume (or reject).

mod cursor;
mod lexer;
mod token;

pub use lexer::{tokenize, Lexer};
pub use token::{keyword, Token, TokenKind};
