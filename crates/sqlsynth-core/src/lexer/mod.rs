//! SQL clause lexer
//!
//! A hand-written lexer that produces just enough structure for clause
//! detection: keywords, parentheses and opaque literals with byte spans.

mod span;
mod token;
mod tokenizer;

pub use span::Span;
pub use token::{Keyword, Token, TokenKind};
pub use tokenizer::Lexer;
