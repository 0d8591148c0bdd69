mod cache;
mod error;
mod kind;
mod lexer;
mod reverse;

#[cfg(test)]
mod cache_test;
#[cfg(test)]
mod token_test;

pub use cache::{CachedTokens, LineTokenization, TokenCache};
pub use error::{Diagnostic, DiagnosticKind, ErrorSink, LineIndex, Position, Severity, Span, offset_to_position};
pub use kind::{STATEMENT_KEYWORDS, TokenCategory, TokenKind};
pub use lexer::{LexState, Token, TokenWithSpan, Tokenizer, TokenizerOptions, unquote};
pub use reverse::{ReverseTokenizer, TokenBuffer};
