use crate::token::{Token, Tokenizer, TokenizerOptions};

/// Replays already-lexed tokens backward from an offset.
pub trait ReverseTokenizer {
    /// Tokens starting before `offset`, nearest first.
    fn reverse_tokens(&self, offset: usize) -> Box<dyn Iterator<Item = Token> + '_>;
}

impl ReverseTokenizer for Vec<Token> {
    fn reverse_tokens(&self, offset: usize) -> Box<dyn Iterator<Item = Token> + '_> {
        let end = self.partition_point(|t| t.span.start < offset);
        Box::new(self[..end].iter().rev().cloned())
    }
}

/// A whole buffer lexed once in verbatim mode.
#[derive(Debug, Clone, Default)]
pub struct TokenBuffer {
    tokens: Vec<Token>,
}

impl TokenBuffer {
    pub fn from_source(source: &str) -> Self {
        let mut tokens = Tokenizer::tokenize_with(source, TokenizerOptions::verbatim());
        tokens.pop();
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

impl ReverseTokenizer for TokenBuffer {
    fn reverse_tokens(&self, offset: usize) -> Box<dyn Iterator<Item = Token> + '_> {
        self.tokens.reverse_tokens(offset)
    }
}
