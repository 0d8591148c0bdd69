use std::sync::Arc;

use crate::token::{LexState, LineIndex, ReverseTokenizer, Token, Tokenizer, TokenizerOptions};

/// Tokens of one source line (spans relative to the line start) and the
/// lexer state at the end of that line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTokenization {
    pub tokens: Arc<[Token]>,
    pub state: LexState,
}

impl LineTokenization {
    pub fn new(tokens: Vec<Token>, state: LexState) -> Self {
        Self {
            tokens: tokens.into(),
            state,
        }
    }
}

/// Line-indexed tokenization cache. Entries may be missing; a missing line is
/// re-lexed on the next refresh.
#[derive(Debug, Clone, Default)]
pub struct TokenCache {
    lines: Vec<Option<LineTokenization>>,
    options: TokenizerOptions,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::with_options(TokenizerOptions {
            verbatim: false,
            verbatim_comments: true,
        })
    }

    pub fn with_options(options: TokenizerOptions) -> Self {
        Self {
            lines: Vec::new(),
            options,
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn ensure_capacity(&mut self, line_count: usize) {
        if self.lines.len() < line_count {
            self.lines.resize(line_count, None);
        }
    }

    pub fn try_get_tokenization(&self, line: usize) -> Option<&LineTokenization> {
        self.lines.get(line).and_then(Option::as_ref)
    }

    pub fn set_tokenization(&mut self, line: usize, tokenization: LineTokenization) {
        self.ensure_capacity(line + 1);
        self.lines[line] = Some(tokenization);
    }

    /// Nearest cached line at or before `line`, not going below `min_line`.
    pub fn index_of_previous_tokenization(&self, line: usize, min_line: usize) -> Option<(usize, &LineTokenization)> {
        if self.lines.is_empty() {
            return None;
        }
        let mut current = line.min(self.lines.len() - 1);
        loop {
            if let Some(Some(tokenization)) = self.lines.get(current) {
                return Some((current, tokenization));
            }
            if current <= min_line || current == 0 {
                return None;
            }
            current -= 1;
        }
    }

    /// Opens `count` empty lines at `line`, shifting the rest down.
    pub fn insert_lines(&mut self, line: usize, count: usize) {
        let at = line.min(self.lines.len());
        self.lines.splice(at..at, std::iter::repeat_n(None, count));
    }

    pub fn delete_lines(&mut self, line: usize, count: usize) {
        if line >= self.lines.len() {
            return;
        }
        let end = (line + count).min(self.lines.len());
        self.lines.drain(line..end);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Re-lexes `text` starting at `first_changed_line` (or the first gap
    /// before it) and stops once a line past the change comes out identical
    /// to its cached tokenization. Returns the number of lines lexed.
    pub fn refresh(&mut self, text: &str, first_changed_line: usize) -> usize {
        let lines = split_lines(text);
        self.lines.truncate(lines.len());
        self.ensure_capacity(lines.len());

        let mut line = first_changed_line.min(lines.len());
        while line > 0 && self.lines[line - 1].is_none() {
            line -= 1;
        }
        let mut state = match line {
            0 => LexState::Normal,
            n => self.lines[n - 1].as_ref().map(|t| t.state).unwrap_or_default(),
        };

        let mut lexed = 0;
        while line < lines.len() {
            let (tokens, end_state) = Tokenizer::tokenize_line(lines[line], state, self.options);
            let fresh = LineTokenization::new(tokens, end_state);
            lexed += 1;
            let unchanged = line > first_changed_line && self.lines[line].as_ref() == Some(&fresh);
            self.lines[line] = Some(fresh);
            if unchanged {
                break;
            }
            state = end_state;
            line += 1;
        }
        lexed
    }

    /// All cached tokens with absolute spans.
    pub fn tokens(&self, text: &str) -> Vec<Token> {
        let index = LineIndex::new(text);
        let mut out = Vec::new();
        for (line, entry) in self.lines.iter().enumerate() {
            let (Some(entry), Some(base)) = (entry, index.line_start(line)) else {
                continue;
            };
            out.extend(entry.tokens.iter().map(|t| t.shifted(base)));
        }
        out
    }

    /// Reverse view over the cached lines of `text`.
    pub fn view<'a>(&'a self, text: &str) -> CachedTokens<'a> {
        CachedTokens {
            cache: self,
            index: LineIndex::new(text),
        }
    }
}

pub struct CachedTokens<'a> {
    cache: &'a TokenCache,
    index: LineIndex,
}

impl ReverseTokenizer for CachedTokens<'_> {
    fn reverse_tokens(&self, offset: usize) -> Box<dyn Iterator<Item = Token> + '_> {
        let last_line = self.index.line_of(offset).min(self.cache.len().saturating_sub(1));
        Box::new((0..=last_line).rev().flat_map(move |line| {
            let base = self.index.line_start(line).unwrap_or(0);
            self.cache.try_get_tokenization(line).into_iter().flat_map(move |entry| {
                entry
                    .tokens
                    .iter()
                    .rev()
                    .filter(move |t| base + t.span.start < offset)
                    .map(move |t| t.shifted(base))
            })
        }))
    }
}

fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect()
}
