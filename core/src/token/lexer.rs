use std::hash::{Hash, Hasher};

use crate::token::{Span, TokenCategory, TokenKind};

/// A lexed token. `span` is absolute unless the token came out of a
/// per-line tokenization, in which case it is relative to the line start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub category: TokenCategory,
    pub value: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, category: TokenCategory, value: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            category,
            value: value.into(),
            span,
        }
    }

    pub fn eof(at: usize) -> Self {
        Self::new(TokenKind::EndOfFile, TokenCategory::EndOfStream, "", Span::empty(at))
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    /// Identifiers and keywords can both name things in 4GL.
    pub fn is_name_like(&self) -> bool {
        matches!(self.category, TokenCategory::Identifier | TokenCategory::Keyword)
    }

    pub fn is_trivia(&self) -> bool {
        matches!(self.category, TokenCategory::Comment | TokenCategory::WhiteSpace)
    }

    pub fn shifted(&self, delta: usize) -> Token {
        Token {
            span: self.span.shifted(delta),
            ..self.clone()
        }
    }
}

/// A token used as a symbol key: compares and hashes by name, ignoring case.
#[derive(Debug, Clone)]
pub struct TokenWithSpan {
    pub token: Token,
}

impl TokenWithSpan {
    pub fn new(token: Token) -> Self {
        Self { token }
    }

    pub fn name(&self) -> &str {
        &self.token.value
    }

    pub fn span(&self) -> Span {
        self.token.span
    }
}

impl PartialEq for TokenWithSpan {
    fn eq(&self, other: &Self) -> bool {
        self.token.value.eq_ignore_ascii_case(&other.token.value)
    }
}

impl Eq for TokenWithSpan {}

impl Hash for TokenWithSpan {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.token.value.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

/// Continuation state at a line boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LexState {
    #[default]
    Normal,
    BlockComment,
    InString(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenizerOptions {
    /// Emit newline tokens.
    pub verbatim: bool,
    /// Emit comment tokens.
    pub verbatim_comments: bool,
}

impl TokenizerOptions {
    pub fn verbatim() -> Self {
        Self {
            verbatim: true,
            verbatim_comments: true,
        }
    }
}

const ASCII_WHITESPACE: u8 = 1 << 0;
const ASCII_DIGIT: u8 = 1 << 1;
const ASCII_ALPHA: u8 = 1 << 2;
const ASCII_IDENT_START: u8 = 1 << 3;
const ASCII_IDENT_CONT: u8 = 1 << 4;

const fn build_ascii_class() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let c = i as u8;
        if matches!(c, b' ' | b'\t' | b'\r' | 0x0B | 0x0C) {
            table[i] |= ASCII_WHITESPACE;
        }
        if c >= b'0' && c <= b'9' {
            table[i] |= ASCII_DIGIT | ASCII_IDENT_CONT;
        }
        if (c >= b'a' && c <= b'z') || (c >= b'A' && c <= b'Z') {
            table[i] |= ASCII_ALPHA | ASCII_IDENT_START | ASCII_IDENT_CONT;
        }
        if c == b'_' {
            table[i] |= ASCII_IDENT_START | ASCII_IDENT_CONT;
        }
        i += 1;
    }
    table
}

const ASCII_CLASS: [u8; 256] = build_ascii_class();

#[inline]
fn ascii_flags(c: char) -> u8 {
    if c.is_ascii() { ASCII_CLASS[c as usize] } else { 0 }
}

#[inline]
fn is_space_char(c: char) -> bool {
    let flags = ascii_flags(c);
    if flags != 0 {
        flags & ASCII_WHITESPACE != 0
    } else {
        c != '\n' && c.is_whitespace()
    }
}

#[inline]
fn is_ident_start(c: char) -> bool {
    let flags = ascii_flags(c);
    if flags != 0 {
        flags & ASCII_IDENT_START != 0
    } else {
        c.is_alphabetic()
    }
}

#[inline]
fn is_ident_continue(c: char) -> bool {
    let flags = ascii_flags(c);
    if flags != 0 {
        flags & ASCII_IDENT_CONT != 0
    } else {
        c.is_alphanumeric()
    }
}

#[inline]
fn is_digit(c: char) -> bool {
    ascii_flags(c) & ASCII_DIGIT != 0
}

pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    base: usize,
    options: TokenizerOptions,
    state: LexState,
    tokens: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str, options: TokenizerOptions) -> Self {
        Self {
            input,
            pos: 0,
            base: 0,
            options,
            state: LexState::Normal,
            tokens: Vec::new(),
        }
    }

    /// Absolute offset of the first byte of `input`.
    pub fn with_base(mut self, base: usize) -> Self {
        self.base = base;
        self
    }

    pub fn with_state(mut self, state: LexState) -> Self {
        self.state = state;
        self
    }

    /// Tokens for the parser: no newlines or comments, terminated by EOF.
    pub fn tokenize(s: &str) -> Vec<Token> {
        Self::tokenize_with(s, TokenizerOptions::default())
    }

    pub fn tokenize_with(s: &str, options: TokenizerOptions) -> Vec<Token> {
        let mut tokenizer = Tokenizer::new(s, options);
        tokenizer.scan();
        let end = tokenizer.base + tokenizer.input.len();
        tokenizer.tokens.push(Token::eof(end));
        tokenizer.tokens
    }

    /// Tokenizes one line (without its line terminator). Spans are relative
    /// to the line start and no EOF token is appended.
    pub fn tokenize_line(line: &str, state: LexState, options: TokenizerOptions) -> (Vec<Token>, LexState) {
        let mut tokenizer = Tokenizer::new(line, options).with_state(state);
        tokenizer.scan();
        (tokenizer.tokens, tokenizer.state)
    }

    pub fn state(&self) -> LexState {
        self.state
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn advance_char(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn push(&mut self, kind: TokenKind, category: TokenCategory, start: usize) {
        let value = &self.input[start..self.pos];
        let span = Span::new(self.base + start, self.base + self.pos);
        self.tokens.push(Token::new(kind, category, value, span));
    }

    fn scan(&mut self) {
        match self.state {
            LexState::Normal => {}
            LexState::BlockComment => self.scan_block_comment(self.pos),
            LexState::InString(quote) => self.scan_string_body(self.pos, quote),
        }

        while let Some(c) = self.peek_char() {
            let start = self.pos;
            match c {
                '\n' => {
                    self.advance_char();
                    if self.options.verbatim {
                        self.push(TokenKind::NewLine, TokenCategory::WhiteSpace, start);
                    }
                }
                c if is_space_char(c) => self.advance_char(),
                '#' => self.scan_line_comment(start),
                '-' if self.peek_char_at(1) == Some('-') => self.scan_line_comment(start),
                '{' => {
                    self.advance_char();
                    self.scan_block_comment(start);
                }
                '"' | '\'' => {
                    self.advance_char();
                    self.scan_string_body(start, c);
                }
                c if is_digit(c) => self.scan_number(start),
                '.' if self.peek_char_at(1).is_some_and(is_digit) => self.scan_number(start),
                c if is_ident_start(c) => self.scan_word(start),
                _ => self.scan_punctuation(start, c),
            }
        }
    }

    fn scan_line_comment(&mut self, start: usize) {
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.advance_char();
        }
        let end = self.input[start..self.pos].trim_end_matches('\r').len() + start;
        if self.options.verbatim_comments {
            let value = &self.input[start..end];
            let span = Span::new(self.base + start, self.base + end);
            self.tokens
                .push(Token::new(TokenKind::Comment, TokenCategory::Comment, value, span));
        }
    }

    /// Scans to the closing brace; an unterminated comment leaves the
    /// tokenizer in the block-comment state.
    fn scan_block_comment(&mut self, start: usize) {
        self.state = LexState::BlockComment;
        while let Some(c) = self.peek_char() {
            self.advance_char();
            if c == '}' {
                self.state = LexState::Normal;
                break;
            }
        }
        if self.options.verbatim_comments && self.pos > start {
            self.push(TokenKind::Comment, TokenCategory::Comment, start);
        }
    }

    /// Scans the rest of a quoted literal whose opening quote has already
    /// been consumed (or was consumed on an earlier line).
    fn scan_string_body(&mut self, start: usize, quote: char) {
        self.state = LexState::InString(quote);
        while let Some(c) = self.peek_char() {
            self.advance_char();
            if c == '\\' {
                self.advance_char();
            } else if c == quote {
                self.state = LexState::Normal;
                break;
            }
        }
        if self.pos == start {
            return;
        }
        let category = match self.state {
            LexState::InString(_) => TokenCategory::IncompleteMultiLineStringLiteral,
            _ if quote == '\'' => TokenCategory::CharacterLiteral,
            _ => TokenCategory::StringLiteral,
        };
        self.push(TokenKind::StringLiteral, category, start);
    }

    fn scan_number(&mut self, start: usize) {
        while self.peek_char().is_some_and(is_digit) {
            self.advance_char();
        }
        if self.peek_char() == Some('.') && self.peek_char_at(1).is_some_and(is_digit) {
            self.advance_char();
            while self.peek_char().is_some_and(is_digit) {
                self.advance_char();
            }
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            let sign = matches!(self.peek_char_at(1), Some('+') | Some('-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_char_at(digit_at).is_some_and(is_digit) {
                for _ in 0..digit_at {
                    self.advance_char();
                }
                while self.peek_char().is_some_and(is_digit) {
                    self.advance_char();
                }
            }
        }
        self.push(TokenKind::NumberLiteral, TokenCategory::NumericLiteral, start);
    }

    fn scan_word(&mut self, start: usize) {
        while self.peek_char().is_some_and(is_ident_continue) {
            self.advance_char();
        }
        let word = &self.input[start..self.pos];
        match TokenKind::from_keyword(word) {
            Some(kind) => self.push(kind, TokenCategory::Keyword, start),
            None => self.push(TokenKind::Ident, TokenCategory::Identifier, start),
        }
    }

    fn scan_punctuation(&mut self, start: usize, c: char) {
        self.advance_char();
        let kind = match c {
            '+' => TokenKind::Add,
            '-' => TokenKind::Subtract,
            '*' => {
                if self.peek_char() == Some('*') {
                    self.advance_char();
                    TokenKind::Power
                } else {
                    TokenKind::Multiply
                }
            }
            '/' => TokenKind::Divide,
            '<' => TokenKind::LessThan,
            '>' => TokenKind::GreaterThan,
            '=' => TokenKind::Equals,
            '!' => TokenKind::Exclamation,
            '|' => TokenKind::SingleBar,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '?' => TokenKind::QuestionMark,
            '(' => TokenKind::LeftParenthesis,
            ')' => TokenKind::RightParenthesis,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            _ => TokenKind::Invalid,
        };
        self.push(kind, kind.category(), start);
    }
}

/// Literal text of a string token without its quotes, escapes resolved.
pub fn unquote(value: &str) -> String {
    let mut chars = value.chars();
    let quote = match chars.next() {
        Some(q @ ('"' | '\'')) => q,
        _ => return value.to_string(),
    };
    let mut out = String::with_capacity(value.len());
    let mut escaped = false;
    for c in chars {
        if escaped {
            match c {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                other => out.push(other),
            }
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            break;
        } else {
            out.push(c);
        }
    }
    out
}
