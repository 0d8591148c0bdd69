mod context;

#[cfg(test)]
mod parser_test;

pub use context::{BlockMark, CursorDecl, ExpressionParsingOptions, FunctionScope, ParseContext, PreparedDecl};

use crate::token::{
    Diagnostic, DiagnosticKind, ErrorSink, Severity, Span, Token, TokenCategory, TokenKind,
};

static FALLBACK_EOF: Token = Token {
    kind: TokenKind::EndOfFile,
    category: TokenCategory::EndOfStream,
    value: String::new(),
    span: Span { start: 0, end: 0 },
};

/// Cursor over a non-verbatim token stream. Holds no grammar knowledge: the
/// node factories drive it through peek/advance and report problems into its
/// diagnostic list.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    fn eof_token(&self) -> &'a Token {
        match self.tokens.last() {
            Some(last) if last.kind == TokenKind::EndOfFile => last,
            _ => &FALLBACK_EOF,
        }
    }

    /// The next unconsumed token.
    pub fn peek(&self) -> &'a Token {
        self.peek_n(1)
    }

    /// The `n`-th unconsumed token, one-based.
    pub fn peek_n(&self, n: usize) -> &'a Token {
        debug_assert!(n >= 1);
        match self.tokens.get(self.pos + n - 1) {
            Some(token) => token,
            None => self.eof_token(),
        }
    }

    pub fn peek_kind(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub fn peek_kind_n(&self, kind: TokenKind, n: usize) -> bool {
        self.peek_n(n).kind == kind
    }

    pub fn peek_category(&self, category: TokenCategory) -> bool {
        self.peek().category == category
    }

    pub fn peek_category_n(&self, category: TokenCategory, n: usize) -> bool {
        self.peek_n(n).category == category
    }

    pub fn peek_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.peek().kind)
    }

    /// Two-token terminator lookahead, e.g. `end if`.
    pub fn peek_end(&self, kind: TokenKind) -> bool {
        self.peek_kind(TokenKind::End) && self.peek_kind_n(kind, 2)
    }

    pub fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::EndOfFile
    }

    /// Consumes and returns the next token. At end of input the EOF token
    /// is returned without advancing.
    pub fn next_token(&mut self) -> &'a Token {
        let token = self.peek();
        if token.kind != TokenKind::EndOfFile && self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Consumes the next token when it has `kind`.
    pub fn accept(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind(kind) {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// The most recently consumed token (the first token before anything has
    /// been consumed).
    pub fn token(&self) -> &'a Token {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token,
            None => self.tokens.first().unwrap_or(&FALLBACK_EOF),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Reports at the span of the current token.
    pub fn report_syntax_error(&mut self, message: impl Into<String>) {
        let span = self.token().span;
        self.diagnostics.push(Diagnostic::syntax(message, span));
    }

    pub fn report_syntax_error_at(&mut self, message: impl Into<String>, start: usize, end: usize, severity: Severity) {
        self.diagnostics
            .push(Diagnostic::new(message, Span::new(start, end), severity, DiagnosticKind::Syntax));
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Forwards everything collected so far to an external sink.
    pub fn drain_into(&mut self, sink: &mut dyn ErrorSink) {
        for diagnostic in self.diagnostics.drain(..) {
            sink.report(diagnostic);
        }
    }
}
