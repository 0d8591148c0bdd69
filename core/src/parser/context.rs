use crate::token::{Span, TokenKind};

/// Mode switches for the expression loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpressionParsingOptions {
    pub allow_star_param: bool,
    pub allow_anything_for_function_params: bool,
    pub allow_question_mark: bool,
    pub allow_nested_select_statement: bool,
}

impl ExpressionParsingOptions {
    pub fn with_star_param(mut self) -> Self {
        self.allow_star_param = true;
        self
    }

    pub fn with_nested_select(mut self) -> Self {
        self.allow_nested_select_statement = true;
        self
    }
}

/// `declare name cursor ...` seen anywhere in the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorDecl {
    pub name: String,
    pub span: Span,
    pub scroll: bool,
    pub prepared_from: Option<String>,
}

/// `prepare name from ...` seen anywhere in the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDecl {
    pub name: String,
    pub span: Span,
}

/// Per-function collectors filled while the body is parsed.
#[derive(Debug, Default)]
pub struct FunctionScope {
    return_arity: Option<usize>,
    pub return_spans: Vec<Span>,
}

impl FunctionScope {
    /// Records a return statement. All returns of one function must agree on
    /// the number of values.
    pub fn bind_return(&mut self, arity: usize, span: Span) -> Result<(), String> {
        match self.return_arity {
            Some(expected) if expected != arity => Err(
                "Return statement does not return the same number of values as other return statements in this function."
                    .to_string(),
            ),
            _ => {
                self.return_arity = Some(arity);
                self.return_spans.push(span);
                Ok(())
            }
        }
    }

    pub fn return_arity(&self) -> Option<usize> {
        self.return_arity
    }
}

/// Stack depths captured by `push_block`.
#[derive(Debug, Clone, Copy)]
pub struct BlockMark {
    ends: usize,
    exits: usize,
    continues: usize,
}

/// State threaded through every grammar production: the terminator and
/// exit/continue sets of the enclosing blocks, expression options, and the
/// collectors for returns, cursors and prepared statements.
#[derive(Debug, Default)]
pub struct ParseContext {
    end_keywords: Vec<TokenKind>,
    valid_exits: Vec<TokenKind>,
    valid_continues: Vec<TokenKind>,
    pub expression_options: ExpressionParsingOptions,
    pub function: Option<FunctionScope>,
    pub module_id: u64,
    pub cursors: Vec<CursorDecl>,
    pub prepared: Vec<PreparedDecl>,
}

impl ParseContext {
    pub fn new(expression_options: ExpressionParsingOptions) -> Self {
        Self {
            expression_options,
            ..Default::default()
        }
    }

    pub fn for_module(mut self, id: u64) -> Self {
        self.module_id = id;
        self
    }

    /// Enters a block terminated by `end <end>`, optionally accepting
    /// `exit <exit>` / `continue <cont>` inside it.
    pub fn push_block(&mut self, end: TokenKind, exit: Option<TokenKind>, cont: Option<TokenKind>) -> BlockMark {
        let mark = BlockMark {
            ends: self.end_keywords.len(),
            exits: self.valid_exits.len(),
            continues: self.valid_continues.len(),
        };
        self.end_keywords.push(end);
        self.valid_exits.extend(exit);
        self.valid_continues.extend(cont);
        mark
    }

    pub fn pop_block(&mut self, mark: BlockMark) {
        self.end_keywords.truncate(mark.ends);
        self.valid_exits.truncate(mark.exits);
        self.valid_continues.truncate(mark.continues);
    }

    pub fn is_end_keyword(&self, kind: TokenKind) -> bool {
        self.end_keywords.contains(&kind)
    }

    pub fn allows_exit(&self, kind: TokenKind) -> bool {
        self.valid_exits.contains(&kind)
    }

    pub fn allows_continue(&self, kind: TokenKind) -> bool {
        self.valid_continues.contains(&kind)
    }

    pub fn end_keywords(&self) -> &[TokenKind] {
        &self.end_keywords
    }
}
