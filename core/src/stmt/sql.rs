use std::fmt;

use crate::{
    ast::{NodeInfo, impl_ast_node},
    expr::{ExpressionNode, NameExpression},
    parser::{CursorDecl, ExpressionParsingOptions, ParseContext, Parser, PreparedDecl},
    stmt::parse_names,
    token::{Span, Token, TokenKind},
};

/// A static SQL statement (`select`, `insert`, `update`, `delete`) kept as
/// raw tokens, with the `into` targets of a select parsed as names.
#[derive(Debug, Clone)]
pub struct SqlStatement {
    pub info: NodeInfo,
    pub keyword: TokenKind,
    pub tokens: Vec<Token>,
    pub into: Vec<NameExpression>,
    text: String,
}

impl SqlStatement {
    /// Captures tokens up to the first statement keyword outside
    /// parentheses, or an unbalanced `)` when nested in an expression.
    pub fn try_parse(parser: &mut Parser, options: &ExpressionParsingOptions) -> Option<SqlStatement> {
        let keyword = parser.peek().kind;
        if !matches!(
            keyword,
            TokenKind::Select | TokenKind::Insert | TokenKind::Update | TokenKind::Delete
        ) {
            return None;
        }
        let first = parser.next_token();
        let mut node = SqlStatement {
            info: NodeInfo::at(first.start()),
            keyword,
            tokens: vec![first.clone()],
            into: Vec::new(),
            text: first.value.clone(),
        };

        let mut depth = 0usize;
        loop {
            let next = parser.peek();
            if next.kind == TokenKind::EndOfFile {
                break;
            }
            if depth == 0 {
                if next.kind == TokenKind::RightParenthesis {
                    break;
                }
                if next.kind == TokenKind::For && parser.peek_kind_n(TokenKind::Update, 2) {
                    node.push(parser.next_token());
                    node.push(parser.next_token());
                    continue;
                }
                let nested_select = next.kind == TokenKind::Select && keyword == TokenKind::Insert;
                if next.kind.is_statement_keyword() && !nested_select {
                    break;
                }
                if next.kind == TokenKind::Into && keyword == TokenKind::Select && node.into.is_empty() {
                    node.push(parser.next_token());
                    node.into = parse_names(parser, options);
                    for name in &node.into {
                        node.text.push(' ');
                        node.text.push_str(&name.to_string());
                    }
                    continue;
                }
            }
            match next.kind {
                TokenKind::LeftParenthesis => depth += 1,
                TokenKind::RightParenthesis => depth -= 1,
                _ => {}
            }
            node.push(parser.next_token());
        }

        node.info.end = parser.token().end();
        node.info.is_complete = depth == 0 && node.tokens.len() > 1;
        Some(node)
    }

    fn push(&mut self, token: &Token) {
        self.text.push(' ');
        self.text.push_str(&token.value);
        self.tokens.push(token.clone());
    }

    /// Table names following `from`, `into` (insert), `update` and `join`.
    pub fn tables(&self) -> Vec<&str> {
        let mut tables = Vec::new();
        for pair in self.tokens.windows(2) {
            let introduces = matches!(pair[0].kind, TokenKind::From | TokenKind::Update)
                || (pair[0].kind == TokenKind::Into && self.keyword == TokenKind::Insert)
                || pair[0].value.eq_ignore_ascii_case("join");
            if introduces && pair[1].is_name_like() {
                tables.push(pair[1].value.as_str());
            }
        }
        tables
    }
}

impl fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// `sql ... end sql`
#[derive(Debug, Clone)]
pub struct SqlBlockNode {
    pub info: NodeInfo,
    pub tokens: Vec<Token>,
}

impl SqlBlockNode {
    pub fn try_parse(parser: &mut Parser) -> Option<SqlBlockNode> {
        if !parser.peek_kind(TokenKind::Sql) {
            return None;
        }
        let start = parser.next_token().start();
        let mut node = SqlBlockNode {
            info: NodeInfo::at(start),
            tokens: Vec::new(),
        };
        node.info.decorator_end = Some(parser.token().end());
        while !parser.at_eof() && !parser.peek_end(TokenKind::Sql) {
            node.tokens.push(parser.next_token().clone());
        }
        if parser.peek_end(TokenKind::Sql) {
            parser.next_token();
            parser.next_token();
            node.info.is_complete = true;
        } else {
            parser.report_syntax_error("A sql block must be terminated with \"end sql\".");
        }
        node.info.end = parser.token().end();
        Some(node)
    }
}

impl fmt::Display for SqlBlockNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("sql")?;
        for token in &self.tokens {
            write!(f, " {}", token.value)?;
        }
        f.write_str(" end sql")
    }
}

#[derive(Debug, Clone)]
pub enum DeclareQuery {
    /// `from "select ..."`
    String(ExpressionNode),
    /// `for sql ... end sql`
    Block(SqlBlockNode),
    /// `for select ...`
    Static(SqlStatement),
    /// `for prepared_id`
    Prepared(String),
}

/// `declare name [scroll] cursor [with hold] {for ... | from "..."}`
#[derive(Debug, Clone)]
pub struct DeclareStatement {
    pub info: NodeInfo,
    pub identifier: Option<Token>,
    pub scroll: bool,
    pub with_hold: bool,
    pub query: Option<DeclareQuery>,
}

impl DeclareStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<DeclareStatement> {
        if !parser.peek_kind(TokenKind::Declare) {
            return None;
        }
        let start = parser.next_token().start();
        let options = ctx.expression_options;
        let mut node = DeclareStatement {
            info: NodeInfo::at(start),
            identifier: None,
            scroll: false,
            with_hold: false,
            query: None,
        };

        if !parser.peek().is_name_like() {
            parser.report_syntax_error("SQL declare statement must specify an identifier to declare.");
            node.info.end = parser.token().end();
            return Some(node);
        }
        node.identifier = Some(parser.next_token().clone());
        node.scroll = parser.accept(TokenKind::Scroll);

        if parser.accept(TokenKind::Cursor) {
            if parser.accept(TokenKind::With) {
                node.with_hold = parser.accept(TokenKind::Hold);
                if !node.with_hold {
                    parser.report_syntax_error("SQL declare statement missing \"hold\" keyword.");
                }
            }

            if parser.accept(TokenKind::From) {
                match ExpressionNode::try_parse(parser, &[], &options) {
                    Some(expr) if expr.as_literal().is_some_and(|t| t.category.is_string_like()) => {
                        node.query = Some(DeclareQuery::String(expr));
                    }
                    _ => parser.report_syntax_error("String expression not found for SQl declare statement"),
                }
            } else if parser.accept(TokenKind::For) {
                if parser.peek_kind(TokenKind::Sql) {
                    node.query = SqlBlockNode::try_parse(parser).map(DeclareQuery::Block);
                } else if parser.peek_kind(TokenKind::Select) {
                    match SqlStatement::try_parse(parser, &options) {
                        Some(select) => node.query = Some(DeclareQuery::Static(select)),
                        None => parser.report_syntax_error("Static SQL declare statement must specify a SELECT statement."),
                    }
                } else if parser.peek().is_name_like() {
                    let prepared = parser.next_token();
                    node.query = Some(DeclareQuery::Prepared(prepared.value.clone()));
                } else {
                    parser.report_syntax_error("Invalid token found in SQL declare statment.");
                }
            } else {
                parser.report_syntax_error("SQL declare statement must have either \"for\" or \"from\" keyword.");
            }
        } else {
            parser.report_syntax_error("SQL declare statement missing \"cursor\" keyword.");
        }

        if let Some(identifier) = &node.identifier {
            ctx.cursors.push(CursorDecl {
                name: identifier.value.clone(),
                span: identifier.span,
                scroll: node.scroll,
                prepared_from: node.prepared_statement_id().map(str::to_string),
            });
        }
        node.info.is_complete = node.query.is_some();
        node.info.end = parser.token().end();
        Some(node)
    }

    pub fn name(&self) -> Option<&str> {
        self.identifier.as_ref().map(|t| t.value.as_str())
    }

    pub fn prepared_statement_id(&self) -> Option<&str> {
        match &self.query {
            Some(DeclareQuery::Prepared(id)) => Some(id),
            _ => None,
        }
    }
}

/// `prepare name from expr`
#[derive(Debug, Clone)]
pub struct PrepareStatement {
    pub info: NodeInfo,
    pub identifier: Option<Token>,
    pub source: Option<ExpressionNode>,
}

impl PrepareStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<PrepareStatement> {
        if !parser.peek_kind(TokenKind::Prepare) {
            return None;
        }
        let start = parser.next_token().start();
        let options = ctx.expression_options;
        let mut node = PrepareStatement {
            info: NodeInfo::at(start),
            identifier: None,
            source: None,
        };
        if parser.peek().is_name_like() {
            node.identifier = Some(parser.next_token().clone());
            if parser.accept(TokenKind::From) {
                node.source = ExpressionNode::try_parse(parser, &[], &options);
                if node.source.is_none() {
                    parser.report_syntax_error("Prepare statement missing SQL text expression.");
                }
            } else {
                parser.report_syntax_error("Prepare statement missing \"from\" keyword.");
            }
        } else {
            parser.report_syntax_error("Prepare statement must specify an identifier to prepare.");
        }
        if let Some(identifier) = &node.identifier {
            ctx.prepared.push(PreparedDecl {
                name: identifier.value.clone(),
                span: identifier.span,
            });
        }
        node.info.is_complete = node.source.is_some();
        node.info.end = parser.token().end();
        Some(node)
    }
}

/// `execute immediate expr` / `execute name [using ...] [into ...]`
#[derive(Debug, Clone)]
pub struct ExecuteStatement {
    pub info: NodeInfo,
    pub identifier: Option<Token>,
    pub immediate: Option<ExpressionNode>,
    pub using: Vec<NameExpression>,
    pub into: Vec<NameExpression>,
}

impl ExecuteStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<ExecuteStatement> {
        if !parser.peek_kind(TokenKind::Execute) {
            return None;
        }
        let start = parser.next_token().start();
        let options = ctx.expression_options;
        let mut node = ExecuteStatement {
            info: NodeInfo::at(start),
            identifier: None,
            immediate: None,
            using: Vec::new(),
            into: Vec::new(),
        };
        if parser.accept(TokenKind::Immediate) {
            node.immediate = ExpressionNode::try_parse(parser, &[], &options);
            if node.immediate.is_none() {
                parser.report_syntax_error("Execute immediate statement missing SQL text expression.");
            }
        } else if parser.peek().is_name_like() {
            node.identifier = Some(parser.next_token().clone());
            parse_using_into(parser, &options, &mut node.using, &mut node.into);
        } else {
            parser.report_syntax_error("Execute statement must specify a prepared statement.");
        }
        node.info.is_complete = node.immediate.is_some() || node.identifier.is_some();
        node.info.end = parser.token().end();
        Some(node)
    }
}

/// `using a, b` and `into c, d` clauses, in either order.
fn parse_using_into(
    parser: &mut Parser,
    options: &ExpressionParsingOptions,
    using: &mut Vec<NameExpression>,
    into: &mut Vec<NameExpression>,
) {
    loop {
        if parser.accept(TokenKind::Using) {
            *using = parse_names(parser, options);
            if using.is_empty() {
                parser.report_syntax_error("Expected variable list after \"using\".");
            }
        } else if parser.accept(TokenKind::Into) {
            *into = parse_names(parser, options);
            if into.is_empty() {
                parser.report_syntax_error("Expected variable list after \"into\".");
            }
        } else {
            break;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorAction {
    Open,
    Fetch,
    Close,
    Free,
}

impl CursorAction {
    pub fn keyword(self) -> &'static str {
        match self {
            CursorAction::Open => "open",
            CursorAction::Fetch => "fetch",
            CursorAction::Close => "close",
            CursorAction::Free => "free",
        }
    }
}

/// `open`, `fetch`, `close` and `free` applied to a cursor or prepared id.
#[derive(Debug, Clone)]
pub struct CursorStatement {
    pub info: NodeInfo,
    pub action: CursorAction,
    pub cursor: Option<Token>,
    /// Fetch direction such as `next` or `absolute`.
    pub direction: Option<String>,
    pub offset: Option<ExpressionNode>,
    pub using: Vec<NameExpression>,
    pub into: Vec<NameExpression>,
    pub with_reoptimization: bool,
}

impl CursorStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<CursorStatement> {
        let action = match parser.peek().kind {
            TokenKind::Open => CursorAction::Open,
            TokenKind::Fetch => CursorAction::Fetch,
            TokenKind::Close => CursorAction::Close,
            TokenKind::Free => CursorAction::Free,
            _ => return None,
        };
        let start = parser.next_token().start();
        let options = ctx.expression_options;
        let mut node = CursorStatement {
            info: NodeInfo::at(start),
            action,
            cursor: None,
            direction: None,
            offset: None,
            using: Vec::new(),
            into: Vec::new(),
            with_reoptimization: false,
        };

        if action == CursorAction::Fetch {
            let next = parser.peek();
            let is_direction = matches!(
                next.kind,
                TokenKind::Next | TokenKind::Previous | TokenKind::First | TokenKind::Last | TokenKind::Current
            ) || next.value.eq_ignore_ascii_case("prior");
            if is_direction && parser.peek_n(2).is_name_like() {
                node.direction = Some(parser.next_token().value.to_ascii_lowercase());
            } else if matches!(next.kind, TokenKind::Relative | TokenKind::Absolute) {
                node.direction = Some(parser.next_token().value.to_ascii_lowercase());
                node.offset = ExpressionNode::try_parse(parser, &[], &options);
                if node.offset.is_none() {
                    parser.report_syntax_error("Fetch statement missing row offset.");
                }
            }
        }

        if parser.peek().is_name_like() && !parser.peek().kind.is_statement_keyword() {
            node.cursor = Some(parser.next_token().clone());
        } else {
            parser.report_syntax_error(format!("{} statement must specify a cursor.", action.keyword()));
        }

        match action {
            CursorAction::Open => {
                if parser.accept(TokenKind::Using) {
                    node.using = parse_names(parser, &options);
                }
                if parser.peek_kind(TokenKind::With) && parser.peek_kind_n(TokenKind::Reoptimization, 2) {
                    parser.next_token();
                    parser.next_token();
                    node.with_reoptimization = true;
                }
            }
            CursorAction::Fetch => {
                if parser.accept(TokenKind::Into) {
                    node.into = parse_names(parser, &options);
                    if node.into.is_empty() {
                        parser.report_syntax_error("Expected variable list after \"into\".");
                    }
                }
            }
            CursorAction::Close | CursorAction::Free => {}
        }
        node.info.is_complete = node.cursor.is_some();
        node.info.end = parser.token().end();
        Some(node)
    }

    pub fn cursor_span(&self) -> Option<Span> {
        self.cursor.as_ref().map(|t| t.span)
    }
}

impl_ast_node!(
    SqlStatement,
    SqlBlockNode,
    DeclareStatement,
    PrepareStatement,
    ExecuteStatement,
    CursorStatement,
);
