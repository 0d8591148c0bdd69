mod call;
mod name;

#[cfg(test)]
mod expr_test;

pub use call::{CallOrName, FunctionCallExpression};
pub use name::{NameExpression, NamePiece};

use std::fmt;

use crate::{
    ast::{NodeInfo, impl_ast_node},
    parser::{ExpressionParsingOptions, Parser},
    stmt::SqlStatement,
    token::{Token, TokenCategory, TokenKind},
    typ::{ConstraintResult, verify_valid_constraint},
};

/// Keywords that close or continue an enclosing construct. A term never
/// claims one of these as a name.
const RESERVED_IN_EXPRESSION: &[TokenKind] = &[
    TokenKind::After,
    TokenKind::And,
    TokenKind::As,
    TokenKind::Attribute,
    TokenKind::Attributes,
    TokenKind::Before,
    TokenKind::Between,
    TokenKind::By,
    TokenKind::Catch,
    TokenKind::Clipped,
    TokenKind::Else,
    TokenKind::From,
    TokenKind::Help,
    TokenKind::In,
    TokenKind::InstanceOf,
    TokenKind::Into,
    TokenKind::Is,
    TokenKind::Like,
    TokenKind::Matches,
    TokenKind::Mod,
    TokenKind::Of,
    TokenKind::On,
    TokenKind::Or,
    TokenKind::Otherwise,
    TokenKind::Returning,
    TokenKind::Spaces,
    TokenKind::Step,
    TokenKind::Then,
    TokenKind::Through,
    TokenKind::Thru,
    TokenKind::To,
    TokenKind::Units,
    TokenKind::Using,
    TokenKind::When,
    TokenKind::Where,
    TokenKind::With,
    TokenKind::Without,
];

const PRE_EXPRESSION: &[TokenKind] = &[
    TokenKind::Not,
    TokenKind::Column,
    TokenKind::Subtract,
    TokenKind::Ascii,
    TokenKind::Add,
];

/// Whether `token` may start a name in value position.
pub(crate) fn is_expression_name(token: &Token) -> bool {
    match token.category {
        TokenCategory::Identifier => true,
        TokenCategory::Keyword => {
            !token.kind.is_statement_keyword() && !RESERVED_IN_EXPRESSION.contains(&token.kind)
        }
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Concat,
    Equal,
    DoubleEqual,
    NotEqual,
    LessGreater,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
    Mod,
    Using,
    As,
    InstanceOf,
    Units,
    Like,
    Matches,
    Between,
    Through,
    In,
    NotLike,
    NotMatches,
    NotIn,
    IsNull,
    IsNotNull,
    Clipped,
    Spaces,
    Not,
    Column,
    Ascii,
    QuestionMark,
    /// A lone `!` or `|`, already reported.
    Stray(TokenKind),
}

impl Operator {
    pub fn text(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Power => "**",
            Operator::Concat => "||",
            Operator::Equal => "=",
            Operator::DoubleEqual => "==",
            Operator::NotEqual => "!=",
            Operator::LessGreater => "<>",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Mod => "mod",
            Operator::Using => "using",
            Operator::As => "as",
            Operator::InstanceOf => "instanceof",
            Operator::Units => "units",
            Operator::Like => "like",
            Operator::Matches => "matches",
            Operator::Between => "between",
            Operator::Through => "through",
            Operator::In => "in",
            Operator::NotLike => "not like",
            Operator::NotMatches => "not matches",
            Operator::NotIn => "not in",
            Operator::IsNull => "is null",
            Operator::IsNotNull => "is not null",
            Operator::Clipped => "clipped",
            Operator::Spaces => "spaces",
            Operator::Not => "not",
            Operator::Column => "column",
            Operator::Ascii => "ascii",
            Operator::QuestionMark => "?",
            Operator::Stray(kind) => kind.text(),
        }
    }

    fn prefix(kind: TokenKind) -> Operator {
        match kind {
            TokenKind::Not => Operator::Not,
            TokenKind::Column => Operator::Column,
            TokenKind::Ascii => Operator::Ascii,
            TokenKind::Add => Operator::Add,
            _ => Operator::Subtract,
        }
    }

    /// Binary keyword operators; each needs a right operand.
    fn binary_keyword(kind: TokenKind) -> Option<Operator> {
        let op = match kind {
            TokenKind::As => Operator::As,
            TokenKind::And => Operator::And,
            TokenKind::Or => Operator::Or,
            TokenKind::Mod => Operator::Mod,
            TokenKind::Using => Operator::Using,
            TokenKind::InstanceOf => Operator::InstanceOf,
            TokenKind::Units => Operator::Units,
            TokenKind::Like => Operator::Like,
            TokenKind::Matches => Operator::Matches,
            TokenKind::Through | TokenKind::Thru => Operator::Through,
            TokenKind::Between => Operator::Between,
            TokenKind::In => Operator::In,
            _ => return None,
        };
        Some(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// `( expr )`. With anything-params enabled the contents are kept as raw
/// tokens instead.
#[derive(Debug, Clone, Default)]
pub struct ParenExpression {
    pub inner: Option<Box<ExpressionNode>>,
    pub anything: Vec<Token>,
}

#[derive(Debug, Clone)]
pub enum ExpressionKind {
    /// Numeric literal or a bare keyword such as `null`.
    Token(Token),
    String(Token),
    /// Canonical text of `current ...`, datetime ranges and interval literals.
    Constrained(String),
    Name(NameExpression),
    Call(FunctionCallExpression),
    Paren(ParenExpression),
    Bracket(Vec<ExpressionNode>),
    Select(Box<SqlStatement>),
    Operator(Operator),
}

/// A primary term followed by the operators and terms appended to it, in
/// source order. There is no precedence tree.
#[derive(Debug, Clone)]
pub struct ExpressionNode {
    pub info: NodeInfo,
    pub kind: ExpressionKind,
    pub appended: Vec<ExpressionNode>,
}

impl_ast_node!(ExpressionNode);

impl ExpressionNode {
    pub fn new(start: usize, end: usize, kind: ExpressionKind) -> Self {
        Self {
            info: NodeInfo::spanning(start, end),
            kind,
            appended: Vec::new(),
        }
    }

    fn from_token(token: &Token) -> Self {
        let kind = if token.category.is_string_like() {
            ExpressionKind::String(token.clone())
        } else {
            ExpressionKind::Token(token.clone())
        };
        Self::new(token.start(), token.end(), kind)
    }

    fn operator(token: &Token, op: Operator) -> Self {
        Self::new(token.start(), token.end(), ExpressionKind::Operator(op))
    }

    fn push(slot: &mut Option<ExpressionNode>, node: ExpressionNode) {
        match slot {
            Some(head) => head.appended.push(node),
            None => *slot = Some(node),
        }
    }

    /// Folds the last appended operator into a two-token one (`<=`, `||`).
    fn merge_operator(slot: &mut Option<ExpressionNode>, op: Operator, end: usize) {
        if let Some(head) = slot {
            let last = if head.appended.is_empty() {
                head
            } else {
                let i = head.appended.len() - 1;
                &mut head.appended[i]
            };
            if let ExpressionKind::Operator(_) = last.kind {
                last.kind = ExpressionKind::Operator(op);
                last.info.end = end;
            }
        }
    }

    /// The expression loop: a primary term, then any number of trailing
    /// operators each followed by another term. Symbolic operators listed in
    /// `breaks` end the expression.
    pub fn try_parse(
        parser: &mut Parser,
        breaks: &[TokenKind],
        options: &ExpressionParsingOptions,
    ) -> Option<ExpressionNode> {
        let mut node: Option<ExpressionNode> = None;
        let mut result = false;
        let mut require_expression = false;

        loop {
            while PRE_EXPRESSION.contains(&parser.peek().kind) {
                let token = parser.next_token();
                Self::push(&mut node, Self::operator(token, Operator::prefix(token.kind)));
                require_expression = true;
            }

            let next = parser.peek();
            match next.kind {
                TokenKind::LeftParenthesis => {
                    let paren = Self::parse_paren(parser, options);
                    Self::push(&mut node, paren);
                    result = true;
                }
                TokenKind::LeftBracket => {
                    let bracket = Self::parse_bracket(parser, options);
                    Self::push(&mut node, bracket);
                    result = true;
                }
                _ if next.category.is_string_like() => {
                    result = true;
                    let token = parser.next_token();
                    Self::push(&mut node, Self::from_token(token));
                }
                _ if next.category == TokenCategory::NumericLiteral => {
                    result = true;
                    let token = parser.next_token();
                    Self::push(&mut node, Self::from_token(token));
                }
                TokenKind::Current => {
                    result = true;
                    let token = parser.next_token();
                    let term = match verify_valid_constraint(parser, TokenKind::Current, false, true) {
                        ConstraintResult::Constrained(text) => {
                            Self::new(token.start(), parser.token().end(), ExpressionKind::Constrained(text))
                        }
                        _ => Self::from_token(token),
                    };
                    Self::push(&mut node, term);
                }
                TokenKind::Interval => {
                    let term = Self::parse_interval(parser, &mut result);
                    Self::push(&mut node, term);
                }
                TokenKind::Select if options.allow_nested_select_statement => {
                    match SqlStatement::try_parse(parser, options) {
                        Some(select) => {
                            result = true;
                            let (start, end) = (select.info.start, select.info.end);
                            Self::push(&mut node, Self::new(start, end, ExpressionKind::Select(Box::new(select))));
                        }
                        None => parser.report_syntax_error("Invalid select statement found in expression."),
                    }
                }
                TokenKind::Null => {
                    result = true;
                    let token = parser.next_token();
                    Self::push(&mut node, Self::from_token(token));
                }
                _ if is_expression_name(next) => {
                    result = true;
                    let term = Self::parse_named_term(parser, options);
                    Self::push(&mut node, term);
                }
                TokenKind::Multiply if options.allow_star_param => {
                    result = true;
                    let token = parser.next_token();
                    Self::push(&mut node, Self::from_token(token));
                }
                TokenKind::QuestionMark if options.allow_question_mark => {
                    let token = parser.next_token();
                    if node.is_none() {
                        parser.report_syntax_error("Invalid token '?' found in expression.");
                    } else {
                        Self::push(&mut node, Self::operator(token, Operator::QuestionMark));
                    }
                }
                _ => {
                    if require_expression {
                        if !breaks.is_empty() && !breaks.contains(&next.kind) {
                            parser.report_syntax_error("Invalid token type found in expression.");
                        } else {
                            parser.report_syntax_error("Expression required.");
                        }
                    }
                    break;
                }
            }
            require_expression = false;

            while !require_expression {
                let next = parser.peek();
                if next.kind == TokenKind::EndOfFile {
                    break;
                }
                if next.kind.is_operator() && !breaks.contains(&next.kind) {
                    let token = parser.next_token();
                    Self::push(&mut node, Self::operator(token, Operator::Stray(token.kind)));
                    let op = Self::symbolic_operator(parser, token.kind);
                    Self::merge_operator(&mut node, op, parser.token().end());
                    require_expression = true;
                    continue;
                }
                if let Some(op) = Operator::binary_keyword(next.kind) {
                    let token = parser.next_token();
                    Self::push(&mut node, Self::operator(token, op));
                    require_expression = true;
                    continue;
                }
                match next.kind {
                    TokenKind::Clipped | TokenKind::Spaces => {
                        let token = parser.next_token();
                        let op = if token.kind == TokenKind::Clipped {
                            Operator::Clipped
                        } else {
                            Operator::Spaces
                        };
                        Self::push(&mut node, Self::operator(token, op));
                    }
                    TokenKind::Is => {
                        let token = parser.next_token();
                        Self::push(&mut node, Self::operator(token, Operator::IsNull));
                        let negated = parser.accept(TokenKind::Not);
                        if parser.accept(TokenKind::Null) {
                            let op = if negated { Operator::IsNotNull } else { Operator::IsNull };
                            Self::merge_operator(&mut node, op, parser.token().end());
                        } else {
                            parser.report_syntax_error("NULL keyword required in expression.");
                        }
                    }
                    TokenKind::Not => {
                        let token = parser.next_token();
                        Self::push(&mut node, Self::operator(token, Operator::Not));
                        let op = match parser.peek().kind {
                            TokenKind::Like => Some(Operator::NotLike),
                            TokenKind::Matches => Some(Operator::NotMatches),
                            TokenKind::In => Some(Operator::NotIn),
                            _ => None,
                        };
                        match op {
                            Some(op) => {
                                parser.next_token();
                                Self::merge_operator(&mut node, op, parser.token().end());
                                require_expression = true;
                            }
                            None => parser.report_syntax_error("LIKE or MATCHES keyword required in expression."),
                        }
                    }
                    _ => break,
                }
            }

            if !require_expression {
                break;
            }
        }

        let mut node = node.filter(|_| result)?;
        node.info.end = parser.token().end();
        node.info.is_complete = true;
        Some(node)
    }

    /// Resolves a symbolic operator's second character, if any.
    fn symbolic_operator(parser: &mut Parser, first: TokenKind) -> Operator {
        match first {
            TokenKind::LessThan if parser.accept(TokenKind::Equals) => Operator::LessEqual,
            TokenKind::LessThan if parser.accept(TokenKind::GreaterThan) => Operator::LessGreater,
            TokenKind::LessThan => Operator::Less,
            TokenKind::GreaterThan if parser.accept(TokenKind::Equals) => Operator::GreaterEqual,
            TokenKind::GreaterThan => Operator::Greater,
            TokenKind::Equals if parser.accept(TokenKind::Equals) => Operator::DoubleEqual,
            TokenKind::Equals => Operator::Equal,
            TokenKind::Exclamation if parser.accept(TokenKind::Equals) => Operator::NotEqual,
            TokenKind::Exclamation => {
                parser.report_syntax_error("Invalid token '!' found in expression.");
                Operator::Stray(TokenKind::Exclamation)
            }
            TokenKind::SingleBar if parser.accept(TokenKind::SingleBar) => Operator::Concat,
            TokenKind::SingleBar => {
                parser.report_syntax_error("Invalid token '|' found in expression.");
                Operator::Stray(TokenKind::SingleBar)
            }
            TokenKind::Add => Operator::Add,
            TokenKind::Subtract => Operator::Subtract,
            TokenKind::Multiply => Operator::Multiply,
            TokenKind::Divide => Operator::Divide,
            TokenKind::Power => Operator::Power,
            other => Operator::Stray(other),
        }
    }

    /// Function call, name, or a bare datetime range such as `year to day`.
    fn parse_named_term(parser: &mut Parser, options: &ExpressionParsingOptions) -> ExpressionNode {
        match FunctionCallExpression::try_parse(parser, options, false) {
            Some(CallOrName::Call(call)) => {
                let (start, end) = (call.info.start, call.info.end);
                ExpressionNode::new(start, end, ExpressionKind::Call(call))
            }
            Some(CallOrName::Name(name)) => {
                if name.pieces.is_empty() && name.head.kind.is_datetime_qualifier() {
                    if let ConstraintResult::Constrained(text) =
                        verify_valid_constraint(parser, TokenKind::Datetime, true, true)
                    {
                        return ExpressionNode::new(
                            name.info.start,
                            parser.token().end(),
                            ExpressionKind::Constrained(text),
                        );
                    }
                }
                let (start, end) = (name.info.start, name.info.end);
                ExpressionNode::new(start, end, ExpressionKind::Name(name))
            }
            None => {
                let token = parser.next_token();
                Self::from_token(token)
            }
        }
    }

    /// `interval(...) qualifier [to qualifier]`.
    fn parse_interval(parser: &mut Parser, result: &mut bool) -> ExpressionNode {
        let token = parser.next_token();
        if !parser.accept(TokenKind::LeftParenthesis) {
            return Self::from_token(token);
        }
        let mut raw = Vec::new();
        while !parser.at_eof() {
            let inner = parser.next_token();
            if inner.kind == TokenKind::RightParenthesis {
                break;
            }
            raw.push(inner.value.as_str());
        }
        let literal = format!("interval({})", raw.join(""));
        match verify_valid_constraint(parser, TokenKind::Interval, false, true) {
            ConstraintResult::Constrained(text) => {
                *result = true;
                let qualifier = text.strip_prefix("interval ").unwrap_or(&text);
                ExpressionNode::new(
                    token.start(),
                    parser.token().end(),
                    ExpressionKind::Constrained(format!("{} {}", literal, qualifier)),
                )
            }
            _ => {
                parser.report_syntax_error("Invalid interval expression found.");
                ExpressionNode::new(token.start(), parser.token().end(), ExpressionKind::Constrained(literal))
            }
        }
    }

    fn parse_paren(parser: &mut Parser, options: &ExpressionParsingOptions) -> ExpressionNode {
        let start = parser.next_token().start();
        let mut paren = ParenExpression::default();
        let mut complete = false;
        if options.allow_anything_for_function_params {
            paren.anything = capture_balanced(parser);
            complete = parser.token().kind == TokenKind::RightParenthesis;
        } else {
            match ExpressionNode::try_parse(parser, &[TokenKind::RightParenthesis], options) {
                Some(inner) => paren.inner = Some(Box::new(inner)),
                None => parser.report_syntax_error("Invalid expression found within parentheses."),
            }
            if parser.accept(TokenKind::RightParenthesis) {
                complete = true;
            } else {
                parser.report_syntax_error("Right parenthesis not found.");
            }
        }
        let mut node = ExpressionNode::new(start, parser.token().end(), ExpressionKind::Paren(paren));
        node.info.is_complete = complete;
        node
    }

    fn parse_bracket(parser: &mut Parser, options: &ExpressionParsingOptions) -> ExpressionNode {
        let start = parser.next_token().start();
        let items = parse_list(parser, &[TokenKind::Comma, TokenKind::RightBracket], options);
        let complete = parser.accept(TokenKind::RightBracket);
        if !complete {
            parser.report_syntax_error("Call statement missing right bracket.");
        }
        let mut node = ExpressionNode::new(start, parser.token().end(), ExpressionKind::Bracket(items));
        node.info.is_complete = complete;
        node
    }

    /// The node itself followed by everything appended to it.
    pub fn terms(&self) -> impl Iterator<Item = &ExpressionNode> {
        std::iter::once(self).chain(self.appended.iter())
    }

    /// The name, when the whole expression is one name.
    pub fn as_name(&self) -> Option<&NameExpression> {
        match &self.kind {
            ExpressionKind::Name(name) if self.appended.is_empty() => Some(name),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&FunctionCallExpression> {
        match &self.kind {
            ExpressionKind::Call(call) if self.appended.is_empty() => Some(call),
            _ => None,
        }
    }

    /// Single literal token, e.g. the value of a constant.
    pub fn as_literal(&self) -> Option<&Token> {
        match &self.kind {
            ExpressionKind::Token(token) | ExpressionKind::String(token) if self.appended.is_empty() => Some(token),
            _ => None,
        }
    }

    fn fmt_term(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionKind::Token(token) | ExpressionKind::String(token) => f.write_str(&token.value),
            ExpressionKind::Constrained(text) => f.write_str(text),
            ExpressionKind::Name(name) => write!(f, "{}", name),
            ExpressionKind::Call(call) => write!(f, "{}", call),
            ExpressionKind::Paren(paren) => match &paren.inner {
                Some(inner) => write!(f, "({})", inner),
                None => {
                    let raw: Vec<&str> = paren.anything.iter().map(|t| t.value.as_str()).collect();
                    write!(f, "({})", raw.join(" "))
                }
            },
            ExpressionKind::Bracket(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            ExpressionKind::Select(select) => write!(f, "{}", select),
            ExpressionKind::Operator(op) => f.write_str(op.text()),
        }
    }
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_term(f)?;
        for term in &self.appended {
            f.write_str(" ")?;
            term.fmt_term(f)?;
        }
        Ok(())
    }
}

/// Comma-separated expressions, stopping at the first position that does
/// not start one.
pub(crate) fn parse_list(
    parser: &mut Parser,
    breaks: &[TokenKind],
    options: &ExpressionParsingOptions,
) -> Vec<ExpressionNode> {
    let mut items = Vec::new();
    while let Some(expr) = ExpressionNode::try_parse(parser, breaks, options) {
        items.push(expr);
        if !parser.accept(TokenKind::Comma) {
            break;
        }
    }
    items
}

/// Raw tokens up to the `)` matching an already consumed `(`.
pub(crate) fn capture_balanced(parser: &mut Parser) -> Vec<Token> {
    let mut depth = 1;
    let mut tokens = Vec::new();
    while !parser.at_eof() {
        let token = parser.next_token();
        match token.kind {
            TokenKind::LeftParenthesis => depth += 1,
            TokenKind::RightParenthesis => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
        tokens.push(token.clone());
    }
    tokens
}

pub(crate) fn write_list(f: &mut fmt::Formatter<'_>, items: &[ExpressionNode]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
