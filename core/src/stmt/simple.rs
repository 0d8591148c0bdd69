use crate::{
    ast::{NodeInfo, impl_ast_node},
    expr::{CallOrName, ExpressionNode, FunctionCallExpression, NameExpression, parse_list},
    parser::{ParseContext, Parser},
    stmt::{InputControlBlock, input::parse_control_blocks, parse_names},
    token::{Diagnostic, Span, TokenKind},
    typ::AttributeSpecifier,
};

/// `let target = value [, value ...]`
#[derive(Debug, Clone)]
pub struct LetStatement {
    pub info: NodeInfo,
    pub variable: Option<NameExpression>,
    pub values: Vec<ExpressionNode>,
}

impl LetStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<LetStatement> {
        if !parser.peek_kind(TokenKind::Let) {
            return None;
        }
        let start = parser.next_token().start();
        let options = ctx.expression_options;
        let mut node = LetStatement {
            info: NodeInfo::at(start),
            variable: NameExpression::try_parse(parser, &options),
            values: Vec::new(),
        };
        if node.variable.is_none() {
            parser.report_syntax_error("Assignment statement is missing a variable name.");
        } else if !parser.accept(TokenKind::Equals) {
            parser.report_syntax_error("Assignment statement is missing an assignment operator.");
        } else {
            node.values = parse_list(parser, &[], &options);
            if node.values.is_empty() {
                parser.report_syntax_error("Assignment statement is missing a value.");
            } else {
                node.info.is_complete = true;
            }
        }
        node.info.end = parser.token().end();
        Some(node)
    }
}

/// `call f(args) [returning a, b]`
#[derive(Debug, Clone)]
pub struct CallStatement {
    pub info: NodeInfo,
    pub call: Option<FunctionCallExpression>,
    pub returning: Vec<NameExpression>,
}

impl CallStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<CallStatement> {
        if !parser.peek_kind(TokenKind::Call) {
            return None;
        }
        let start = parser.next_token().start();
        let options = ctx.expression_options;
        let mut node = CallStatement {
            info: NodeInfo::at(start),
            call: None,
            returning: Vec::new(),
        };
        match FunctionCallExpression::try_parse(parser, &options, true) {
            Some(CallOrName::Call(call)) => {
                node.info.is_complete = call.info.is_complete;
                node.call = Some(call);
            }
            Some(CallOrName::Name(_)) | None => parser.report_syntax_error("Call statement must specify a function name."),
        }
        if parser.accept(TokenKind::Returning) {
            node.returning = parse_names(parser, &options);
            if node.returning.is_empty() {
                parser.report_syntax_error("Call statement missing returning variables.");
                node.info.is_complete = false;
            }
        }
        node.info.end = parser.token().end();
        Some(node)
    }
}

/// `return [value, ...]`
#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub info: NodeInfo,
    pub values: Vec<ExpressionNode>,
}

impl ReturnStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<ReturnStatement> {
        if !parser.peek_kind(TokenKind::Return) {
            return None;
        }
        let start = parser.next_token().start();
        let options = ctx.expression_options;
        let values = parse_list(parser, &[], &options);
        let mut info = NodeInfo::spanning(start, parser.token().end());
        if let Some(scope) = ctx.function.as_mut() {
            if let Err(message) = scope.bind_return(values.len(), info.span()) {
                parser.report(Diagnostic::syntax(message, info.span()));
                info.is_complete = false;
            }
        }
        Some(ReturnStatement { info, values })
    }
}

/// `display values [to fields] [at row, col] [attribute(...)]`,
/// `display by name ...` and `display array a to s.* ... [end display]`.
#[derive(Debug, Clone)]
pub struct DisplayStatement {
    pub info: NodeInfo,
    pub by_name: bool,
    pub is_array: bool,
    pub values: Vec<ExpressionNode>,
    pub fields: Vec<NameExpression>,
    pub position: Vec<ExpressionNode>,
    pub attribute: Option<AttributeSpecifier>,
    pub control_blocks: Vec<InputControlBlock>,
}

impl DisplayStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<DisplayStatement> {
        if !parser.peek_kind(TokenKind::Display) {
            return None;
        }
        let start = parser.next_token().start();
        let options = ctx.expression_options;
        let mut node = DisplayStatement {
            info: NodeInfo::at(start),
            by_name: false,
            is_array: false,
            values: Vec::new(),
            fields: Vec::new(),
            position: Vec::new(),
            attribute: None,
            control_blocks: Vec::new(),
        };

        if parser.peek_kind(TokenKind::By) && parser.peek_kind_n(TokenKind::Name, 2) {
            parser.next_token();
            parser.next_token();
            node.by_name = true;
        } else if parser.accept(TokenKind::Array) {
            node.is_array = true;
        }

        node.values = parse_list(parser, &[], &options);
        if node.values.is_empty() {
            parser.report_syntax_error("Display statement missing values to display.");
        }
        if parser.accept(TokenKind::To) {
            node.fields = parse_names(parser, &options.with_star_param());
            if node.fields.is_empty() {
                parser.report_syntax_error("Display statement missing field list.");
            }
        }
        if parser.accept(TokenKind::At) {
            node.position = parse_list(parser, &[], &options);
            if node.position.len() != 2 {
                parser.report_syntax_error("Display position requires a row and a column.");
            }
        }
        node.attribute = AttributeSpecifier::try_parse(parser);
        node.info.decorator_end = Some(parser.token().end());

        if node.is_array {
            if parser.peek_any(&[TokenKind::Before, TokenKind::After, TokenKind::On]) {
                let mark = ctx.push_block(TokenKind::Display, Some(TokenKind::Display), None);
                node.control_blocks = parse_control_blocks(parser, ctx, true);
                ctx.pop_block(mark);
                if parser.peek_end(TokenKind::Display) {
                    parser.next_token();
                    parser.next_token();
                } else {
                    parser.report_syntax_error("A display array block must be terminated with \"end display\".");
                    node.info.end = parser.token().end();
                    return Some(node);
                }
            } else if parser.peek_end(TokenKind::Display) {
                parser.next_token();
                parser.next_token();
            }
        }
        node.info.is_complete = !node.values.is_empty();
        node.info.end = parser.token().end();
        Some(node)
    }
}

/// `message ...` / `error ...`
#[derive(Debug, Clone)]
pub struct MessageStatement {
    pub info: NodeInfo,
    pub is_error: bool,
    pub values: Vec<ExpressionNode>,
    pub attribute: Option<AttributeSpecifier>,
}

impl MessageStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<MessageStatement> {
        if !parser.peek_any(&[TokenKind::Message, TokenKind::Error]) {
            return None;
        }
        let keyword = parser.next_token();
        let options = ctx.expression_options;
        let mut node = MessageStatement {
            info: NodeInfo::at(keyword.start()),
            is_error: keyword.kind == TokenKind::Error,
            values: parse_list(parser, &[], &options),
            attribute: None,
        };
        if node.values.is_empty() {
            parser.report_syntax_error(format!("{} statement missing text to display.", keyword.kind));
        }
        node.attribute = AttributeSpecifier::try_parse(parser);
        node.info.is_complete = !node.values.is_empty();
        node.info.end = parser.token().end();
        Some(node)
    }
}

/// `sleep seconds`
#[derive(Debug, Clone)]
pub struct SleepStatement {
    pub info: NodeInfo,
    pub seconds: Option<ExpressionNode>,
}

impl SleepStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<SleepStatement> {
        if !parser.peek_kind(TokenKind::Sleep) {
            return None;
        }
        let start = parser.next_token().start();
        let options = ctx.expression_options;
        let seconds = ExpressionNode::try_parse(parser, &[], &options);
        if seconds.is_none() {
            parser.report_syntax_error("Sleep statement requires a number of seconds.");
        }
        let mut info = NodeInfo::spanning(start, parser.token().end());
        info.is_complete = seconds.is_some();
        Some(SleepStatement { info, seconds })
    }
}

/// `initialize a, b to null` / `initialize r.* like table.*`
#[derive(Debug, Clone)]
pub struct InitializeStatement {
    pub info: NodeInfo,
    pub targets: Vec<NameExpression>,
    pub to_null: bool,
    pub like: Vec<NameExpression>,
}

impl InitializeStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<InitializeStatement> {
        if !parser.peek_kind(TokenKind::Initialize) {
            return None;
        }
        let start = parser.next_token().start();
        let options = ctx.expression_options;
        let mut node = InitializeStatement {
            info: NodeInfo::at(start),
            targets: parse_names(parser, &options),
            to_null: false,
            like: Vec::new(),
        };
        if node.targets.is_empty() {
            parser.report_syntax_error("Initialize statement missing variable list.");
        }
        if parser.peek_kind(TokenKind::To) && parser.peek_kind_n(TokenKind::Null, 2) {
            parser.next_token();
            parser.next_token();
            node.to_null = true;
        } else if parser.accept(TokenKind::Like) {
            node.like = parse_names(parser, &options);
            if node.like.is_empty() {
                parser.report_syntax_error("Initialize statement missing table column list.");
            }
        } else {
            parser.report_syntax_error("Initialize statement requires \"to null\" or a \"like\" clause.");
        }
        node.info.is_complete = !node.targets.is_empty() && (node.to_null || !node.like.is_empty());
        node.info.end = parser.token().end();
        Some(node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheneverCondition {
    Error,
    AnyError,
    SqlError,
    NotFound,
    Warning,
}

/// `whenever <condition> <action>`
#[derive(Debug, Clone)]
pub struct WheneverStatement {
    pub info: NodeInfo,
    pub condition: Option<WheneverCondition>,
    /// Action text as written, e.g. `call log_error` or `continue`.
    pub action: String,
}

impl WheneverStatement {
    pub fn try_parse(parser: &mut Parser) -> Option<WheneverStatement> {
        if !parser.peek_kind(TokenKind::Whenever) {
            return None;
        }
        let start = parser.next_token().start();
        let mut node = WheneverStatement {
            info: NodeInfo::at(start),
            condition: None,
            action: String::new(),
        };

        node.condition = match parser.peek().kind {
            TokenKind::Error => Some(WheneverCondition::Error),
            TokenKind::SqlError => Some(WheneverCondition::SqlError),
            TokenKind::Warning => Some(WheneverCondition::Warning),
            TokenKind::Any if parser.peek_kind_n(TokenKind::Error, 2) => {
                parser.next_token();
                Some(WheneverCondition::AnyError)
            }
            TokenKind::Not if parser.peek_kind_n(TokenKind::Found, 2) => {
                parser.next_token();
                Some(WheneverCondition::NotFound)
            }
            _ => None,
        };
        if node.condition.is_some() {
            parser.next_token();
        } else {
            parser.report_syntax_error("Invalid whenever condition found.");
        }

        let action = parser.peek();
        match action.kind {
            TokenKind::Continue | TokenKind::Stop | TokenKind::Raise => {
                node.action = parser.next_token().value.to_ascii_lowercase();
            }
            TokenKind::Call if parser.peek_n(2).is_name_like() => {
                parser.next_token();
                let target = parser.next_token();
                node.action = format!("call {}", target.value);
            }
            _ if action.value.eq_ignore_ascii_case("goto") && parser.peek_n(2).is_name_like() => {
                parser.next_token();
                let label = parser.next_token();
                node.action = format!("goto {}", label.value);
            }
            _ => {
                let at = parser.token().end();
                parser.report(Diagnostic::syntax("Invalid whenever action found.", Span::empty(at)));
            }
        }
        node.info.is_complete = node.condition.is_some() && !node.action.is_empty();
        node.info.end = parser.token().end();
        Some(node)
    }
}

impl_ast_node!(
    LetStatement,
    CallStatement,
    ReturnStatement,
    DisplayStatement,
    MessageStatement,
    SleepStatement,
    InitializeStatement,
    WheneverStatement,
);
