use crate::{
    ast::{NodeInfo, impl_ast_node},
    expr::{ExpressionNode, NameExpression},
    parser::{ExpressionParsingOptions, ParseContext, Parser},
    stmt::{Statement, at_block_boundary, parse_names},
    token::TokenKind,
};

const DISPLAY_ATTRIBUTES: &[TokenKind] = &[
    TokenKind::Black,
    TokenKind::Blue,
    TokenKind::Cyan,
    TokenKind::Green,
    TokenKind::Magenta,
    TokenKind::Red,
    TokenKind::White,
    TokenKind::Yellow,
    TokenKind::Bold,
    TokenKind::Dim,
    TokenKind::Invisible,
    TokenKind::Normal,
    TokenKind::Reverse,
    TokenKind::Blink,
    TokenKind::Underline,
];

/// `input [by name | array arr] vars [without defaults] from fields
/// [attributes(...)] [help n] <control blocks> end input`
#[derive(Debug, Clone)]
pub struct InputBlock {
    pub info: NodeInfo,
    pub is_array: bool,
    pub is_implicit_mapping: bool,
    pub array_name: Option<NameExpression>,
    pub without_defaults: bool,
    pub variables: Vec<NameExpression>,
    pub fields: Vec<NameExpression>,
    pub attributes: Vec<InputAttribute>,
    pub help_number: Option<ExpressionNode>,
    pub control_blocks: Vec<InputControlBlock>,
}

impl InputBlock {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<InputBlock> {
        if !parser.peek_kind(TokenKind::Input) {
            return None;
        }
        let start = parser.next_token().start();
        let options = ctx.expression_options;
        let mut node = InputBlock {
            info: NodeInfo::at(start),
            is_array: false,
            is_implicit_mapping: false,
            array_name: None,
            without_defaults: false,
            variables: Vec::new(),
            fields: Vec::new(),
            attributes: Vec::new(),
            help_number: None,
            control_blocks: Vec::new(),
        };

        if parser.accept(TokenKind::By) {
            if parser.accept(TokenKind::Name) {
                node.is_implicit_mapping = true;
            } else {
                parser.report_syntax_error("Expected \"name\" token in input statement.");
            }
        } else if parser.accept(TokenKind::Array) {
            node.is_array = true;
            node.array_name = NameExpression::try_parse(parser, &options);
            if node.array_name.is_none() {
                parser.report_syntax_error("Invalid array name found in input statement.");
            }
        }
        node.info.decorator_end = Some(parser.token().end());

        if !node.is_array {
            node.variables = parse_names(parser, &options);
        }
        if parser.accept(TokenKind::Without) {
            if parser.accept(TokenKind::Defaults) {
                node.without_defaults = true;
            } else {
                parser.report_syntax_error("Expected \"defaults\" token in input statement.");
            }
        }
        if !node.is_implicit_mapping || node.is_array {
            if parser.accept(TokenKind::From) {
                if node.is_array {
                    node.fields.extend(NameExpression::try_parse(parser, &options));
                } else {
                    node.fields = parse_names(parser, &options);
                }
            } else {
                parser.report_syntax_error("Expected \"from\" token in input statement.");
            }
        }
        if parser.accept(TokenKind::Attributes) || parser.accept(TokenKind::Attribute) {
            if parser.accept(TokenKind::LeftParenthesis) {
                while let Some(attribute) = InputAttribute::try_parse(parser, &options, node.is_array) {
                    node.attributes.push(attribute);
                    if !parser.accept(TokenKind::Comma) {
                        break;
                    }
                }
                if !parser.accept(TokenKind::RightParenthesis) {
                    parser.report_syntax_error("Expecting right-paren in input attributes section.");
                }
            } else {
                parser.report_syntax_error("Expecting left-paren in input attributes section.");
            }
        }
        if parser.accept(TokenKind::Help) {
            node.help_number = ExpressionNode::try_parse(parser, &[], &options);
            if node.help_number.is_none() {
                parser.report_syntax_error("Invalid help-number found in input statement.");
            }
        }

        let mark = ctx.push_block(TokenKind::Input, Some(TokenKind::Input), Some(TokenKind::Input));
        node.control_blocks = parse_control_blocks(parser, ctx, node.is_array);
        ctx.pop_block(mark);

        if parser.peek_end(TokenKind::Input) {
            parser.next_token();
            parser.next_token();
            node.info.is_complete = true;
        } else {
            parser.report_syntax_error("A input block must be terminated with \"end input\".");
        }
        node.info.end = parser.token().end();
        Some(node)
    }
}

/// Control blocks of an input or display array dialog, up to the
/// dialog's terminator.
pub(crate) fn parse_control_blocks(parser: &mut Parser, ctx: &mut ParseContext, is_array: bool) -> Vec<InputControlBlock> {
    let mut blocks = Vec::new();
    while !at_block_boundary(parser, ctx, &[]) {
        let before = parser.position();
        match InputControlBlock::try_parse(parser, ctx, is_array) {
            Some(block) => blocks.push(block),
            None if parser.position() == before => {
                parser.next_token();
            }
            None => {}
        }
    }
    blocks
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputControlKind {
    /// Statements before the first trigger.
    None,
    Field,
    Input,
    Delete,
    Row,
    Change,
    Idle,
    Action,
    Key,
    Insert,
}

/// `before field f`, `on action save`, `on key (f1)`, ... with its body.
#[derive(Debug, Clone)]
pub struct InputControlBlock {
    pub info: NodeInfo,
    pub kind: InputControlKind,
    pub field_specs: Vec<NameExpression>,
    pub key_names: Vec<NameExpression>,
    pub idle_seconds: Option<ExpressionNode>,
    pub action_name: Option<NameExpression>,
    pub action_field: Option<NameExpression>,
    pub body: Vec<Statement>,
}

impl InputControlBlock {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext, is_array: bool) -> Option<InputControlBlock> {
        let options = ctx.expression_options;
        let mut node = InputControlBlock {
            info: NodeInfo::at(parser.peek().start()),
            kind: InputControlKind::None,
            field_specs: Vec::new(),
            key_names: Vec::new(),
            idle_seconds: None,
            action_name: None,
            action_field: None,
            body: Vec::new(),
        };

        match parser.peek().kind {
            TokenKind::Before | TokenKind::After => {
                parser.next_token();
                let next = parser.peek().kind;
                node.kind = match next {
                    TokenKind::Field => InputControlKind::Field,
                    TokenKind::Input => InputControlKind::Input,
                    TokenKind::Delete if is_array => InputControlKind::Delete,
                    TokenKind::Row if is_array => InputControlKind::Row,
                    TokenKind::Insert if is_array => InputControlKind::Insert,
                    _ => {
                        parser.report_syntax_error("Unexpected token found in input control block.");
                        return None;
                    }
                };
                parser.next_token();
                if node.kind == InputControlKind::Field {
                    node.field_specs = parse_names(parser, &options);
                }
            }
            TokenKind::On => {
                parser.next_token();
                match parser.peek().kind {
                    TokenKind::Change => {
                        parser.next_token();
                        node.kind = InputControlKind::Change;
                        node.field_specs = parse_names(parser, &options);
                    }
                    TokenKind::Idle => {
                        parser.next_token();
                        node.kind = InputControlKind::Idle;
                        node.idle_seconds = ExpressionNode::try_parse(parser, &[], &options);
                        if node.idle_seconds.is_none() {
                            parser.report_syntax_error("Invalid idle-seconds found in input statement.");
                        }
                    }
                    TokenKind::Action => {
                        parser.next_token();
                        node.kind = InputControlKind::Action;
                        node.action_name = NameExpression::try_parse(parser, &options);
                        if node.action_name.is_none() {
                            parser.report_syntax_error("Invalid action-name found in input statement.");
                        }
                        if parser.accept(TokenKind::Infield) {
                            node.action_field = NameExpression::try_parse(parser, &options);
                            if node.action_field.is_none() {
                                parser.report_syntax_error("Invalid field-spec found in input statement.");
                            }
                        }
                    }
                    TokenKind::Key => {
                        parser.next_token();
                        node.kind = InputControlKind::Key;
                        if parser.accept(TokenKind::LeftParenthesis) {
                            node.key_names = parse_names(parser, &options);
                            if !parser.accept(TokenKind::RightParenthesis) {
                                parser.report_syntax_error("Expected right-paren in input control block.");
                            }
                        } else {
                            parser.report_syntax_error("Expected left-paren in input control block.");
                        }
                    }
                    TokenKind::Row if is_array => {
                        parser.next_token();
                        node.kind = InputControlKind::Row;
                        if !parser.accept(TokenKind::Change) {
                            parser.report_syntax_error("Expected \"change\" keyword in input statement.");
                        }
                    }
                    TokenKind::Row => {
                        parser.report_syntax_error("\"on row\" syntax is only allowed in input array statement.")
                    }
                    _ => parser.report_syntax_error("Unexpected token found in input control block."),
                }
            }
            _ => {}
        }
        node.info.decorator_end = Some(parser.token().end());

        loop {
            if at_block_boundary(parser, ctx, &[]) {
                break;
            }
            if let Some(statement) = InputDialogStatement::try_parse(parser, &options, is_array) {
                node.body.push(Statement::InputDialog(statement));
            } else if let Some(statement) = Statement::try_parse(parser, ctx) {
                node.body.push(statement);
            } else {
                break;
            }
        }

        if node.kind == InputControlKind::None && node.body.is_empty() {
            return None;
        }
        node.info.end = parser.token().end();
        node.info.is_complete = true;
        Some(node)
    }
}

/// `accept input`, `next field f`, `cancel insert`, ...
#[derive(Debug, Clone)]
pub struct InputDialogStatement {
    pub info: NodeInfo,
    pub keyword: TokenKind,
    pub field_spec: Option<NameExpression>,
}

impl InputDialogStatement {
    pub fn try_parse(
        parser: &mut Parser,
        options: &ExpressionParsingOptions,
        is_array: bool,
    ) -> Option<InputDialogStatement> {
        let keyword = parser.peek().kind;
        let start = parser.peek().start();
        let mut field_spec = None;
        match keyword {
            // `exit input` / `continue input` are ordinary exit/continue
            // statements checked against the enclosing blocks.
            TokenKind::Accept if parser.peek_kind_n(TokenKind::Input, 2) => {
                parser.next_token();
                parser.next_token();
            }
            TokenKind::Next => {
                parser.next_token();
                if parser.accept(TokenKind::Field) {
                    if !(parser.accept(TokenKind::Current)
                        || parser.accept(TokenKind::Next)
                        || parser.accept(TokenKind::Previous))
                    {
                        field_spec = NameExpression::try_parse(parser, options);
                        if field_spec.is_none() {
                            parser.report_syntax_error("Invalid field-spec found in input statement.");
                        }
                    }
                } else {
                    parser.report_syntax_error("Expecting \"field\" keyword in input statement.");
                }
            }
            TokenKind::Cancel => {
                parser.next_token();
                if !is_array {
                    parser.report_syntax_error("Keyword \"cancel\" can only exist in an input array statement.");
                } else if !(parser.accept(TokenKind::Delete) || parser.accept(TokenKind::Insert)) {
                    parser.report_syntax_error("Expected \"delete\" or \"insert\" keyword in input statement.");
                }
            }
            _ => return None,
        }
        Some(InputDialogStatement {
            info: NodeInfo::spanning(start, parser.token().end()),
            keyword,
            field_spec,
        })
    }
}

/// One entry of an input `attributes(...)` list.
#[derive(Debug, Clone)]
pub struct InputAttribute {
    pub info: NodeInfo,
    /// Attribute keywords as written, e.g. `without defaults`.
    pub name: String,
    pub value: Option<ExpressionNode>,
}

impl InputAttribute {
    pub fn try_parse(
        parser: &mut Parser,
        options: &ExpressionParsingOptions,
        is_array: bool,
    ) -> Option<InputAttribute> {
        let first = parser.peek();
        let mut words = vec![first.kind.text()];
        let mut value = None;

        // Optional `= expr` tail; `message` is reported when the value is missing.
        let optional_value = |parser: &mut Parser, value: &mut Option<ExpressionNode>, message: &str| {
            if parser.accept(TokenKind::Equals) {
                *value = ExpressionNode::try_parse(parser, &[TokenKind::Comma], options);
                if value.is_none() {
                    parser.report_syntax_error(message);
                }
            }
        };

        match first.kind {
            kind if DISPLAY_ATTRIBUTES.contains(&kind) => {
                parser.next_token();
            }
            TokenKind::Accept | TokenKind::Cancel | TokenKind::Unbuffered => {
                parser.next_token();
                optional_value(parser, &mut value, "Invalid boolean expression found in input attribute.");
            }
            TokenKind::Count | TokenKind::MaxCount => {
                if !is_array {
                    parser.report_syntax_error("Attribute can only be used for an input array statement.");
                    return None;
                }
                parser.next_token();
                if parser.peek_kind(TokenKind::Equals) {
                    optional_value(parser, &mut value, "Invalid expression found in input attribute.");
                } else {
                    parser.report_syntax_error("Expected integer expression in input array attribute.");
                }
            }
            TokenKind::Without => {
                parser.next_token();
                if parser.accept(TokenKind::Defaults) {
                    words.push(TokenKind::Defaults.text());
                } else {
                    parser.report_syntax_error("Expected \"defaults\" keyword in input attribute.");
                }
                optional_value(parser, &mut value, "Invalid boolean expression found in input attribute.");
            }
            TokenKind::Help | TokenKind::Name => {
                if first.kind == TokenKind::Name && is_array {
                    parser.report_syntax_error(
                        "The name attribute can only be used for an input statement (not an input array statement).",
                    );
                    return None;
                }
                parser.next_token();
                if !parser.accept(TokenKind::Equals) {
                    parser.report_syntax_error("Expected equals token in input attribute.");
                }
                value = ExpressionNode::try_parse(parser, &[TokenKind::Comma], options);
                if value.is_none() {
                    parser.report_syntax_error(if first.kind == TokenKind::Help {
                        "Invalid help-number found in input attribute."
                    } else {
                        "Invalid dialog name found in input attribute."
                    });
                }
            }
            TokenKind::Field => {
                parser.next_token();
                if parser.accept(TokenKind::Order) {
                    words.push(TokenKind::Order.text());
                } else {
                    parser.report_syntax_error("Expected \"order\" keyword in input attribute.");
                }
                if parser.accept(TokenKind::Form) {
                    words.push(TokenKind::Form.text());
                } else {
                    parser.report_syntax_error("Expected \"form\" keyword in input attribute.");
                }
            }
            TokenKind::Append | TokenKind::Delete | TokenKind::Insert => {
                parser.next_token();
                if parser.accept(TokenKind::Row) {
                    words.push(TokenKind::Row.text());
                    optional_value(parser, &mut value, "Invalid boolean expression found in input array attribute.");
                } else {
                    parser.report_syntax_error("Expected \"row\" keyword in input array attribute.");
                }
            }
            TokenKind::Keep => {
                parser.next_token();
                if parser.accept(TokenKind::Current) {
                    words.push(TokenKind::Current.text());
                    if parser.accept(TokenKind::Row) {
                        words.push(TokenKind::Row.text());
                        optional_value(parser, &mut value, "Invalid boolean expression found in input array attribute.");
                    } else {
                        parser.report_syntax_error("Expected \"row\" keyword in input array attribute.");
                    }
                } else {
                    parser.report_syntax_error("Expected \"current\" keyword in input array attribute.");
                }
            }
            TokenKind::Auto => {
                parser.next_token();
                if parser.accept(TokenKind::Append) {
                    words.push(TokenKind::Append.text());
                    optional_value(parser, &mut value, "Invalid boolean expression found in input array attribute.");
                } else {
                    parser.report_syntax_error("Expected \"append\" keyword in input array attribute.");
                }
            }
            _ => return None,
        }

        Some(InputAttribute {
            info: NodeInfo::spanning(first.start(), parser.token().end()),
            name: words.join(" "),
            value,
        })
    }
}

impl_ast_node!(InputBlock, InputControlBlock, InputDialogStatement, InputAttribute);
