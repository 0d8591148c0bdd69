use crate::{
    ast::{NodeInfo, impl_ast_node},
    expr::{ExpressionNode, NameExpression},
    parser::{ParseContext, Parser},
    stmt::{Statement, at_block_boundary, finish_block, parse_block, parse_names},
    token::{TokenCategory, TokenKind},
};

const EXIT_KINDS: &[TokenKind] = &[
    TokenKind::For,
    TokenKind::Foreach,
    TokenKind::While,
    TokenKind::Menu,
    TokenKind::Construct,
    TokenKind::Report,
    TokenKind::Display,
    TokenKind::Input,
    TokenKind::Dialog,
    TokenKind::Case,
    TokenKind::Program,
];

const CONTINUE_KINDS: &[TokenKind] = &[
    TokenKind::For,
    TokenKind::Foreach,
    TokenKind::While,
    TokenKind::Menu,
    TokenKind::Construct,
    TokenKind::Input,
    TokenKind::Dialog,
];

/// Blocks whose nesting is tracked while parsing. Exits and continues
/// naming any other block kind are accepted as written.
const TRACKED_BLOCKS: &[TokenKind] = &[
    TokenKind::For,
    TokenKind::Foreach,
    TokenKind::While,
    TokenKind::Case,
    TokenKind::Input,
];

fn describe_block(kind: TokenKind) -> String {
    match kind {
        TokenKind::For | TokenKind::Foreach | TokenKind::While => format!("{} loop", kind),
        TokenKind::Case => "case statement".to_string(),
        _ => format!("{} block", kind),
    }
}

/// `if cond then ... [else ...] end if`
#[derive(Debug, Clone)]
pub struct IfStatement {
    pub info: NodeInfo,
    pub condition: Option<ExpressionNode>,
    pub body: Vec<Statement>,
    pub else_block: Option<ElseBlock>,
}

#[derive(Debug, Clone)]
pub struct ElseBlock {
    pub info: NodeInfo,
    pub body: Vec<Statement>,
}

impl IfStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<IfStatement> {
        if !parser.peek_kind(TokenKind::If) {
            return None;
        }
        let start = parser.next_token().start();
        let mut node = IfStatement {
            info: NodeInfo::at(start),
            condition: None,
            body: Vec::new(),
            else_block: None,
        };

        let options = ctx.expression_options;
        node.condition = ExpressionNode::try_parse(parser, &[], &options);
        if node.condition.is_none() {
            parser.report_syntax_error("An if statement must have a condition expression.");
        }
        if !parser.accept(TokenKind::Then) {
            parser.report_syntax_error("An if statement must have a \"then\" keyword prior to containing code.");
        }
        node.info.decorator_end = Some(parser.token().end());

        let mark = ctx.push_block(TokenKind::If, None, None);
        node.body = parse_block(parser, ctx, &[TokenKind::Else]);
        if parser.peek_kind(TokenKind::Else) {
            let else_start = parser.next_token().start();
            let mut info = NodeInfo::at(else_start);
            info.decorator_end = Some(parser.token().end());
            let body = parse_block(parser, ctx, &[]);
            info.end = parser.token().end();
            info.is_complete = true;
            node.else_block = Some(ElseBlock { info, body });
        }
        ctx.pop_block(mark);

        finish_block(parser, &mut node.info, TokenKind::If, "An if statement must be terminated with \"end if\".");
        Some(node)
    }
}

/// `for i = a to b [step n] ... end for`
#[derive(Debug, Clone)]
pub struct ForStatement {
    pub info: NodeInfo,
    pub counter: Option<NameExpression>,
    pub start_value: Option<ExpressionNode>,
    pub end_value: Option<ExpressionNode>,
    pub step_value: i64,
    pub body: Vec<Statement>,
}

impl ForStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<ForStatement> {
        if !parser.peek_kind(TokenKind::For) {
            return None;
        }
        let start = parser.next_token().start();
        let mut node = ForStatement {
            info: NodeInfo::at(start),
            counter: None,
            start_value: None,
            end_value: None,
            step_value: 1,
            body: Vec::new(),
        };
        let options = ctx.expression_options;

        node.counter = NameExpression::try_parse(parser, &options);
        if node.counter.is_none() {
            parser.report_syntax_error("Invalid counter variable found in for statement.");
        }
        if parser.accept(TokenKind::Equals) {
            node.start_value = ExpressionNode::try_parse(parser, &[], &options);
            if node.start_value.is_none() {
                parser.report_syntax_error("Invalid start value found in for statement.");
            }
        } else {
            parser.report_syntax_error("For statement missing counter assignment.");
        }
        if parser.accept(TokenKind::To) {
            node.end_value = ExpressionNode::try_parse(parser, &[], &options);
            if node.end_value.is_none() {
                parser.report_syntax_error("Invalid end value found in for statement.");
            }
        } else {
            parser.report_syntax_error("For statement missing \"to\" keyword.");
        }
        if parser.accept(TokenKind::Step) {
            let negative = parser.accept(TokenKind::Subtract);
            let step = if parser.peek_category(TokenCategory::NumericLiteral) {
                parser.next_token().value.parse::<i64>().ok()
            } else {
                None
            };
            match step {
                Some(step) => node.step_value = if negative { -step } else { step },
                None => parser.report_syntax_error("Invalid step value found."),
            }
        }
        node.info.decorator_end = Some(parser.token().end());

        let mark = ctx.push_block(TokenKind::For, Some(TokenKind::For), Some(TokenKind::For));
        node.body = parse_block(parser, ctx, &[]);
        ctx.pop_block(mark);

        finish_block(parser, &mut node.info, TokenKind::For, "A for statement must be terminated with \"end for\".");
        Some(node)
    }
}

/// `foreach cursor [using ...] [into ...] [with reoptimization] ... end foreach`
#[derive(Debug, Clone)]
pub struct ForeachStatement {
    pub info: NodeInfo,
    pub cursor: Option<NameExpression>,
    pub using: Vec<NameExpression>,
    pub into: Vec<NameExpression>,
    pub with_reoptimization: bool,
    pub body: Vec<Statement>,
}

impl ForeachStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<ForeachStatement> {
        if !parser.peek_kind(TokenKind::Foreach) {
            return None;
        }
        let start = parser.next_token().start();
        let mut node = ForeachStatement {
            info: NodeInfo::at(start),
            cursor: None,
            using: Vec::new(),
            into: Vec::new(),
            with_reoptimization: false,
            body: Vec::new(),
        };
        let options = ctx.expression_options;

        node.cursor = NameExpression::try_parse(parser, &options);
        if node.cursor.is_none() {
            parser.report_syntax_error("Invalid declared cursor id found in foreach statement.");
        }
        if parser.accept(TokenKind::Using) {
            node.using = parse_names(parser, &options);
            if node.using.is_empty() {
                parser.report_syntax_error("Foreach statement missing input variables.");
            }
        }
        if parser.accept(TokenKind::Into) {
            node.into = parse_names(parser, &options);
            if node.into.is_empty() {
                parser.report_syntax_error("Foreach statement missing output variables.");
            }
        }
        if parser.peek_kind(TokenKind::With) && parser.peek_kind_n(TokenKind::Reoptimization, 2) {
            parser.next_token();
            parser.next_token();
            node.with_reoptimization = true;
        }
        node.info.decorator_end = Some(parser.token().end());

        let mark = ctx.push_block(TokenKind::Foreach, Some(TokenKind::Foreach), Some(TokenKind::Foreach));
        node.body = parse_block(parser, ctx, &[]);
        ctx.pop_block(mark);

        finish_block(
            parser,
            &mut node.info,
            TokenKind::Foreach,
            "A foreach statement must be terminated with \"end foreach\".",
        );
        Some(node)
    }

    pub fn cursor_name(&self) -> Option<String> {
        self.cursor.as_ref().map(NameExpression::dotted)
    }
}

/// `while cond ... end while`
#[derive(Debug, Clone)]
pub struct WhileStatement {
    pub info: NodeInfo,
    pub condition: Option<ExpressionNode>,
    pub body: Vec<Statement>,
}

impl WhileStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<WhileStatement> {
        if !parser.peek_kind(TokenKind::While) {
            return None;
        }
        let start = parser.next_token().start();
        let options = ctx.expression_options;
        let mut node = WhileStatement {
            info: NodeInfo::at(start),
            condition: ExpressionNode::try_parse(parser, &[], &options),
            body: Vec::new(),
        };
        if node.condition.is_none() {
            parser.report_syntax_error("A while statement must have a condition expression.");
        }
        node.info.decorator_end = Some(parser.token().end());

        let mark = ctx.push_block(TokenKind::While, Some(TokenKind::While), Some(TokenKind::While));
        node.body = parse_block(parser, ctx, &[]);
        ctx.pop_block(mark);

        finish_block(
            parser,
            &mut node.info,
            TokenKind::While,
            "A while statement must be terminated with \"end while\".",
        );
        Some(node)
    }
}

/// `case [selector] when ... [otherwise ...] end case`
#[derive(Debug, Clone)]
pub struct CaseStatement {
    pub info: NodeInfo,
    pub selector: Option<ExpressionNode>,
    pub whens: Vec<WhenBlock>,
    pub otherwise: Option<OtherwiseBlock>,
}

#[derive(Debug, Clone)]
pub struct WhenBlock {
    pub info: NodeInfo,
    pub condition: Option<ExpressionNode>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct OtherwiseBlock {
    pub info: NodeInfo,
    pub body: Vec<Statement>,
}

impl CaseStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<CaseStatement> {
        if !parser.peek_kind(TokenKind::Case) {
            return None;
        }
        let start = parser.next_token().start();
        let options = ctx.expression_options;
        let mut node = CaseStatement {
            info: NodeInfo::at(start),
            selector: None,
            whens: Vec::new(),
            otherwise: None,
        };
        if !parser.peek_kind(TokenKind::When) {
            node.selector = ExpressionNode::try_parse(parser, &[], &options);
        }
        node.info.decorator_end = Some(parser.token().end());

        let clause_stops = [TokenKind::When, TokenKind::Otherwise];
        let mut reported_stray = false;
        let mark = ctx.push_block(TokenKind::Case, Some(TokenKind::Case), None);
        loop {
            if parser.peek_kind(TokenKind::When) {
                let when_start = parser.next_token().start();
                let mut info = NodeInfo::at(when_start);
                let condition = ExpressionNode::try_parse(parser, &[], &options);
                if condition.is_none() {
                    parser.report_syntax_error("A when clause must have a condition expression.");
                }
                info.decorator_end = Some(parser.token().end());
                let body = parse_block(parser, ctx, &clause_stops);
                info.end = parser.token().end();
                info.is_complete = condition.is_some();
                node.whens.push(WhenBlock { info, condition, body });
            } else if parser.peek_kind(TokenKind::Otherwise) {
                let otherwise_start = parser.next_token().start();
                let mut info = NodeInfo::at(otherwise_start);
                info.decorator_end = Some(parser.token().end());
                let body = parse_block(parser, ctx, &clause_stops);
                info.end = parser.token().end();
                info.is_complete = true;
                if node.otherwise.is_some() {
                    parser.report_syntax_error_at(
                        "Case statement has more than one otherwise clause.",
                        otherwise_start,
                        otherwise_start + TokenKind::Otherwise.text().len(),
                        crate::token::Severity::Error,
                    );
                }
                node.otherwise = Some(OtherwiseBlock { info, body });
            } else if at_block_boundary(parser, ctx, &[]) {
                break;
            } else {
                if !reported_stray {
                    let token = parser.peek();
                    parser.report_syntax_error_at(
                        "Case statement expects a \"when\" or \"otherwise\" clause.",
                        token.start(),
                        token.end(),
                        crate::token::Severity::Error,
                    );
                    reported_stray = true;
                }
                parser.next_token();
            }
        }
        ctx.pop_block(mark);

        finish_block(parser, &mut node.info, TokenKind::Case, "A case statement must be terminated with \"end case\".");
        Some(node)
    }
}

/// `try ... [catch ...] end try`
#[derive(Debug, Clone)]
pub struct TryCatchStatement {
    pub info: NodeInfo,
    pub body: Vec<Statement>,
    pub catch_block: Option<CatchBlock>,
}

#[derive(Debug, Clone)]
pub struct CatchBlock {
    pub info: NodeInfo,
    pub body: Vec<Statement>,
}

impl TryCatchStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<TryCatchStatement> {
        if !parser.peek_kind(TokenKind::Try) {
            return None;
        }
        let start = parser.next_token().start();
        let mut node = TryCatchStatement {
            info: NodeInfo::at(start),
            body: Vec::new(),
            catch_block: None,
        };
        node.info.decorator_end = Some(parser.token().end());

        let mark = ctx.push_block(TokenKind::Try, None, None);
        node.body = parse_block(parser, ctx, &[TokenKind::Catch]);
        if parser.peek_kind(TokenKind::Catch) {
            let catch_start = parser.next_token().start();
            let mut info = NodeInfo::at(catch_start);
            info.decorator_end = Some(parser.token().end());
            let body = parse_block(parser, ctx, &[]);
            info.end = parser.token().end();
            info.is_complete = true;
            node.catch_block = Some(CatchBlock { info, body });
        }
        ctx.pop_block(mark);

        finish_block(parser, &mut node.info, TokenKind::Try, "Invalid end of try-catch block found.");
        Some(node)
    }
}

/// `exit for`, `exit input`, `exit program [code]`, ...
#[derive(Debug, Clone)]
pub struct ExitStatement {
    pub info: NodeInfo,
    pub exit_kind: Option<TokenKind>,
    pub code: Option<ExpressionNode>,
}

impl ExitStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<ExitStatement> {
        if !parser.peek_kind(TokenKind::Exit) {
            return None;
        }
        let start = parser.next_token().start();
        let mut node = ExitStatement {
            info: NodeInfo::at(start),
            exit_kind: None,
            code: None,
        };
        if parser.peek_any(EXIT_KINDS) {
            let kind = parser.next_token().kind;
            node.exit_kind = Some(kind);
            node.info.is_complete = true;
            if kind == TokenKind::Program {
                let options = ctx.expression_options;
                node.code = ExpressionNode::try_parse(parser, &[], &options);
            } else if TRACKED_BLOCKS.contains(&kind) && !ctx.allows_exit(kind) {
                parser.report_syntax_error(format!("Invalid exit statement for {} detected.", describe_block(kind)));
            }
        } else {
            parser.report_syntax_error("Exit statement must specify the block type to exit.");
        }
        node.info.end = parser.token().end();
        Some(node)
    }
}

/// `continue for`, `continue while`, ...
#[derive(Debug, Clone)]
pub struct ContinueStatement {
    pub info: NodeInfo,
    pub continue_kind: Option<TokenKind>,
}

impl ContinueStatement {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<ContinueStatement> {
        if !parser.peek_kind(TokenKind::Continue) {
            return None;
        }
        let start = parser.next_token().start();
        let mut node = ContinueStatement {
            info: NodeInfo::at(start),
            continue_kind: None,
        };
        if parser.peek_any(CONTINUE_KINDS) {
            let kind = parser.next_token().kind;
            node.continue_kind = Some(kind);
            node.info.is_complete = true;
            if TRACKED_BLOCKS.contains(&kind) && !ctx.allows_continue(kind) {
                parser.report_syntax_error(format!(
                    "Invalid continue statement for {} detected.",
                    describe_block(kind)
                ));
            }
        } else {
            parser.report_syntax_error("Continue statement must specify the block type to continue.");
        }
        node.info.end = parser.token().end();
        Some(node)
    }
}

impl_ast_node!(
    IfStatement,
    ElseBlock,
    ForStatement,
    ForeachStatement,
    WhileStatement,
    CaseStatement,
    WhenBlock,
    OtherwiseBlock,
    TryCatchStatement,
    CatchBlock,
    ExitStatement,
    ContinueStatement,
);
