mod control;
mod decl;
mod function;
mod globals;
mod input;
mod simple;
mod sql;

#[cfg(test)]
mod control_test;
#[cfg(test)]
mod input_test;
#[cfg(test)]
mod sql_test;

pub use control::{
    CaseStatement, CatchBlock, ContinueStatement, ElseBlock, ExitStatement, ForStatement, ForeachStatement,
    IfStatement, OtherwiseBlock, TryCatchStatement, WhenBlock, WhileStatement,
};
pub(crate) use decl::bind_symbol;
pub use decl::{
    ConstantDef, ConstantDefNode, Declaration, DefineNode, Symbols, TypeDefNode, TypeDefinition, VariableDef,
    VariableDefinitionNode,
};
pub use function::{AccessModifier, FunctionBlockNode, FunctionKind};
pub use globals::GlobalsNode;
pub use input::{InputAttribute, InputBlock, InputControlBlock, InputControlKind, InputDialogStatement};
pub use simple::{
    CallStatement, DisplayStatement, InitializeStatement, LetStatement, MessageStatement, ReturnStatement,
    SleepStatement, WheneverCondition, WheneverStatement,
};
pub use sql::{
    CursorAction, CursorStatement, DeclareQuery, DeclareStatement, ExecuteStatement, PrepareStatement,
    SqlBlockNode, SqlStatement,
};

use crate::{
    ast::NodeInfo,
    expr::{ExpressionNode, FunctionCallExpression, NameExpression},
    parser::{ExpressionParsingOptions, ParseContext, Parser},
    token::TokenKind,
};

/// Keywords that only start module-level constructs. A body never runs past
/// one of them.
const MODULE_STARTERS: &[TokenKind] = &[TokenKind::Function, TokenKind::Main, TokenKind::Globals];

#[derive(Debug, Clone)]
pub enum Statement {
    Let(LetStatement),
    Call(CallStatement),
    Return(ReturnStatement),
    Exit(ExitStatement),
    Continue(ContinueStatement),
    If(IfStatement),
    For(ForStatement),
    Foreach(ForeachStatement),
    While(WhileStatement),
    Case(CaseStatement),
    Try(TryCatchStatement),
    Input(InputBlock),
    InputDialog(InputDialogStatement),
    Declare(DeclareStatement),
    Prepare(PrepareStatement),
    Execute(ExecuteStatement),
    Cursor(CursorStatement),
    SqlBlock(SqlBlockNode),
    Sql(SqlStatement),
    Display(DisplayStatement),
    Message(MessageStatement),
    Sleep(SleepStatement),
    Initialize(InitializeStatement),
    Whenever(WheneverStatement),
}

impl Statement {
    /// Tries every statement production against the next token. The first
    /// one whose leading keyword matches claims the input.
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<Statement> {
        let statement = match parser.peek().kind {
            TokenKind::Let => Statement::Let(LetStatement::try_parse(parser, ctx)?),
            TokenKind::Call => Statement::Call(CallStatement::try_parse(parser, ctx)?),
            TokenKind::Return => Statement::Return(ReturnStatement::try_parse(parser, ctx)?),
            TokenKind::Exit => Statement::Exit(ExitStatement::try_parse(parser, ctx)?),
            TokenKind::Continue => Statement::Continue(ContinueStatement::try_parse(parser, ctx)?),
            TokenKind::If => Statement::If(IfStatement::try_parse(parser, ctx)?),
            TokenKind::For => Statement::For(ForStatement::try_parse(parser, ctx)?),
            TokenKind::Foreach => Statement::Foreach(ForeachStatement::try_parse(parser, ctx)?),
            TokenKind::While => Statement::While(WhileStatement::try_parse(parser, ctx)?),
            TokenKind::Case => Statement::Case(CaseStatement::try_parse(parser, ctx)?),
            TokenKind::Try => Statement::Try(TryCatchStatement::try_parse(parser, ctx)?),
            TokenKind::Input => Statement::Input(InputBlock::try_parse(parser, ctx)?),
            TokenKind::Declare => Statement::Declare(DeclareStatement::try_parse(parser, ctx)?),
            TokenKind::Prepare => Statement::Prepare(PrepareStatement::try_parse(parser, ctx)?),
            TokenKind::Execute => Statement::Execute(ExecuteStatement::try_parse(parser, ctx)?),
            TokenKind::Open | TokenKind::Fetch | TokenKind::Close | TokenKind::Free => {
                Statement::Cursor(CursorStatement::try_parse(parser, ctx)?)
            }
            TokenKind::Sql => Statement::SqlBlock(SqlBlockNode::try_parse(parser)?),
            TokenKind::Select | TokenKind::Insert | TokenKind::Update | TokenKind::Delete => {
                let options = ctx.expression_options;
                Statement::Sql(SqlStatement::try_parse(parser, &options)?)
            }
            TokenKind::Display => Statement::Display(DisplayStatement::try_parse(parser, ctx)?),
            TokenKind::Message | TokenKind::Error => Statement::Message(MessageStatement::try_parse(parser, ctx)?),
            TokenKind::Sleep => Statement::Sleep(SleepStatement::try_parse(parser, ctx)?),
            TokenKind::Initialize => Statement::Initialize(InitializeStatement::try_parse(parser, ctx)?),
            TokenKind::Whenever => Statement::Whenever(WheneverStatement::try_parse(parser)?),
            _ => return None,
        };
        Some(statement)
    }

    pub fn info(&self) -> &NodeInfo {
        match self {
            Statement::Let(s) => &s.info,
            Statement::Call(s) => &s.info,
            Statement::Return(s) => &s.info,
            Statement::Exit(s) => &s.info,
            Statement::Continue(s) => &s.info,
            Statement::If(s) => &s.info,
            Statement::For(s) => &s.info,
            Statement::Foreach(s) => &s.info,
            Statement::While(s) => &s.info,
            Statement::Case(s) => &s.info,
            Statement::Try(s) => &s.info,
            Statement::Input(s) => &s.info,
            Statement::InputDialog(s) => &s.info,
            Statement::Declare(s) => &s.info,
            Statement::Prepare(s) => &s.info,
            Statement::Execute(s) => &s.info,
            Statement::Cursor(s) => &s.info,
            Statement::SqlBlock(s) => &s.info,
            Statement::Sql(s) => &s.info,
            Statement::Display(s) => &s.info,
            Statement::Message(s) => &s.info,
            Statement::Sleep(s) => &s.info,
            Statement::Initialize(s) => &s.info,
            Statement::Whenever(s) => &s.info,
        }
    }

    /// Short label used for outlining.
    pub fn label(&self) -> &'static str {
        match self {
            Statement::Let(_) => "let",
            Statement::Call(_) => "call",
            Statement::Return(_) => "return",
            Statement::Exit(_) => "exit",
            Statement::Continue(_) => "continue",
            Statement::If(_) => "if",
            Statement::For(_) => "for",
            Statement::Foreach(_) => "foreach",
            Statement::While(_) => "while",
            Statement::Case(_) => "case",
            Statement::Try(_) => "try",
            Statement::Input(_) => "input",
            Statement::InputDialog(_) => "input dialog",
            Statement::Declare(_) => "declare",
            Statement::Prepare(_) => "prepare",
            Statement::Execute(_) => "execute",
            Statement::Cursor(s) => s.action.keyword(),
            Statement::SqlBlock(_) => "sql",
            Statement::Sql(_) => "sql statement",
            Statement::Display(_) => "display",
            Statement::Message(s) if s.is_error => "error",
            Statement::Message(_) => "message",
            Statement::Sleep(_) => "sleep",
            Statement::Initialize(_) => "initialize",
            Statement::Whenever(_) => "whenever",
        }
    }

    /// Nested statement lists, in source order.
    pub fn bodies(&self) -> Vec<&[Statement]> {
        match self {
            Statement::If(s) => {
                let mut bodies = vec![s.body.as_slice()];
                bodies.extend(s.else_block.as_ref().map(|e| e.body.as_slice()));
                bodies
            }
            Statement::For(s) => vec![s.body.as_slice()],
            Statement::Foreach(s) => vec![s.body.as_slice()],
            Statement::While(s) => vec![s.body.as_slice()],
            Statement::Case(s) => {
                let mut bodies: Vec<&[Statement]> = s.whens.iter().map(|w| w.body.as_slice()).collect();
                bodies.extend(s.otherwise.as_ref().map(|o| o.body.as_slice()));
                bodies
            }
            Statement::Try(s) => {
                let mut bodies = vec![s.body.as_slice()];
                bodies.extend(s.catch_block.as_ref().map(|c| c.body.as_slice()));
                bodies
            }
            Statement::Input(s) => s.control_blocks.iter().map(|b| b.body.as_slice()).collect(),
            Statement::Display(s) => s.control_blocks.iter().map(|b| b.body.as_slice()).collect(),
            _ => Vec::new(),
        }
    }

    /// Expressions read by the statement.
    pub fn expressions(&self) -> Vec<&ExpressionNode> {
        match self {
            Statement::Let(s) => s.values.iter().collect(),
            Statement::Return(s) => s.values.iter().collect(),
            Statement::Exit(s) => s.code.iter().collect(),
            Statement::If(s) => s.condition.iter().collect(),
            Statement::For(s) => s.start_value.iter().chain(s.end_value.iter()).collect(),
            Statement::While(s) => s.condition.iter().collect(),
            Statement::Case(s) => s
                .selector
                .iter()
                .chain(s.whens.iter().filter_map(|w| w.condition.as_ref()))
                .collect(),
            Statement::Prepare(s) => s.source.iter().collect(),
            Statement::Execute(s) => s.immediate.iter().collect(),
            Statement::Display(s) => s.values.iter().collect(),
            Statement::Message(s) => s.values.iter().collect(),
            Statement::Sleep(s) => s.seconds.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Variables written or bound by the statement.
    pub fn targets(&self) -> Vec<&NameExpression> {
        match self {
            Statement::Let(s) => s.variable.iter().collect(),
            Statement::Call(s) => s.returning.iter().collect(),
            Statement::For(s) => s.counter.iter().collect(),
            Statement::Foreach(s) => s.using.iter().chain(s.into.iter()).collect(),
            Statement::Execute(s) => s.using.iter().chain(s.into.iter()).collect(),
            Statement::Cursor(s) => s.using.iter().chain(s.into.iter()).collect(),
            Statement::Input(s) => s.variables.iter().collect(),
            Statement::Initialize(s) => s.targets.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// The function invoked by a `call` statement.
    pub fn call(&self) -> Option<&FunctionCallExpression> {
        match self {
            Statement::Call(s) => s.call.as_ref(),
            _ => None,
        }
    }
}

/// Whether the next token closes the current block: end of input, one of
/// `stops`, a module-level starter, or `end X` for any enclosing block.
pub(crate) fn at_block_boundary(parser: &Parser, ctx: &ParseContext, stops: &[TokenKind]) -> bool {
    if parser.at_eof() || parser.peek_any(stops) || parser.peek_any(MODULE_STARTERS) {
        return true;
    }
    parser.peek_kind(TokenKind::End) && ctx.is_end_keyword(parser.peek_n(2).kind)
}

/// Statements up to a block boundary. Tokens no production claims are
/// skipped one at a time.
pub(crate) fn parse_block(parser: &mut Parser, ctx: &mut ParseContext, stops: &[TokenKind]) -> Vec<Statement> {
    let mut body = Vec::new();
    while !at_block_boundary(parser, ctx, stops) {
        match Statement::try_parse(parser, ctx) {
            Some(statement) => body.push(statement),
            None => {
                parser.next_token();
            }
        }
    }
    body
}

/// Consumes `end <kind>` or reports `message`; either way the node ends at
/// the last consumed token.
pub(crate) fn finish_block(parser: &mut Parser, info: &mut NodeInfo, kind: TokenKind, message: &str) {
    if parser.peek_end(kind) {
        parser.next_token();
        parser.next_token();
        info.is_complete = true;
    } else {
        parser.report_syntax_error(message);
    }
    info.end = parser.token().end();
}

/// `a, b.c, d[1]`
pub(crate) fn parse_names(parser: &mut Parser, options: &ExpressionParsingOptions) -> Vec<NameExpression> {
    let mut names = Vec::new();
    while let Some(name) = NameExpression::try_parse(parser, options) {
        names.push(name);
        if !parser.accept(TokenKind::Comma) {
            break;
        }
    }
    names
}
