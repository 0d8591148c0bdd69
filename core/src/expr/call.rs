use std::fmt;

use crate::{
    ast::{NodeInfo, impl_ast_node},
    expr::{ExpressionKind, ExpressionNode, NameExpression, capture_balanced, parse_list, write_list},
    parser::{ExpressionParsingOptions, Parser},
    token::{Token, TokenKind},
};

/// `f(a, b)` with an optional member access chained after the call, as in
/// `ui.Window.getCurrent().getForm()`.
#[derive(Debug, Clone)]
pub struct FunctionCallExpression {
    pub info: NodeInfo,
    pub function: NameExpression,
    pub params: Vec<ExpressionNode>,
    /// Raw argument tokens when argument parsing is disabled.
    pub anything: Vec<Token>,
    pub member: Option<Box<ExpressionNode>>,
}

impl_ast_node!(FunctionCallExpression);

pub enum CallOrName {
    Call(FunctionCallExpression),
    Name(NameExpression),
}

impl FunctionCallExpression {
    /// Parses a name and, when a `(` follows, the argument list. Without the
    /// parenthesis the bare name is handed back, unless `left_paren_required`
    /// is set, in which case the call is reported as malformed.
    pub fn try_parse(
        parser: &mut Parser,
        options: &ExpressionParsingOptions,
        left_paren_required: bool,
    ) -> Option<CallOrName> {
        let function = NameExpression::try_parse(parser, options)?;
        let mut node = FunctionCallExpression {
            info: NodeInfo::at(function.info.start),
            function,
            params: Vec::new(),
            anything: Vec::new(),
            member: None,
        };

        if !parser.accept(TokenKind::LeftParenthesis) {
            if !left_paren_required {
                return Some(CallOrName::Name(node.function));
            }
            parser.report_syntax_error("Call statement missing left parenthesis.");
            node.info.end = parser.token().end();
            return Some(CallOrName::Call(node));
        }

        if options.allow_anything_for_function_params {
            node.anything = capture_balanced(parser);
            node.info.is_complete = parser.token().kind == TokenKind::RightParenthesis;
        } else {
            node.params = parse_list(parser, &[TokenKind::Comma, TokenKind::RightParenthesis], options);
            if parser.accept(TokenKind::RightParenthesis) {
                node.info.is_complete = true;
            } else {
                parser.report_syntax_error("Call statement missing right parenthesis.");
            }
            if parser.accept(TokenKind::Dot) {
                let member = if parser.peek_kind(TokenKind::Multiply) {
                    let star = parser.next_token();
                    ExpressionNode::from_token(star)
                } else {
                    match FunctionCallExpression::try_parse(parser, options, false) {
                        Some(CallOrName::Call(call)) => {
                            let (start, end) = (call.info.start, call.info.end);
                            ExpressionNode::new(start, end, ExpressionKind::Call(call))
                        }
                        Some(CallOrName::Name(name)) => {
                            let (start, end) = (name.info.start, name.info.end);
                            ExpressionNode::new(start, end, ExpressionKind::Name(name))
                        }
                        None => {
                            let token = parser.next_token();
                            ExpressionNode::from_token(token)
                        }
                    }
                };
                node.member = Some(Box::new(member));
            }
        }
        node.info.end = parser.token().end();
        Some(CallOrName::Call(node))
    }

    /// Callee text as written, e.g. `base.typeinfo.create`.
    pub fn name(&self) -> String {
        self.function.dotted()
    }

    pub fn argument_count(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for FunctionCallExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function)?;
        write_list(f, &self.params)?;
        f.write_str(")")?;
        if let Some(member) = &self.member {
            write!(f, ".{}", member)?;
        }
        Ok(())
    }
}
