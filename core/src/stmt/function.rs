use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::{
    analysis::LocationInfo,
    ast::{NodeInfo, impl_ast_node},
    parser::{FunctionScope, ParseContext, Parser},
    stmt::{Declaration, Statement, Symbols, VariableDef, at_block_boundary, finish_block},
    token::{Diagnostic, Span, TokenKind, TokenWithSpan},
    util::fast_map::{FastHashSet, fast_hash_set_new},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessModifier {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Function,
    Main,
}

/// `[public|private] function name(args) ... end function` or
/// `main ... end main`.
#[derive(Debug, Clone)]
pub struct FunctionBlockNode {
    pub info: NodeInfo,
    pub kind: FunctionKind,
    pub access: AccessModifier,
    pub name: String,
    pub name_span: Span,
    /// Argument names in declaration order, bound to local defines.
    pub arguments: Vec<TokenWithSpan>,
    pub declarations: Vec<Declaration>,
    pub symbols: Symbols,
    pub body: Vec<Statement>,
    /// Number of values every return statement yields, if any returns.
    pub return_arity: Option<usize>,
    /// Comment lines directly above the function.
    pub documentation_comment: Option<String>,
    location: OnceCell<LocationInfo>,
}

impl FunctionBlockNode {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<FunctionBlockNode> {
        let (access, offset) = match parser.peek().kind {
            TokenKind::Public | TokenKind::Private if parser.peek_kind_n(TokenKind::Function, 2) => {
                let access = if parser.peek_kind(TokenKind::Private) {
                    AccessModifier::Private
                } else {
                    AccessModifier::Public
                };
                (access, 2)
            }
            TokenKind::Function | TokenKind::Main => (AccessModifier::Public, 1),
            _ => return None,
        };
        let start = parser.peek().start();
        if offset == 2 {
            parser.next_token();
        }
        let keyword = parser.next_token();
        let kind = if keyword.kind == TokenKind::Main {
            FunctionKind::Main
        } else {
            FunctionKind::Function
        };
        let mut node = FunctionBlockNode {
            info: NodeInfo::at(start),
            kind,
            access,
            name: "main".to_string(),
            name_span: keyword.span,
            arguments: Vec::new(),
            declarations: Vec::new(),
            symbols: Symbols::default(),
            body: Vec::new(),
            return_arity: None,
            documentation_comment: None,
            location: OnceCell::new(),
        };

        if kind == FunctionKind::Function {
            node.parse_signature(parser);
        }
        node.info.decorator_end = Some(parser.token().end());

        let outer_scope = ctx.function.replace(FunctionScope::default());
        let mark = ctx.push_block(keyword.kind, None, None);
        while !at_block_boundary(parser, ctx, &[]) {
            if let Some(declaration) = Declaration::try_parse(parser, ctx, "local", false) {
                node.symbols.bind(parser, &declaration);
                node.declarations.push(declaration);
            } else if let Some(statement) = Statement::try_parse(parser, ctx) {
                node.body.push(statement);
            } else {
                parser.next_token();
            }
        }
        ctx.pop_block(mark);
        let scope = std::mem::replace(&mut ctx.function, outer_scope);
        node.return_arity = scope.and_then(|s| s.return_arity());

        let message = match kind {
            FunctionKind::Function => "A function must be terminated with \"end function\".",
            FunctionKind::Main => "A main block must be terminated with \"end main\".",
        };
        finish_block(parser, &mut node.info, keyword.kind, message);
        Some(node)
    }

    /// `name ( [arg [, arg ...]] )`
    fn parse_signature(&mut self, parser: &mut Parser) {
        if parser.peek().is_name_like() && !parser.peek().kind.is_statement_keyword() {
            let name = parser.next_token();
            self.name = name.value.clone();
            self.name_span = name.span;
        } else {
            self.name.clear();
            parser.report_syntax_error("A function must have a name.");
            return;
        }

        if !parser.accept(TokenKind::LeftParenthesis) {
            parser.report_syntax_error("Expected left-paren in function declaration.");
            return;
        }
        let mut seen: FastHashSet<TokenWithSpan> = fast_hash_set_new();
        while parser.peek().is_name_like() {
            let argument = TokenWithSpan::new(parser.next_token().clone());
            if seen.contains(&argument) {
                parser.report(Diagnostic::syntax(
                    format!("Duplicate argument found: {}", argument.name()),
                    argument.span(),
                ));
            } else {
                seen.insert(argument.clone());
                self.arguments.push(argument);
            }
            if !parser.accept(TokenKind::Comma) {
                break;
            }
        }
        if !parser.accept(TokenKind::RightParenthesis) {
            parser.report_syntax_error("Expected right-paren in function declaration.");
        }
    }

    /// Each argument with the local define it is bound to.
    pub fn parameters(&self) -> impl Iterator<Item = (&TokenWithSpan, Option<&Arc<VariableDef>>)> {
        self.arguments
            .iter()
            .map(|arg| (arg, self.symbols.variables.get(arg.name())))
    }

    /// Local variables that are not arguments.
    pub fn locals(&self) -> impl Iterator<Item = &Arc<VariableDef>> {
        self.symbols.variables.values().filter(|var| {
            !self
                .arguments
                .iter()
                .any(|arg| arg.name().eq_ignore_ascii_case(&var.name))
        })
    }

    pub fn is_public(&self) -> bool {
        self.access == AccessModifier::Public
    }

    pub fn location(&self) -> Option<&LocationInfo> {
        self.location.get()
    }

    pub(crate) fn stamp_location(&self, location: LocationInfo) {
        let _ = self.location.set(location);
    }
}

impl_ast_node!(FunctionBlockNode);
