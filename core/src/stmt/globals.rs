use crate::{
    ast::{NodeInfo, impl_ast_node},
    parser::{ParseContext, Parser},
    stmt::{Declaration, Symbols, finish_block},
    token::{Diagnostic, TokenKind, unquote},
};

/// `globals ... end globals`, or `globals "file.4gl"` naming a file whose
/// globals are included.
#[derive(Debug, Clone)]
pub struct GlobalsNode {
    pub info: NodeInfo,
    pub include_file: Option<String>,
    pub declarations: Vec<Declaration>,
    pub symbols: Symbols,
}

impl GlobalsNode {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext) -> Option<GlobalsNode> {
        if !parser.peek_kind(TokenKind::Globals) {
            return None;
        }
        let start = parser.next_token().start();
        let mut node = GlobalsNode {
            info: NodeInfo::at(start),
            include_file: None,
            declarations: Vec::new(),
            symbols: Symbols::default(),
        };

        if parser.peek().category.is_string_like() {
            let file = parser.next_token();
            node.include_file = Some(unquote(&file.value));
            node.info = NodeInfo::spanning(start, file.end());
            return Some(node);
        }
        node.info.decorator_end = Some(parser.token().end());

        let mark = ctx.push_block(TokenKind::Globals, None, None);
        // `globals` itself is a module starter, so only the declarations
        // and the enclosing terminators end the block.
        loop {
            if parser.peek_kind(TokenKind::Globals) || at_eof_or_end(parser, ctx) {
                break;
            }
            let is_public = !parser.peek_kind(TokenKind::Private);
            if parser.peek_any(&[TokenKind::Public, TokenKind::Private]) {
                parser.next_token();
            }
            match Declaration::try_parse(parser, ctx, "global", is_public) {
                Some(declaration) => {
                    node.symbols.bind(parser, &declaration);
                    node.declarations.push(declaration);
                }
                None => {
                    if parser.peek_any(&[TokenKind::Function, TokenKind::Main]) {
                        break;
                    }
                    let token = parser.next_token();
                    parser.report(Diagnostic::syntax("Unexpected token found in globals block.", token.span));
                }
            }
        }
        ctx.pop_block(mark);

        finish_block(
            parser,
            &mut node.info,
            TokenKind::Globals,
            "A globals block must be terminated with \"end globals\".",
        );
        Some(node)
    }

    pub fn is_include(&self) -> bool {
        self.include_file.is_some()
    }
}

fn at_eof_or_end(parser: &Parser, ctx: &ParseContext) -> bool {
    parser.at_eof() || (parser.peek_kind(TokenKind::End) && ctx.is_end_keyword(parser.peek_n(2).kind))
}

impl_ast_node!(GlobalsNode);
