use std::fmt;

use crate::{
    ast::{NodeInfo, impl_ast_node},
    expr::{ExpressionNode, is_expression_name, parse_list, write_list},
    parser::{ExpressionParsingOptions, Parser},
    token::{Span, Token, TokenKind},
};

#[derive(Debug, Clone)]
pub enum NamePiece {
    /// `.field`
    Member(Token),
    /// `.*`
    Star(Span),
    /// `[i, j]`
    Index(Vec<ExpressionNode>, Span),
}

/// `a`, `rec.field`, `arr[i].field`, `rec.*`, `base.Channel`.
#[derive(Debug, Clone)]
pub struct NameExpression {
    pub info: NodeInfo,
    pub head: Token,
    pub pieces: Vec<NamePiece>,
}

impl_ast_node!(NameExpression);

impl NameExpression {
    pub fn try_parse(parser: &mut Parser, options: &ExpressionParsingOptions) -> Option<NameExpression> {
        if !is_expression_name(parser.peek()) {
            return None;
        }
        let head = parser.next_token().clone();
        let mut node = NameExpression {
            info: NodeInfo::at(head.start()),
            head,
            pieces: Vec::new(),
        };

        loop {
            match parser.peek().kind {
                TokenKind::Dot => {
                    if parser.peek_kind_n(TokenKind::Multiply, 2) {
                        parser.next_token();
                        let star = parser.next_token();
                        node.pieces.push(NamePiece::Star(star.span));
                        break;
                    }
                    if !parser.peek_n(2).is_name_like() {
                        break;
                    }
                    parser.next_token();
                    let member = parser.next_token().clone();
                    node.pieces.push(NamePiece::Member(member));
                }
                TokenKind::LeftBracket => {
                    let start = parser.next_token().start();
                    let items = parse_list(parser, &[TokenKind::Comma, TokenKind::RightBracket], options);
                    if !parser.accept(TokenKind::RightBracket) {
                        parser.report_syntax_error("Array index missing right bracket.");
                        node.pieces.push(NamePiece::Index(items, Span::new(start, parser.token().end())));
                        break;
                    }
                    node.pieces.push(NamePiece::Index(items, Span::new(start, parser.token().end())));
                }
                _ => break,
            }
        }

        node.info.end = parser.token().end();
        node.info.is_complete = true;
        Some(node)
    }

    /// Builds an unqualified name outside the parser.
    pub fn simple(token: Token) -> Self {
        Self {
            info: NodeInfo::spanning(token.start(), token.end()),
            head: token,
            pieces: Vec::new(),
        }
    }

    /// The first segment, e.g. `rec` in `rec.field`.
    pub fn base(&self) -> &str {
        &self.head.value
    }

    /// Full text with member access and indices, e.g. `arr[i].name`.
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Dotted text without indices: `base.Channel.create`.
    pub fn dotted(&self) -> String {
        let mut text = self.head.value.clone();
        for piece in &self.pieces {
            match piece {
                NamePiece::Member(member) => {
                    text.push('.');
                    text.push_str(&member.value);
                }
                NamePiece::Star(_) => text.push_str(".*"),
                NamePiece::Index(..) => {}
            }
        }
        text
    }

    pub fn ends_with_star(&self) -> bool {
        matches!(self.pieces.last(), Some(NamePiece::Star(_)))
    }

    pub fn is_simple(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = &ExpressionNode> {
        self.pieces
            .iter()
            .filter_map(|piece| match piece {
                NamePiece::Index(items, _) => Some(items.iter()),
                _ => None,
            })
            .flatten()
    }
}

impl fmt::Display for NameExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.head.value)?;
        for piece in &self.pieces {
            match piece {
                NamePiece::Member(member) => write!(f, ".{}", member.value)?,
                NamePiece::Star(_) => f.write_str(".*")?,
                NamePiece::Index(items, _) => {
                    f.write_str("[")?;
                    write_list(f, items)?;
                    f.write_str("]")?;
                }
            }
        }
        Ok(())
    }
}
