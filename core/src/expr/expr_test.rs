#[cfg(test)]
mod tests {
    use crate::{
        expr::{ExpressionKind, ExpressionNode, Operator, parse_list},
        parser::{ExpressionParsingOptions, Parser},
        token::{Diagnostic, TokenKind, Tokenizer},
    };

    fn parse_with(src: &str, options: ExpressionParsingOptions) -> (Option<ExpressionNode>, Vec<Diagnostic>) {
        let tokens = Tokenizer::tokenize(src);
        let mut parser = Parser::new(&tokens);
        let node = ExpressionNode::try_parse(&mut parser, &[], &options);
        (node, parser.into_diagnostics())
    }

    fn parse(src: &str) -> ExpressionNode {
        let (node, diagnostics) = parse_with(src, ExpressionParsingOptions::default());
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        node.expect("expression")
    }

    fn operators(node: &ExpressionNode) -> Vec<Operator> {
        node.terms()
            .filter_map(|t| match t.kind {
                ExpressionKind::Operator(op) => Some(op),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn flat_term_list() {
        let node = parse("a + b * 2");
        assert_eq!(node.terms().count(), 5);
        assert_eq!(node.to_string(), "a + b * 2");
        assert_eq!(operators(&node), vec![Operator::Add, Operator::Multiply]);
    }

    #[test]
    fn two_token_operators_merge() {
        assert_eq!(operators(&parse("x <= 10")), vec![Operator::LessEqual]);
        assert_eq!(operators(&parse("x <> 10")), vec![Operator::LessGreater]);
        assert_eq!(operators(&parse("x != 10")), vec![Operator::NotEqual]);
        assert_eq!(operators(&parse("a || b")), vec![Operator::Concat]);
        assert_eq!(operators(&parse("a == b")), vec![Operator::DoubleEqual]);
    }

    #[test]
    fn keyword_operators() {
        assert_eq!(
            operators(&parse("name clipped || \"x\"")),
            vec![Operator::Clipped, Operator::Concat]
        );
        assert_eq!(operators(&parse("x is not null")), vec![Operator::IsNotNull]);
        assert_eq!(operators(&parse("x is null and y")), vec![Operator::IsNull, Operator::And]);
        assert_eq!(operators(&parse("a not like \"%x\"")), vec![Operator::NotLike]);
        assert_eq!(operators(&parse("not a")), vec![Operator::Not]);
    }

    #[test]
    fn datetime_and_interval_literals() {
        let node = parse("current year to second");
        assert!(matches!(node.kind, ExpressionKind::Constrained(ref t) if t == "current year to second"));

        let node = parse("interval(5) day to day");
        assert_eq!(node.to_string(), "interval(5) day to day");
    }

    #[test]
    fn nested_select_in_parentheses() {
        let options = ExpressionParsingOptions::default().with_nested_select();
        let (node, diagnostics) = parse_with("(select count(*) from t) + 1", options);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let node = node.expect("expression");
        let ExpressionKind::Paren(paren) = &node.kind else { panic!("expected paren") };
        let inner = paren.inner.as_ref().expect("inner");
        assert!(matches!(inner.kind, ExpressionKind::Select(_)));
        assert_eq!(operators(&node), vec![Operator::Add]);
    }

    #[test]
    fn chained_call_member() {
        let node = parse("ui.Window.getCurrent().getForm()");
        let call = node.as_call().expect("call");
        assert_eq!(call.name(), "ui.Window.getCurrent");
        assert_eq!(call.argument_count(), 0);
        assert!(call.member.is_some());
        assert_eq!(node.to_string(), "ui.Window.getCurrent().getForm()");
    }

    #[test]
    fn indexed_member_name() {
        let node = parse("arr[i + 1].name");
        let name = node.as_name().expect("name");
        assert_eq!(name.base(), "arr");
        assert_eq!(name.indices().count(), 1);
        assert_eq!(name.dotted(), "arr.name");
        assert_eq!(name.to_string(), "arr[i + 1].name");
    }

    #[test]
    fn no_term_is_silent() {
        let (node, diagnostics) = parse_with("then", ExpressionParsingOptions::default());
        assert!(node.is_none());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn dangling_operator_requires_operand() {
        let (_, diagnostics) = parse_with("1 +", ExpressionParsingOptions::default());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Expression required.");
    }

    #[test]
    fn stray_exclamation() {
        let (_, diagnostics) = parse_with("x ! y", ExpressionParsingOptions::default());
        assert_eq!(diagnostics[0].message, "Invalid token '!' found in expression.");
    }

    #[test]
    fn list_stops_at_break() {
        let tokens = Tokenizer::tokenize("a, b + 1, f(c) to x");
        let mut parser = Parser::new(&tokens);
        let items = parse_list(&mut parser, &[], &ExpressionParsingOptions::default());
        assert_eq!(items.len(), 3);
        assert!(parser.peek_kind(TokenKind::To));
    }

    #[test]
    fn literal_accessor() {
        assert_eq!(parse("42").as_literal().map(|t| t.value.as_str()), Some("42"));
        assert!(parse("42 + 1").as_literal().is_none());
    }
}
