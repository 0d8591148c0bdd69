#[cfg(test)]
mod tests {
    use crate::{
        parser::{ParseContext, Parser},
        stmt::{FunctionBlockNode, Statement},
        token::{Diagnostic, Tokenizer},
    };

    fn parse(src: &str) -> (Statement, Vec<Diagnostic>) {
        let tokens = Tokenizer::tokenize(src);
        let mut parser = Parser::new(&tokens);
        let mut ctx = ParseContext::default();
        let statement = Statement::try_parse(&mut parser, &mut ctx).expect("statement claimed");
        (statement, parser.into_diagnostics())
    }

    fn messages(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn if_statement_ends_after_terminating_keyword() {
        let src = "if x > 1 then\n  let y = 2\nend if";
        let (statement, diagnostics) = parse(src);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Statement::If(node) = statement else { panic!("expected if") };
        assert!(node.info.is_complete);
        assert_eq!(node.info.end, src.len());
        assert_eq!(node.body.len(), 1);
        assert!(node.else_block.is_none());
        assert_eq!(node.info.decorator_end, Some("if x > 1 then".len()));
    }

    #[test]
    fn if_with_else_branch() {
        let (statement, diagnostics) = parse("if ok then\n call a()\nelse\n call b()\n call c()\nend if");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Statement::If(node) = statement else { panic!("expected if") };
        assert_eq!(node.body.len(), 1);
        assert_eq!(node.else_block.map(|e| e.body.len()), Some(2));
    }

    #[test]
    fn if_without_then_is_reported() {
        let (_, diagnostics) = parse("if x\n let y = 1\nend if");
        assert_eq!(
            messages(&diagnostics),
            vec!["An if statement must have a \"then\" keyword prior to containing code."]
        );
    }

    #[test]
    fn for_without_terminator_reports_exactly_once() {
        let src = "for i = 1 to 10\n  let x = i";
        let (statement, diagnostics) = parse(src);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("end for"));
        let Statement::For(node) = statement else { panic!("expected for") };
        assert!(!node.info.is_complete);
        assert_eq!(node.info.end, src.len());
        assert_eq!(node.body.len(), 1);
    }

    #[test]
    fn for_step_and_bounds() {
        let (statement, diagnostics) = parse("for i = 1 to 10 step 2\n  display i\nend for");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Statement::For(node) = statement else { panic!("expected for") };
        assert_eq!(node.step_value, 2);
        assert_eq!(node.counter.map(|c| c.name()), Some("i".to_string()));
        let start = node.start_value.as_ref().and_then(|e| e.as_literal()).map(|t| t.value.as_str());
        let end = node.end_value.as_ref().and_then(|e| e.as_literal()).map(|t| t.value.as_str());
        assert_eq!(start, Some("1"));
        assert_eq!(end, Some("10"));
    }

    #[test]
    fn for_defaults_to_unit_step_and_accepts_negative_step() {
        let (statement, _) = parse("for i = 1 to 3\nend for");
        let Statement::For(node) = statement else { panic!("expected for") };
        assert_eq!(node.step_value, 1);

        let (statement, diagnostics) = parse("for i = 3 to 1 step -1\nend for");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Statement::For(node) = statement else { panic!("expected for") };
        assert_eq!(node.step_value, -1);
    }

    #[test]
    fn invalid_step_value() {
        let (_, diagnostics) = parse("for i = 1 to 3 step x\nend for");
        assert_eq!(messages(&diagnostics), vec!["Invalid step value found."]);
    }

    #[test]
    fn exit_must_match_an_enclosing_block() {
        let (_, diagnostics) = parse("while x\n exit for\nend while");
        assert_eq!(messages(&diagnostics), vec!["Invalid exit statement for for loop detected."]);

        let (_, diagnostics) = parse("for i = 1 to 2\n if i then\n exit for\n end if\nend for");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }

    #[test]
    fn continue_must_match_an_enclosing_loop() {
        let (_, diagnostics) = parse("for i = 1 to 2\n continue while\nend for");
        assert_eq!(messages(&diagnostics), vec!["Invalid continue statement for while loop detected."]);
    }

    #[test]
    fn inner_block_missing_terminator_stops_at_outer_end() {
        let (statement, diagnostics) = parse("for i = 1 to 2\n if x then\n let y = 1\nend for");
        assert_eq!(messages(&diagnostics), vec!["An if statement must be terminated with \"end if\"."]);
        let Statement::For(node) = statement else { panic!("expected for") };
        assert!(node.info.is_complete);
        assert!(matches!(node.body[0], Statement::If(ref inner) if !inner.info.is_complete));
    }

    #[test]
    fn case_with_when_and_otherwise() {
        let src = "case x\n when 1\n let y = 1\n when 2\n let y = 2\n exit case\n otherwise\n let y = 3\nend case";
        let (statement, diagnostics) = parse(src);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Statement::Case(node) = statement else { panic!("expected case") };
        assert!(node.selector.is_some());
        assert_eq!(node.whens.len(), 2);
        assert_eq!(node.whens[1].body.len(), 2);
        assert_eq!(node.otherwise.map(|o| o.body.len()), Some(1));
    }

    #[test]
    fn try_catch_blocks() {
        let (statement, diagnostics) = parse("try\n call f()\ncatch\n let x = 1\nend try");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Statement::Try(node) = statement else { panic!("expected try") };
        assert_eq!(node.body.len(), 1);
        assert_eq!(node.catch_block.map(|c| c.body.len()), Some(1));

        let (_, diagnostics) = parse("try\n call f()\n");
        assert_eq!(messages(&diagnostics), vec!["Invalid end of try-catch block found."]);
    }

    #[test]
    fn foreach_keeps_using_and_into_apart() {
        let (statement, diagnostics) = parse("foreach c_cust using l_id into l_rec.*\n continue foreach\nend foreach");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Statement::Foreach(node) = statement else { panic!("expected foreach") };
        assert_eq!(node.cursor_name().as_deref(), Some("c_cust"));
        assert_eq!(node.using.len(), 1);
        assert_eq!(node.into.len(), 1);
        assert!(node.into[0].ends_with_star());
    }

    #[test]
    fn return_arity_must_agree() {
        let src = "function f()\n if x then\n return 1\n end if\n return 1, 2\nend function";
        let tokens = Tokenizer::tokenize(src);
        let mut parser = Parser::new(&tokens);
        let mut ctx = ParseContext::default();
        let function = FunctionBlockNode::try_parse(&mut parser, &mut ctx).expect("function claimed");
        assert_eq!(function.return_arity, Some(1));
        assert_eq!(
            messages(parser.diagnostics()),
            vec!["Return statement does not return the same number of values as other return statements in this function."]
        );
        assert!(ctx.function.is_none());
    }

    #[test]
    fn unknown_tokens_inside_blocks_are_skipped() {
        let (statement, diagnostics) = parse("while x\n foo bar\n let y = 1\nend while");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Statement::While(node) = statement else { panic!("expected while") };
        assert_eq!(node.body.len(), 1);
        assert!(node.info.is_complete);
    }
}
