#[cfg(test)]
mod tests {
    use crate::{
        parser::{ParseContext, Parser},
        stmt::{InputControlKind, Statement},
        token::{Diagnostic, Tokenizer},
    };

    fn parse(src: &str) -> (Statement, Vec<Diagnostic>) {
        let tokens = Tokenizer::tokenize(src);
        let mut parser = Parser::new(&tokens);
        let mut ctx = ParseContext::default();
        let statement = Statement::try_parse(&mut parser, &mut ctx).expect("statement claimed");
        (statement, parser.into_diagnostics())
    }

    #[test]
    fn input_by_name_with_attributes_and_triggers() {
        let src = "input by name l_name, l_city without defaults attributes(unbuffered, accept = false)\n\
                   before field l_name\n\
                   next field l_city\n\
                   on action save\n\
                   exit input\n\
                   end input";
        let (statement, diagnostics) = parse(src);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Statement::Input(node) = statement else { panic!("expected input") };
        assert!(node.is_implicit_mapping);
        assert!(node.without_defaults);
        assert_eq!(node.variables.len(), 2);
        let names: Vec<_> = node.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["unbuffered", "accept"]);
        assert!(node.attributes[1].value.is_some());

        let kinds: Vec<_> = node.control_blocks.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![InputControlKind::Field, InputControlKind::Action]);
        let before_field = &node.control_blocks[0];
        assert_eq!(before_field.field_specs[0].name(), "l_name");
        assert!(matches!(before_field.body[0], Statement::InputDialog(_)));
        assert_eq!(
            node.control_blocks[1].action_name.as_ref().map(|n| n.name()),
            Some("save".to_string())
        );
        assert!(node.info.is_complete);
        assert_eq!(node.info.end, src.len());
    }

    #[test]
    fn input_array_triggers() {
        let src = "input array l_arr without defaults from s_arr.* attributes(count = 5, maxcount = 10)\n\
                   before row\n\
                   let x = 1\n\
                   on row change\n\
                   let y = 1\n\
                   end input";
        let (statement, diagnostics) = parse(src);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Statement::Input(node) = statement else { panic!("expected input") };
        assert!(node.is_array);
        assert_eq!(node.array_name.as_ref().map(|n| n.name()), Some("l_arr".to_string()));
        assert_eq!(node.fields.len(), 1);
        assert!(node.fields[0].ends_with_star());
        assert_eq!(node.attributes.len(), 2);
        let kinds: Vec<_> = node.control_blocks.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![InputControlKind::Row, InputControlKind::Row]);
    }

    #[test]
    fn cancel_requires_input_array() {
        let (_, diagnostics) = parse("input l_a from f_a\n on action x\n cancel insert\nend input");
        assert!(
            diagnostics
                .iter()
                .any(|d| d.message == "Keyword \"cancel\" can only exist in an input array statement.")
        );
    }

    #[test]
    fn array_only_attribute_in_plain_input() {
        let (_, diagnostics) = parse("input l_a from f_a attributes(count = 5)\nend input");
        assert!(
            diagnostics
                .iter()
                .any(|d| d.message == "Attribute can only be used for an input array statement.")
        );
    }

    #[test]
    fn missing_from_and_terminator() {
        let (statement, diagnostics) = parse("input l_a\n let x = 1\n");
        let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Expected \"from\" token in input statement.",
                "A input block must be terminated with \"end input\".",
            ]
        );
        let Statement::Input(node) = statement else { panic!("expected input") };
        assert!(!node.info.is_complete);
        assert_eq!(node.control_blocks.len(), 1);
        assert_eq!(node.control_blocks[0].kind, InputControlKind::None);
    }

    #[test]
    fn display_array_with_control_blocks() {
        let src = "display array l_arr to s_arr.*\n on action accept\n exit display\nend display";
        let (statement, diagnostics) = parse(src);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Statement::Display(node) = statement else { panic!("expected display") };
        assert!(node.is_array);
        assert_eq!(node.control_blocks.len(), 1);
        assert_eq!(node.control_blocks[0].kind, InputControlKind::Action);
        assert_eq!(node.info.end, src.len());
    }
}
