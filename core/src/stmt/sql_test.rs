#[cfg(test)]
mod tests {
    use crate::{
        parser::{ParseContext, Parser},
        stmt::{CursorAction, DeclareQuery, Statement},
        token::{Diagnostic, Tokenizer},
    };

    fn parse_all(src: &str) -> (Vec<Statement>, ParseContext, Vec<Diagnostic>) {
        let tokens = Tokenizer::tokenize(src);
        let mut parser = Parser::new(&tokens);
        let mut ctx = ParseContext::default();
        let mut statements = Vec::new();
        while let Some(statement) = Statement::try_parse(&mut parser, &mut ctx) {
            statements.push(statement);
        }
        assert!(parser.at_eof(), "unparsed input at {}", parser.position());
        (statements, ctx, parser.into_diagnostics())
    }

    #[test]
    fn declare_static_select_for_update() {
        let (statements, ctx, diagnostics) =
            parse_all("declare c_cust cursor for select * from customer where id = 1 for update");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Statement::Declare(node) = &statements[0] else { panic!("expected declare") };
        assert_eq!(node.name(), Some("c_cust"));
        let Some(DeclareQuery::Static(select)) = &node.query else { panic!("expected static query") };
        assert_eq!(select.tables(), vec!["customer"]);
        assert!(select.to_string().ends_with("for update"));
        assert_eq!(ctx.cursors.len(), 1);
        assert_eq!(ctx.cursors[0].name, "c_cust");
        assert!(!ctx.cursors[0].scroll);
    }

    #[test]
    fn declare_scroll_cursor_with_hold_from_string() {
        let (statements, ctx, diagnostics) =
            parse_all("declare c1 scroll cursor with hold from \"select * from t\"");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Statement::Declare(node) = &statements[0] else { panic!("expected declare") };
        assert!(node.scroll);
        assert!(node.with_hold);
        assert!(matches!(node.query, Some(DeclareQuery::String(_))));
        assert!(ctx.cursors[0].scroll);
    }

    #[test]
    fn declare_over_prepared_statement() {
        let (statements, ctx, diagnostics) = parse_all("prepare p1 from l_sql\ndeclare c2 cursor for p1");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert_eq!(statements.len(), 2);
        assert_eq!(ctx.prepared.len(), 1);
        assert_eq!(ctx.prepared[0].name, "p1");
        assert_eq!(ctx.cursors[0].prepared_from.as_deref(), Some("p1"));
    }

    #[test]
    fn declare_missing_cursor_keyword() {
        let (_, _, diagnostics) = parse_all("declare c3 for select 1");
        assert_eq!(diagnostics[0].message, "SQL declare statement missing \"cursor\" keyword.");
    }

    #[test]
    fn select_into_stops_at_next_statement() {
        let (statements, _, diagnostics) =
            parse_all("select name, city into l_name, l_city from customer where id = l_id\nlet x = 1");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert_eq!(statements.len(), 2);
        let Statement::Sql(select) = &statements[0] else { panic!("expected sql") };
        assert_eq!(select.into.len(), 2);
        assert_eq!(select.tables(), vec!["customer"]);
        assert!(matches!(statements[1], Statement::Let(_)));
    }

    #[test]
    fn insert_with_nested_select() {
        let (statements, _, diagnostics) = parse_all("insert into audit select * from customer");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert_eq!(statements.len(), 1);
        let Statement::Sql(insert) = &statements[0] else { panic!("expected sql") };
        assert_eq!(insert.tables(), vec!["audit", "customer"]);
    }

    #[test]
    fn fetch_direction_and_targets() {
        let (statements, _, diagnostics) = parse_all("fetch next c_cust into l_rec.*\nfetch absolute 3 c_cust");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Statement::Cursor(fetch) = &statements[0] else { panic!("expected fetch") };
        assert_eq!(fetch.action, CursorAction::Fetch);
        assert_eq!(fetch.direction.as_deref(), Some("next"));
        assert_eq!(fetch.cursor.as_ref().map(|t| t.value.as_str()), Some("c_cust"));
        assert_eq!(fetch.into.len(), 1);
        let Statement::Cursor(absolute) = &statements[1] else { panic!("expected fetch") };
        assert_eq!(absolute.direction.as_deref(), Some("absolute"));
        assert!(absolute.offset.is_some());
    }

    #[test]
    fn fetch_cursor_named_like_direction() {
        let (statements, _, diagnostics) = parse_all("fetch next");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Statement::Cursor(fetch) = &statements[0] else { panic!("expected fetch") };
        assert_eq!(fetch.direction, None);
        assert_eq!(fetch.cursor.as_ref().map(|t| t.value.as_str()), Some("next"));
    }

    #[test]
    fn open_close_and_free() {
        let (statements, _, diagnostics) = parse_all("open c_cust using l_id\nclose c_cust\nfree c_cust");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let actions: Vec<_> = statements
            .iter()
            .map(|s| match s {
                Statement::Cursor(c) => c.action,
                _ => panic!("expected cursor statement"),
            })
            .collect();
        assert_eq!(actions, vec![CursorAction::Open, CursorAction::Close, CursorAction::Free]);
        assert_eq!(statements[0].label(), "open");
    }

    #[test]
    fn execute_forms() {
        let (statements, _, diagnostics) =
            parse_all("execute immediate \"delete from t\"\nexecute p1 using l_id into l_count");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Statement::Execute(immediate) = &statements[0] else { panic!("expected execute") };
        assert!(immediate.immediate.is_some());
        let Statement::Execute(prepared) = &statements[1] else { panic!("expected execute") };
        assert_eq!(prepared.using.len(), 1);
        assert_eq!(prepared.into.len(), 1);
    }

    #[test]
    fn sql_block_requires_terminator() {
        let (statements, _, diagnostics) = parse_all("sql select 1 from dual");
        assert_eq!(statements.len(), 1);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "A sql block must be terminated with \"end sql\".");

        let (statements, _, diagnostics) = parse_all("sql select 1 from dual end sql");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let Statement::SqlBlock(block) = &statements[0] else { panic!("expected sql block") };
        assert!(block.info.is_complete);
        assert_eq!(block.to_string(), "sql select 1 from dual end sql");
    }
}
