#[cfg(test)]
mod tests {
    use crate::{
        analysis::{AnalysisContext, MemberType},
        ast::{ParserOptions, parse_module},
        context::{ContextMap, get_context_members_with, statement_start_keywords},
        token::TokenBuffer,
    };

    /// Completes at the `^` in `marked`.
    fn complete_with(marked: &str, map: &ContextMap) -> Vec<String> {
        let caret = marked.find('^').expect("caret marker");
        let source = marked.replacen('^', "", 1);
        let module = parse_module(&source, &ParserOptions::default()).module;
        let tokens = TokenBuffer::from_source(&source);
        let ctx = AnalysisContext::new(&module).at_offset(caret);
        get_context_members_with(caret, &tokens, &ctx, map)
            .into_iter()
            .map(|m| m.name)
            .collect()
    }

    fn complete(marked: &str) -> Vec<String> {
        complete_with(marked, &ContextMap::embedded().expect("embedded map"))
    }

    fn keywords() -> Vec<String> {
        statement_start_keywords().into_iter().map(|m| m.name).collect()
    }

    fn has(names: &[String], name: &str) -> bool {
        names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    #[test]
    fn record_member_access_lists_only_fields() {
        let src = "define r record\n  id int,\n  name string\nend record\nmain\n  let r.^\nend main\n";
        assert_eq!(complete(src), vec!["id", "name"]);
    }

    #[test]
    fn member_access_follows_call_chains() {
        let src = "main\n  define w ui.Form\n  let w = ui.Window.getCurrent().^\nend main\n";
        let names = complete(src);
        assert!(has(&names, "getForm"), "{:?}", names);
        assert!(!has(&names, "let"));
    }

    #[test]
    fn member_access_on_unknown_name_is_empty() {
        let src = "main\n  let zz.^\nend main\n";
        assert!(complete(src).is_empty());
    }

    #[test]
    fn package_members_after_dot() {
        let names = complete("main\n  define x int\n  let x = ui.^\nend main\n");
        assert!(has(&names, "Window"), "{:?}", names);
    }

    #[test]
    fn fresh_line_offers_statement_keywords() {
        assert_eq!(complete("main\n^\nend main\n"), keywords());
        assert_eq!(complete("^"), keywords());
    }

    #[test]
    fn value_at_end_of_line_also_offers_statements() {
        let names = complete("main\n  define x int\n  let x = 1\n  ^\nend main\n");
        assert!(has(&names, "and"));
        assert!(has(&names, "let"));

        let same_line = complete("main\n  define x int\n  let x = 1 ^\nend main\n");
        assert!(has(&same_line, "and"));
        assert!(!has(&same_line, "let"));
    }

    #[test]
    fn declaration_after_builtin_type_starts_new_statement() {
        let names = complete("main\n  define x int\n  ^\nend main\n");
        assert!(has(&names, "define"));
        assert!(complete("main\n  define x int ^\nend main\n").is_empty());
    }

    #[test]
    fn closed_statement_at_end_of_line_offers_statements() {
        let exit_while = complete("main\n define i int\n while i\n  exit while\n  ^\n end while\nend main\n");
        assert!(has(&exit_while, "let"), "{:?}", exit_while);

        let continue_for = complete("main\n define i int\n for i = 1 to 3\n  continue for\n  ^\n end for\nend main\n");
        assert!(has(&continue_for, "let"), "{:?}", continue_for);

        let end_record = complete("main\n define r record a int end record\n ^\nend main\n");
        assert!(has(&end_record, "let"), "{:?}", end_record);
        assert!(complete("main\n define r record a int end record ^\nend main\n").is_empty());

        let clipped = complete("main\n define s string\n let s = s clipped\n ^\nend main\n");
        assert!(has(&clipped, "let"), "{:?}", clipped);
        assert!(has(&clipped, "and"), "{:?}", clipped);
    }

    #[test]
    fn record_opened_at_end_of_line_waits_for_fields() {
        assert!(!has(&complete("main\n define r record\n ^\nend main\n"), "let"));
    }

    #[test]
    fn define_offers_types() {
        let src = "type t_customer record\n  id int\nend record\nmain\n  define x ^\nend main\n";
        let names = complete(src);
        for expected in ["like", "record", "dynamic", "array", "string", "t_customer"] {
            assert!(has(&names, expected), "{} missing from {:?}", expected, names);
        }

        let second = complete("main\n  define a int, b ^\nend main\n");
        assert!(has(&second, "decimal"));
    }

    #[test]
    fn let_target_offers_assignment() {
        assert_eq!(complete("main\n  define x int\n  let x ^\nend main\n"), vec!["="]);
    }

    #[test]
    fn let_offers_variables() {
        let names = complete("define counter int\nmain\n  let ^\nend main\n");
        assert!(has(&names, "counter"));
        assert!(!has(&names, "upshift"));
    }

    #[test]
    fn call_offers_functions() {
        let names = complete("function helper()\nend function\nmain\n  call ^\nend main\n");
        assert!(has(&names, "helper"));
        assert!(has(&names, "upshift"));
    }

    #[test]
    fn partial_word_is_ignored() {
        let names = complete("define counter int\nmain\n  let counter = cou^\nend main\n");
        assert!(has(&names, "counter"));
        assert!(has(&names, "null"));
    }

    #[test]
    fn exit_offers_block_kinds() {
        let names = complete("main\n  while true\n    exit ^\n  end while\nend main\n");
        assert!(has(&names, "while"));
        assert!(has(&names, "program"));
        assert!(!has(&names, "let"));
    }

    #[test]
    fn candidates_are_deduplicated() {
        let json = r#"{ "contexts": [
            { "trigger": "call", "possibilities": [ { "tokens": ["null", "NULL"], "providers": ["functions", "functions"] } ] }
        ] }"#;
        let map = ContextMap::from_json(json).expect("map");
        let names = complete_with("function f()\nend function\nmain\n  call ^\nend main\n", &map);
        assert_eq!(names.iter().filter(|n| n.eq_ignore_ascii_case("null")).count(), 1);
        assert_eq!(names.iter().filter(|n| n.as_str() == "f").count(), 1);
    }

    #[test]
    fn keyword_candidates_are_typed() {
        let source = "main\n  define x int\n  let x \nend main\n";
        let caret = source.find("let x ").expect("let") + "let x ".len();
        let module = parse_module(source, &ParserOptions::default()).module;
        let tokens = TokenBuffer::from_source(source);
        let ctx = AnalysisContext::new(&module).at_offset(caret);
        let map = ContextMap::embedded().expect("map");
        let members = get_context_members_with(caret, &tokens, &ctx, &map);
        assert!(members.iter().all(|m| m.member_type() == MemberType::Keyword));
    }

    const PRIORITY_MAP: &str = r#"{ "contexts": [
        { "trigger": "@identifier", "possibilities": [
            { "tokens": ["into"], "backward": [ { "token": "(" } ] },
            { "tokens": ["returning"], "backward": [ { "sequence": ["(", "call"] } ] },
            { "tokens": ["and"], "backward": [ { "token": "=" } ] },
            { "tokens": ["or"], "backward": [ { "token": "=" } ] },
            { "tokens": ["then"], "backward": [ { "token": "end", "match": false } ] },
            { "tokens": ["else"], "backward": [ { "token": "if" } ] }
        ] },
        { "trigger": "@numeric", "possibilities": [
            { "tokens": ["to"], "backward": [ { "token": "for" } ] },
            { "tokens": ["step"] }
        ] }
    ] }"#;

    fn priority(marked: &str) -> Vec<String> {
        complete_with(marked, &ContextMap::from_json(PRIORITY_MAP).expect("map"))
    }

    #[test]
    fn ordered_sequence_beats_single_token() {
        assert_eq!(priority("main\n  call f(x ^\nend main\n"), vec!["returning"]);
        assert_eq!(priority("main\n  let y = f(x ^\nend main\n"), vec!["into"]);
    }

    #[test]
    fn singles_at_the_same_token_union() {
        assert_eq!(priority("main\n  let y = x ^\nend main\n"), vec!["and", "or"]);
    }

    #[test]
    fn positive_guard_wins_over_non_matching_guard() {
        assert_eq!(priority("main\n  if x ^\nend main\n"), vec!["else"]);
    }

    #[test]
    fn non_matching_guard_applies_when_its_token_is_absent() {
        assert_eq!(priority("main\n  while x ^\nend main\n"), vec!["then"]);
    }

    #[test]
    fn non_matching_guard_rejects_when_its_token_is_present() {
        assert_eq!(priority("main\n  end x ^\nend main\n"), keywords());
    }

    #[test]
    fn statement_keyword_stops_the_backward_search() {
        let json = r#"{ "contexts": [
            { "trigger": "@identifier", "possibilities": [ { "tokens": ["into"], "backward": [ { "token": "(" } ] } ] }
        ] }"#;
        let map = ContextMap::from_json(json).expect("map");
        // the `(` of the earlier line is behind `let`
        assert_eq!(complete_with("main\n  call f(\n  let b ^\nend main\n", &map), keywords());
        assert_eq!(complete_with("main\n  call f(b ^\nend main\n", &map), vec!["into"]);
    }

    #[test]
    fn unguarded_possibility_is_the_fallback() {
        assert_eq!(priority("main\n  let y = 1 ^\nend main\n"), vec!["step"]);
        assert_eq!(priority("main\n  for i = 1 ^\nend main\n"), vec!["to"]);
    }
}
