#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        analysis::{
            AnalysisContext, AnalysisSettings, ExternalFunction, FunctionProvider, Project, StaticProjectGraph,
            check_module, resolve_deferred_searches,
        },
        ast::{ParserOptions, parse_module},
        token::Diagnostic,
    };

    const RECORDS: &str = "type t_pair record\n a int,\n b string\nend record\n\
        function take_pair(p)\n define p t_pair\nend function\n\
        function take_three(x, y, z)\n define x, y, z int\nend function\n";

    fn check(src: &str) -> Vec<String> {
        check_with(src, AnalysisSettings::default())
    }

    fn check_with(src: &str, settings: AnalysisSettings) -> Vec<String> {
        let output = parse_module(src, &ParserOptions::default());
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let ctx = AnalysisContext::new(&output.module).with_settings(settings);
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let deferred = check_module(&ctx, &mut diagnostics);
        resolve_deferred_searches(deferred, &ctx, &mut diagnostics);
        diagnostics.into_iter().map(|d| d.message).collect()
    }

    #[test]
    fn matching_argument_count_is_clean() {
        let src = format!("{}main\n call take_three(1, 2, 3)\nend main\n", RECORDS);
        assert!(check(&src).is_empty());
    }

    #[test]
    fn argument_count_off_by_one_reports_once() {
        for args in ["1, 2", "1, 2, 3, 4"] {
            let src = format!("{}main\n call take_three({})\nend main\n", RECORDS, args);
            let messages = check(&src);
            assert_eq!(messages.len(), 1, "{:?}", messages);
            assert!(messages[0].starts_with("Unexpected number of parameters"));
            assert!(messages[0].ends_with("expected 3 variables."));
        }
    }

    #[test]
    fn record_argument_needs_star() {
        let src = format!("{}main\n define r t_pair\n call take_pair(r)\nend main\n", RECORDS);
        let messages = check(&src);
        assert_eq!(
            messages,
            vec![
                "Records must be specified with a '.*' ending when passed as a function parameter.",
                "Unexpected number of parameters (1) found, expected 2 variables.",
            ]
        );
    }

    #[test]
    fn star_expands_to_field_count() {
        let ok = format!("{}main\n define r t_pair\n call take_pair(r.*)\nend main\n", RECORDS);
        assert!(check(&ok).is_empty());

        let src = format!("{}main\n define r t_pair\n call take_three(r.*)\nend main\n", RECORDS);
        assert_eq!(
            check(&src),
            vec!["Unexpected number of parameters (2) found, expected 3 variables."]
        );
    }

    #[test]
    fn builtin_arity_is_checked() {
        let messages = check("main\n define s string\n let s = upshift(s, s)\nend main\n");
        assert_eq!(messages, vec!["Unexpected number of parameters (2) found, expected 1 variables."]);
    }

    #[test]
    fn skip_list_suppresses_checks() {
        let src = "main\n define s string\n let s = sfmt(\"%1 %2\", 1, 2)\n let s = upshift(s, s)\nend main\n";
        assert_eq!(check(src).len(), 1);

        let settings = AnalysisSettings::default().with_skip_validation(["UPSHIFT"]);
        assert!(check_with(src, settings).is_empty());
    }

    #[test]
    fn allow_list_accepts_records_without_star() {
        let src = format!("{}main\n define r t_pair\n call take_pair(r)\nend main\n", RECORDS);
        let settings = AnalysisSettings::default().with_non_star_record(["take_pair"]);
        let messages = check_with(&src, settings);
        assert!(messages.iter().all(|m| !m.starts_with("Records must")), "{:?}", messages);
    }

    #[test]
    fn unknown_types_and_unbound_parameters() {
        let messages = check("define c t_missing\nfunction f(a)\nend function\n");
        assert!(messages.contains(&"Type t_missing not found.".to_string()), "{:?}", messages);
        assert!(messages.contains(&"No definition found for parameter a".to_string()), "{:?}", messages);
    }

    #[test]
    fn undefined_names_and_members() {
        let messages = check(
            "type t_pair record\n a int\nend record\nmain\n define r t_pair\n let r.zz = 1\n let nope = 2\nend main\n",
        );
        assert!(messages.contains(&"zz is not a member of r.".to_string()), "{:?}", messages);
        assert!(messages.contains(&"No definition found for nope.".to_string()), "{:?}", messages);
    }

    #[test]
    fn unknown_functions_are_deferred_then_reported() {
        let output = parse_module("main\n call elsewhere(1)\nend main\n", &ParserOptions::default());
        let ctx = AnalysisContext::new(&output.module);
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let deferred = check_module(&ctx, &mut diagnostics);
        assert!(diagnostics.is_empty());
        assert_eq!(deferred.len(), 1);
        assert_eq!(deferred[0].name, "elsewhere");
        assert_eq!(deferred[0].argument_count, 1);

        let unresolved = resolve_deferred_searches(deferred, &ctx, &mut diagnostics);
        assert_eq!(unresolved.len(), 1);
        assert_eq!(diagnostics[0].message, "Function elsewhere not found.");
    }

    struct Catalogue;

    impl FunctionProvider for Catalogue {
        fn find_function(&self, name: &str) -> Option<ExternalFunction> {
            name.eq_ignore_ascii_case("elsewhere").then(|| ExternalFunction {
                name: "elsewhere".to_string(),
                parameters: vec![("a".to_string(), "int".to_string()), ("b".to_string(), "int".to_string())],
                ..Default::default()
            })
        }
    }

    #[test]
    fn deferred_searches_use_providers_and_references() {
        let output = parse_module("main\n call elsewhere(1)\n call helper()\nend main\n", &ParserOptions::default());
        let library = Project::new("lib");
        library.parse_and_add("lib.4gl", "function helper()\nend function\n");
        let graph = StaticProjectGraph::new().with_reference(Arc::new(library));
        let ctx = AnalysisContext::new(&output.module)
            .with_functions(&Catalogue)
            .with_project(&graph);

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let deferred = check_module(&ctx, &mut diagnostics);
        // helper resolves through the referenced project before deferral
        assert_eq!(deferred.len(), 1);
        let unresolved = resolve_deferred_searches(deferred, &ctx, &mut diagnostics);
        assert!(unresolved.is_empty());
        let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["Unexpected number of parameters (1) found, expected 2 variables."]);
    }

    #[test]
    fn java_and_fgl_imports() {
        let src = "import java java.util.ArrayList\nimport fgl utils\nmain\n call ArrayList.create()\n call utils.run(1)\nend main\n";
        let output = parse_module(src, &ParserOptions::default());
        let ctx = AnalysisContext::new(&output.module);
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let deferred = check_module(&ctx, &mut diagnostics);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert_eq!(deferred.len(), 1);
        assert_eq!(deferred[0].name, "run");
    }
}
