#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use crate::{
        analysis::{
            AnalysisContext, AnalysisResult, DatabaseInformationProvider, MemberKind, MemberResult, MemberType,
            Project, StaticProjectGraph,
        },
        ast::{ModuleNode, ParserOptions, parse_module},
        stmt::Statement,
        token::TokenKind,
    };

    fn parse(src: &str) -> ModuleNode {
        let output = parse_module(src, &ParserOptions::default());
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        output.module
    }

    #[derive(Default)]
    struct CountingDatabase {
        calls: AtomicUsize,
    }

    impl DatabaseInformationProvider for CountingDatabase {
        fn column_type(&self, table: &str, column: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match (table, column) {
                ("customer", "id") => Some("integer".to_string()),
                ("customer", "name") => Some("char(30)".to_string()),
                _ => None,
            }
        }

        fn table_columns(&self, table: &str) -> Vec<(String, String)> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if table == "customer" {
                vec![
                    ("id".to_string(), "integer".to_string()),
                    ("name".to_string(), "char(30)".to_string()),
                ]
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn resolved_type_is_memoized() {
        let module = parse("type t_cust record\n id int,\n name string\nend record\ndefine r t_cust\n");
        let ctx = AnalysisContext::new(&module);
        let var = module.symbols.variables.get("r").expect("module variable");
        let first = ctx.resolved_type(&var.type_ref).expect("resolved");
        let second = ctx.resolved_type(&var.type_ref).expect("resolved");
        assert!(std::ptr::eq(first, second));
        assert!(matches!(first, AnalysisResult::Type(def) if def.name == "t_cust"));
    }

    #[test]
    fn mimic_lookup_hits_database_once() {
        let module = parse("define r record like customer.*\n");
        let db = CountingDatabase::default();
        let ctx = AnalysisContext::new(&module).with_database(&db);
        let var = module.symbols.variables.get("r").expect("module variable");

        let names: Vec<String> = ctx.type_members(&var.type_ref).iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["id", "name"]);
        let calls = db.calls.load(Ordering::SeqCst);
        assert_eq!(calls, 1);

        ctx.type_members(&var.type_ref);
        ctx.record_field_count(&var.type_ref);
        assert_eq!(db.calls.load(Ordering::SeqCst), calls);
    }

    #[test]
    fn locals_shadow_module_variables() {
        let src = "define x int\nfunction f()\n define x string\n let x = \"a\"\nend function\n";
        let module = parse(src);
        let inside = src.find("let").expect("let");

        let local = AnalysisContext::new(&module).at_offset(inside).find("x").expect("x");
        assert_eq!(local.documentation(), "(local variable) x string");

        let outer = AnalysisContext::new(&module).find("X").expect("x");
        assert_eq!(outer.documentation(), "(module variable) x int");
    }

    #[test]
    fn module_variable_type_ignores_local_type_of_the_same_name() {
        let src = "type t record a int, b int end record\ndefine m t\n\
                   function f()\n type t record x int end record\n define l t\n let m.a = 1\nend function\n\
                   function g()\n let m.a = 1\nend function\n";
        let module = parse(src);
        let fields = |ctx: &AnalysisContext, name: &str| -> Vec<String> {
            let value = ctx.find(name).expect("variable");
            value.get_members(ctx).iter().map(|m| m.name.clone()).collect()
        };

        let in_f = AnalysisContext::new(&module).with_function(module.function("f").expect("f"));
        assert_eq!(fields(&in_f, "m"), vec!["a", "b"]);
        assert_eq!(fields(&in_f, "l"), vec!["x"]);

        let in_g = AnalysisContext::new(&module).with_function(module.function("g").expect("g"));
        assert_eq!(fields(&in_g, "m"), vec!["a", "b"]);
    }

    #[test]
    fn included_global_type_resolves_in_its_own_module() {
        let common = parse("globals\n type t record a int end record\n define g t\nend globals\n");
        let module = parse("globals \"common.4gl\"\ntype t record x int end record\nmain\nend main\n");
        let graph = StaticProjectGraph::new().with_include("common.4gl", common);

        let ctx = AnalysisContext::new(&module).with_project(&graph);
        let g = ctx.find("g").expect("global from include");
        let names: Vec<String> = g.get_members(&ctx).iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn included_globals_are_visible() {
        let common = parse("globals\n define g_user string\nend globals\n");
        let module = parse("globals \"../common.4gl\"\nmain\n let g_user = \"admin\"\nend main\n");
        let graph = StaticProjectGraph::new().with_include("Common.4gl", common);

        let without = AnalysisContext::new(&module);
        assert!(without.find("g_user").is_none());

        let ctx = AnalysisContext::new(&module).with_project(&graph);
        let found = ctx.find("g_user").expect("global from include");
        assert_eq!(found.documentation(), "(global variable) g_user string");
    }

    #[test]
    fn referenced_projects_export_public_functions_only() {
        let library = Project::new("lib");
        library.parse_and_add(
            "lib.4gl",
            "public function helper(a)\n define a int\nend function\nprivate function hidden()\nend function\n",
        );
        let graph = StaticProjectGraph::new().with_reference(Arc::new(library));
        let module = parse("main\nend main\n");
        let ctx = AnalysisContext::new(&module).with_project(&graph);

        assert!(matches!(ctx.find("helper"), Some(AnalysisResult::Function(f)) if f.name == "helper"));
        assert!(ctx.find("hidden").is_none());
    }

    #[test]
    fn builtins_come_last() {
        let module = parse("function length(s)\n define s string\n return 1\nend function\n");
        let ctx = AnalysisContext::new(&module);
        assert!(matches!(ctx.find("length"), Some(AnalysisResult::Function(_))));
        assert!(matches!(ctx.find("upshift"), Some(AnalysisResult::BuiltinFunction(f)) if f.name == "upshift"));

        let sqlca = ctx.find("sqlca").expect("sqlca");
        let code = sqlca.get_member("SQLCODE", &ctx).expect("field");
        assert_eq!(code.documentation(), "(record field) sqlcode int");
    }

    #[test]
    fn builtin_documentation_format() {
        let module = parse("main\nend main\n");
        let ctx = AnalysisContext::new(&module);
        let upshift = ctx.find("upshift").expect("upshift");
        assert!(upshift.documentation().starts_with("(system function) string upshift(string str)"));
        let set_count = ctx.find("set_count").expect("set_count");
        assert!(set_count.documentation().starts_with("(system function) void set_count(int count)"));
    }

    #[test]
    fn chained_builtin_calls_resolve_through_return_types() {
        let src = "main\n define f ui.Form\n let f = ui.Window.getCurrent().getForm()\nend main\n";
        let module = parse(src);
        let main = module.function("main").expect("main");
        let ctx = AnalysisContext::new(&module).with_function(main);
        let Statement::Let(statement) = &main.body[0] else { panic!("expected let") };
        let call = statement.values[0].as_call().expect("call");

        let resolved = ctx.resolve_call(call).expect("resolved");
        assert!(matches!(resolved, AnalysisResult::BuiltinFunction(f) if f.name == "getForm"));

        let form = ctx.find("f").expect("f");
        let names: Vec<String> = form.get_members(&ctx).iter().map(|m| m.name.clone()).collect();
        assert!(names.contains(&"setFieldHidden".to_string()));
    }

    #[test]
    fn record_fields_and_array_elements() {
        let src = "define arr dynamic array of record\n id int,\n name string\nend record\n";
        let module = parse(src);
        let ctx = AnalysisContext::new(&module);
        let arr = ctx.find("arr").expect("arr");

        let methods: Vec<String> = arr.get_members(&ctx).iter().map(|m| m.name.clone()).collect();
        assert!(methods.contains(&"getLength".to_string()));

        let output = parse_module("main\n let arr[1].name = \"x\"\nend main\n", &ParserOptions::default());
        let main = output.module.function("main").expect("main");
        let Statement::Let(statement) = &main.body[0] else { panic!("expected let") };
        let target = statement.variable.as_ref().expect("target");
        let field = ctx.resolve_name(target).expect("field");
        assert_eq!(field.documentation(), "(record field) name string");
    }

    #[test]
    fn scope_members_list_nearest_first_without_duplicates() {
        let src = "define x int\nfunction f()\n define x string\n define y int\n let y = 1\nend function\n";
        let module = parse(src);
        let ctx = AnalysisContext::new(&module).at_offset(src.find("let").expect("let"));
        let variables = ctx.get_members(MemberKind::Variables);
        let xs: Vec<&MemberResult> = variables.iter().filter(|m| m.name == "x").collect();
        assert_eq!(xs.len(), 1);
        assert_eq!(xs[0].documentation(), "(local variable) x string");
        assert!(variables.iter().any(|m| m.name == "status"));
        assert!(variables.iter().all(|m| m.member_type() == MemberType::Variable));
    }

    #[test]
    fn member_result_projection() {
        let keyword = MemberResult::keyword(TokenKind::Define);
        assert_eq!(keyword.name, "define");
        assert_eq!(keyword.member_type(), MemberType::Keyword);
        assert!(keyword.location().is_none());

        let module = parse_module(
            "main\n define total decimal(8,2)\nend main\n",
            &ParserOptions::default().with_file_path("sales.4gl"),
        )
        .module;
        let main = module.function("main").expect("main");
        let ctx = AnalysisContext::new(&module).with_function(main);
        let member = MemberResult::from_result(ctx.find("total").expect("total"));
        assert_eq!(member.member_type(), MemberType::Variable);
        assert_eq!(member.documentation(), "(local variable) total decimal(8,2)");
        let location = member.location().expect("stamped");
        assert_eq!(location.file_path.as_deref(), Some("sales.4gl"));
        assert_eq!((location.line, location.column), (2, 9));
    }

    #[test]
    fn function_documentation_includes_comment_and_returns() {
        let src = "-- Looks up a customer name.\nfunction get_name(id)\n define id int\n define n string\n return n\nend function\n";
        let module = parse(src);
        let ctx = AnalysisContext::new(&module);
        let function = ctx.find("get_name").expect("function");
        assert_eq!(
            function.documentation(),
            "(public function) string get_name(int id)\n\nLooks up a customer name."
        );

        let module = parse("private function pair()\n return 1, \"a\"\nend function\n");
        let ctx = AnalysisContext::new(&module);
        assert_eq!(
            ctx.find("pair").expect("pair").documentation(),
            "(private function) pair()\nreturning int, string"
        );
    }
}
