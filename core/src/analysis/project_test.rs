#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        analysis::{AnalysisContext, AnalysisResult, Project, ProjectGraph},
        ast::{ParserOptions, parse_module},
    };

    #[test]
    fn modules_are_stored_by_path() {
        let project = Project::new("app");
        assert!(project.is_empty());
        project.parse_and_add("b.4gl", "main\nend main\n");
        project.parse_and_add("a.4gl", "function f()\nend function\n");
        assert_eq!(project.len(), 2);
        assert_eq!(project.paths(), vec!["a.4gl", "b.4gl"]);
        let module = project.get("a.4gl").expect("module");
        assert_eq!(module.file_path.as_deref(), Some("a.4gl"));
        assert!(module.function("F").is_some());
    }

    #[test]
    fn public_members_skip_private_declarations() {
        let project = Project::new("lib");
        project.parse_and_add(
            "lib.4gl",
            "public define shared int\nprivate define hidden int\npublic constant c_max = 10\nprivate function inner()\nend function\nfunction outer()\nend function\n",
        );
        let mut names: Vec<String> = project.public_members().iter().map(|r| r.name()).collect();
        names.sort();
        assert_eq!(names, vec!["c_max", "outer", "shared"]);
        assert!(matches!(project.find_public("SHARED"), Some(AnalysisResult::Variable(_))));
        assert!(project.find_public("hidden").is_none());
        assert!(project.find_public("inner").is_none());
    }

    #[test]
    fn includes_load_from_search_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("common.4gl"), "globals\n define g_count int\nend globals\n").expect("write");

        let project = Project::new("app").with_search_paths([dir.path().to_path_buf()]);
        let module = parse_module("globals \"common.4gl\"\nmain\nend main\n", &ParserOptions::default()).module;

        let included = project.included_modules(&module);
        assert_eq!(included.len(), 1);
        assert!(included[0].globals.variables.get("g_count").is_some());
        assert_eq!(project.len(), 1);

        // second lookup is served from the cache
        let again = project.included_modules(&module);
        assert!(Arc::ptr_eq(&included[0], &again[0]));

        let ctx = AnalysisContext::new(&module).with_project(&project);
        assert!(ctx.find("g_count").is_some());
    }

    #[test]
    fn missing_include_is_an_error() {
        let project = Project::new("app");
        let err = project.load_include("nowhere.4gl").expect_err("missing include");
        assert!(format!("{:#}", err).contains("nowhere.4gl"));

        let module = parse_module("globals \"nowhere.4gl\"\nmain\nend main\n", &ParserOptions::default()).module;
        assert!(project.included_modules(&module).is_empty());
    }

    #[test]
    fn references_are_shared() {
        let library = Arc::new(Project::new("lib"));
        library.parse_and_add("lib.4gl", "function helper()\nend function\n");
        let app = Project::new("app").with_reference(library.clone());
        let referenced = app.referenced_projects();
        assert_eq!(referenced.len(), 1);
        assert!(Arc::ptr_eq(&referenced[0], &library));
    }
}
