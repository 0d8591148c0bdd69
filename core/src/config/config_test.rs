#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::config::{CONFIG_FILE_NAME, GeneroConfig};

    #[test]
    fn empty_file_gives_defaults() {
        let config = GeneroConfig::from_toml("").expect("config");
        assert_eq!(config, GeneroConfig::default());
        assert!(!config.parser_options().allow_nested_select);
        let settings = config.analysis_settings();
        assert!(settings.skips_validation("SFMT"));
        assert!(settings.allows_non_star_record("base.TypeInfo.create"));
    }

    #[test]
    fn sections_use_camel_case_keys() {
        let text = r#"
[parser]
allowAnythingForFunctionParams = true
allowNestedSelect = true

[analysis]
skipValidationFunctions = ["my_printf"]
nonStarRecordFunctions = ["json.serialize"]

[completion]
contextMap = "/etc/genero/map.json"
"#;
        let config = GeneroConfig::from_toml(text).expect("config");
        let options = config.parser_options();
        assert!(options.allow_anything_for_function_params);
        assert!(options.allow_nested_select);

        let settings = config.analysis_settings();
        assert!(settings.skips_validation("MY_PRINTF"));
        assert!(settings.skips_validation("cast"));
        assert!(settings.allows_non_star_record("json.serialize"));
        assert_eq!(config.completion.context_map, Some(PathBuf::from("/etc/genero/map.json")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(GeneroConfig::from_toml("[parser]\nallowNested = true\n").is_err());
        assert!(GeneroConfig::from_toml("[editor]\n").is_err());
    }

    #[test]
    fn load_rebases_relative_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[completion]\ncontextMap = \"maps/ctx.json\"\n[project]\nincludePaths = [\"inc\", \"/abs\"]\n",
        )
        .expect("write");

        let config = GeneroConfig::load(&path).expect("load");
        assert_eq!(config.completion.context_map, Some(dir.path().join("maps/ctx.json")));
        assert_eq!(
            config.project.include_paths,
            vec![dir.path().join("inc"), PathBuf::from("/abs")]
        );
    }

    #[test]
    fn load_errors_name_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[parser\n").expect("write");
        let err = GeneroConfig::load(&path).expect_err("broken toml");
        assert!(format!("{:#}", err).contains(CONFIG_FILE_NAME));

        assert!(GeneroConfig::load(dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(GeneroConfig::discover(dir.path()).expect("defaults"), GeneroConfig::default());

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[parser]\nallowNestedSelect = true\n").expect("write");
        assert!(GeneroConfig::discover(dir.path()).expect("config").parser.allow_nested_select);
    }

    #[test]
    fn context_map_is_optional() {
        assert!(!GeneroConfig::default().apply_context_map().expect("no map"));

        let mut config = GeneroConfig::default();
        config.completion.context_map = Some(PathBuf::from("/nonexistent/genero/map.json"));
        assert!(config.apply_context_map().is_err());
    }
}
