#[cfg(test)]
mod tests {
    use crate::{
        context::{ContextMap, SearchTarget, SetProvider, TokenKey},
        token::{Span, Token, TokenCategory, TokenKind},
    };

    #[test]
    fn embedded_map_parses() {
        let map = ContextMap::embedded().expect("embedded map");
        assert!(!map.is_empty());
        let define = map.get(TokenKey::Kind(TokenKind::Define)).expect("define trigger");
        assert_eq!(define.len(), 1);
        let identifier = map
            .get(TokenKey::Category(TokenCategory::Identifier))
            .expect("identifier trigger");
        assert!(identifier.iter().any(|p| p.providers.contains(&SetProvider::Types)));
    }

    #[test]
    fn keys_accept_texts_and_categories() {
        let json = r#"{ "contexts": [
            { "trigger": "@numeric", "possibilities": [ { "tokens": ["to"] } ] },
            { "trigger": "(", "possibilities": [
                { "providers": ["variables"], "backward": [ { "sequence": ["(", "call"] }, { "token": "end", "match": false } ] }
            ] }
        ] }"#;
        let map = ContextMap::from_json(json).expect("map");
        assert_eq!(map.len(), 2);

        let paren = map.get(TokenKey::Kind(TokenKind::LeftParenthesis)).expect("paren");
        let backward = &paren[0].backward;
        assert_eq!(
            backward[0].target,
            SearchTarget::Ordered(vec![
                TokenKey::Kind(TokenKind::LeftParenthesis),
                TokenKey::Kind(TokenKind::Call)
            ])
        );
        assert!(backward[0].matches);
        assert!(!backward[1].matches);

        let number = Token::new(TokenKind::NumberLiteral, TokenCategory::NumericLiteral, "1", Span::new(0, 1));
        let numeric = map.possibilities_for(&number).expect("category lookup");
        assert_eq!(numeric[0].tokens, vec![TokenKind::To]);
    }

    #[test]
    fn repeated_triggers_merge() {
        let json = r#"{ "contexts": [
            { "trigger": "let", "possibilities": [ { "providers": ["variables"] } ] },
            { "trigger": "LET", "possibilities": [ { "providers": ["constants"] } ] }
        ] }"#;
        let map = ContextMap::from_json(json).expect("map");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(TokenKey::Kind(TokenKind::Let)).map(|p| p.len()), Some(2));
    }

    #[test]
    fn malformed_definitions_are_rejected() {
        for json in [
            r#"{ "contexts": [ { "trigger": "nonsense_word", "possibilities": [] } ] }"#,
            r#"{ "contexts": [ { "trigger": "@bogus", "possibilities": [] } ] }"#,
            r#"{ "contexts": [ { "trigger": "let", "possibilities": [ { "providers": ["everything"] } ] } ] }"#,
            r#"{ "contexts": [ { "trigger": "let", "possibilities": [ { "backward": [ { "sequence": ["let"] } ] } ] } ] }"#,
            r#"{ "contexts": [ { "trigger": "let", "possibilities": [ { "backward": [ { "token": "let", "sequence": ["(", "let"] } ] } ] } ] }"#,
            "not json",
        ] {
            assert!(ContextMap::from_json(json).is_err(), "{}", json);
        }
    }

    #[test]
    fn reload_replaces_shared_map_and_keeps_it_on_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("map.json");
        std::fs::write(
            &path,
            r#"{ "contexts": [ { "trigger": "sleep", "possibilities": [ { "tokens": ["null"] } ] } ] }"#,
        )
        .expect("write");

        ContextMap::reload_from_path(&path).expect("reload");
        assert_eq!(ContextMap::current().len(), 1);

        std::fs::write(&path, "{ broken").expect("write");
        let err = ContextMap::reload_from_path(&path).expect_err("broken map");
        assert!(format!("{:#}", err).contains("map.json"));
        assert_eq!(ContextMap::current().len(), 1);

        assert!(ContextMap::reload_from_path(dir.path().join("missing.json")).is_err());

        ContextMap::reset().expect("reset");
        assert_eq!(ContextMap::current().len(), ContextMap::embedded().expect("embedded").len());
    }
}
