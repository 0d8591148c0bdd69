#[cfg(test)]
mod tests {
    use crate::token::{LexState, ReverseTokenizer, TokenCache, TokenKind};

    #[test]
    fn refresh_tokenizes_every_line_once() {
        let text = "main\n  let x = 1\nend main";
        let mut cache = TokenCache::new();
        assert_eq!(cache.refresh(text, 0), 3);
        assert_eq!(cache.len(), 3);
        let line1 = cache.try_get_tokenization(1).unwrap();
        assert_eq!(line1.tokens[0].kind, TokenKind::Let);
        assert_eq!(line1.tokens[0].span.start, 2);
    }

    #[test]
    fn refresh_stops_when_state_resynchronises() {
        let text = "main\n  let x = 1\n  let y = 2\n  let z = 3\nend main";
        let mut cache = TokenCache::new();
        cache.refresh(text, 0);

        let edited = "main\n  let x = 10\n  let y = 2\n  let z = 3\nend main";
        let lexed = cache.refresh(edited, 1);
        // the edited line plus the first unchanged line after it
        assert_eq!(lexed, 2);
        let line1 = cache.try_get_tokenization(1).unwrap();
        assert_eq!(line1.tokens[3].value, "10");
    }

    #[test]
    fn opening_a_block_comment_relexes_following_lines() {
        let text = "let a = 1\nlet b = 2\nlet c = 3";
        let mut cache = TokenCache::new();
        cache.refresh(text, 0);

        let edited = "let a = 1 {\nlet b = 2\nlet c = 3";
        let lexed = cache.refresh(edited, 0);
        assert_eq!(lexed, 3);
        assert_eq!(cache.try_get_tokenization(2).unwrap().state, LexState::BlockComment);
    }

    #[test]
    fn insert_and_delete_lines_shift_entries() {
        let mut cache = TokenCache::new();
        cache.refresh("let a = 1\nlet b = 2", 0);
        cache.insert_lines(1, 2);
        assert_eq!(cache.len(), 4);
        assert!(cache.try_get_tokenization(1).is_none());
        assert!(cache.try_get_tokenization(3).is_some());

        let (line, _) = cache.index_of_previous_tokenization(2, 0).unwrap();
        assert_eq!(line, 0);
        assert!(cache.index_of_previous_tokenization(2, 1).is_none());

        cache.delete_lines(1, 2);
        assert_eq!(cache.len(), 2);
        assert!(cache.try_get_tokenization(1).is_some());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn cached_view_replays_absolute_tokens() {
        let text = "let a = 1\ncall f(a)";
        let mut cache = TokenCache::new();
        cache.refresh(text, 0);
        let view = cache.view(text);
        let back: Vec<(String, usize)> = view.reverse_tokens(17).map(|t| (t.value, t.span.start)).collect();
        assert_eq!(back[0], ("(".to_string(), 16));
        assert_eq!(back[1], ("f".to_string(), 15));
        assert_eq!(back[2], ("call".to_string(), 10));
        assert_eq!(back[3], ("1".to_string(), 8));
    }
}
