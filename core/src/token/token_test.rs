#[cfg(test)]
mod tests {
    use crate::token::{
        LexState, ReverseTokenizer, TokenBuffer, TokenCategory, TokenKind, TokenWithSpan, Tokenizer, TokenizerOptions,
        unquote,
    };

    fn kinds(src: &str) -> Vec<TokenKind> {
        Tokenizer::tokenize(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn verbatim_line_with_comment_has_five_tokens() {
        let tokens = Tokenizer::tokenize_with("let x = 3 # this is a comment", TokenizerOptions::verbatim());
        // trailing EOF is not counted
        assert_eq!(tokens.len() - 1, 5);
        assert_eq!(tokens[4].category, TokenCategory::Comment);
        assert_eq!(tokens[4].value, "# this is a comment");
    }

    #[test]
    fn stream_ends_with_one_eof_at_the_end_of_input() {
        assert_eq!(kinds(""), vec![TokenKind::EndOfFile]);
        let tokens = Tokenizer::tokenize("main\n");
        let last = tokens.last().expect("eof");
        assert_eq!(last.kind, TokenKind::EndOfFile);
        assert_eq!(last.span.start, 5);
        assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::EndOfFile).count(), 1);
    }

    #[test]
    fn parser_stream_skips_trivia() {
        let k = kinds("let x = 3 -- note\n{ block\ncomment } display x");
        assert_eq!(
            k,
            vec![
                TokenKind::Let,
                TokenKind::Ident,
                TokenKind::Equals,
                TokenKind::NumberLiteral,
                TokenKind::Display,
                TokenKind::Ident,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let tokens = Tokenizer::tokenize("END If Foreach");
        assert_eq!(tokens[0].kind, TokenKind::End);
        assert_eq!(tokens[1].kind, TokenKind::If);
        assert_eq!(tokens[2].kind, TokenKind::Foreach);
        assert_eq!(tokens[1].value, "If");
        assert!(tokens.iter().take(3).all(|t| t.category == TokenCategory::Keyword));
    }

    #[test]
    fn multi_char_operators_are_single_char_tokens() {
        assert_eq!(
            kinds("<= <> != == || **"),
            vec![
                TokenKind::LessThan,
                TokenKind::Equals,
                TokenKind::LessThan,
                TokenKind::GreaterThan,
                TokenKind::Exclamation,
                TokenKind::Equals,
                TokenKind::Equals,
                TokenKind::Equals,
                TokenKind::SingleBar,
                TokenKind::SingleBar,
                TokenKind::Power,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn numbers_and_strings() {
        let tokens = Tokenizer::tokenize(r#"12 3.25 1e5 "a\"b" 'c'"#);
        assert_eq!(tokens[0].value, "12");
        assert_eq!(tokens[1].value, "3.25");
        assert_eq!(tokens[2].value, "1e5");
        assert!(tokens[..3].iter().all(|t| t.category == TokenCategory::NumericLiteral));
        assert_eq!(tokens[3].category, TokenCategory::StringLiteral);
        assert_eq!(unquote(&tokens[3].value), "a\"b");
        assert_eq!(tokens[4].category, TokenCategory::CharacterLiteral);
    }

    #[test]
    fn member_access_dot_is_not_a_number() {
        assert_eq!(
            kinds("r.* a.b"),
            vec![
                TokenKind::Ident,
                TokenKind::Dot,
                TokenKind::Multiply,
                TokenKind::Ident,
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_incomplete_literal() {
        let tokens = Tokenizer::tokenize("let s = \"abc");
        assert_eq!(tokens[3].category, TokenCategory::IncompleteMultiLineStringLiteral);
        assert_eq!(tokens[4].kind, TokenKind::EndOfFile);
    }

    #[test]
    fn line_tokenization_carries_string_state() {
        let (first, state) = Tokenizer::tokenize_line("let s = \"abc", LexState::Normal, TokenizerOptions::default());
        assert_eq!(state, LexState::InString('"'));
        assert_eq!(first.last().map(|t| t.category), Some(TokenCategory::IncompleteMultiLineStringLiteral));

        let (second, state) = Tokenizer::tokenize_line("def\" display s", state, TokenizerOptions::default());
        assert_eq!(state, LexState::Normal);
        assert_eq!(second[0].category, TokenCategory::StringLiteral);
        assert_eq!(second[0].value, "def\"");
        assert_eq!(second[1].kind, TokenKind::Display);
    }

    #[test]
    fn line_tokenization_carries_block_comment_state() {
        let options = TokenizerOptions::verbatim();
        let (_, state) = Tokenizer::tokenize_line("let x = 1 { start", LexState::Normal, options);
        assert_eq!(state, LexState::BlockComment);
        let (tokens, state) = Tokenizer::tokenize_line("still } let y = 2", state, options);
        assert_eq!(state, LexState::Normal);
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[1].kind, TokenKind::Let);
    }

    #[test]
    fn reverse_tokens_replay_backward() {
        let buffer = TokenBuffer::from_source("call foo(a, b)");
        let back: Vec<String> = buffer.reverse_tokens(11).map(|t| t.value).collect();
        assert_eq!(back, vec![",", "a", "(", "foo", "call"]);
    }

    #[test]
    fn token_with_span_ignores_case() {
        let tokens = Tokenizer::tokenize("Abc aBC");
        let a = TokenWithSpan::new(tokens[0].clone());
        let b = TokenWithSpan::new(tokens[1].clone());
        assert_eq!(a, b);
        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn from_text_resolves_symbols_and_keywords() {
        assert_eq!(TokenKind::from_text("("), Some(TokenKind::LeftParenthesis));
        assert_eq!(TokenKind::from_text("DEFINE"), Some(TokenKind::Define));
        assert_eq!(TokenKind::from_text("nope"), None);
    }
}
