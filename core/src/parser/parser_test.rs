#[cfg(test)]
mod tests {
    use crate::{
        parser::{ExpressionParsingOptions, FunctionScope, ParseContext, Parser},
        token::{DiagnosticKind, Severity, Span, TokenKind, Tokenizer},
    };

    #[test]
    fn peek_is_one_based_and_stops_at_eof() {
        let tokens = Tokenizer::tokenize("end if");
        let mut parser = Parser::new(&tokens);
        assert!(parser.peek_kind(TokenKind::End));
        assert!(parser.peek_kind_n(TokenKind::If, 2));
        assert!(parser.peek_kind_n(TokenKind::EndOfFile, 3));
        assert!(parser.peek_kind_n(TokenKind::EndOfFile, 10));
        assert!(parser.peek_end(TokenKind::If));

        parser.next_token();
        parser.next_token();
        assert!(parser.at_eof());
        assert_eq!(parser.next_token().kind, TokenKind::EndOfFile);
        assert_eq!(parser.position(), 2);
        assert_eq!(parser.token().kind, TokenKind::EndOfFile);
    }

    #[test]
    fn token_is_last_consumed() {
        let tokens = Tokenizer::tokenize("let x = 1");
        let mut parser = Parser::new(&tokens);
        assert!(parser.accept(TokenKind::Let));
        assert!(!parser.accept(TokenKind::Equals));
        assert_eq!(parser.token().value, "let");
        parser.next_token();
        assert_eq!(parser.token().value, "x");
    }

    #[test]
    fn errors_are_reported_at_current_token() {
        let tokens = Tokenizer::tokenize("call foo");
        let mut parser = Parser::new(&tokens);
        parser.next_token();
        parser.next_token();
        parser.report_syntax_error("missing paren");
        parser.report_syntax_error_at("custom", 0, 4, Severity::Warning);
        assert_eq!(parser.error_count(), 2);
        assert_eq!(parser.diagnostics()[0].span, Span::new(5, 8));
        assert_eq!(parser.diagnostics()[0].kind, DiagnosticKind::Syntax);
        assert_eq!(parser.diagnostics()[1].severity, Severity::Warning);

        let mut sink = Vec::new();
        parser.drain_into(&mut sink);
        assert_eq!(sink.len(), 2);
        assert_eq!(parser.error_count(), 0);
    }

    #[test]
    fn block_marks_restore_enclosing_sets() {
        let mut ctx = ParseContext::new(ExpressionParsingOptions::default());
        let outer = ctx.push_block(TokenKind::For, Some(TokenKind::For), Some(TokenKind::For));
        let inner = ctx.push_block(TokenKind::If, None, None);
        assert!(ctx.is_end_keyword(TokenKind::If));
        assert!(ctx.allows_exit(TokenKind::For));
        assert_eq!(ctx.end_keywords(), &[TokenKind::For, TokenKind::If]);
        ctx.pop_block(inner);
        assert!(!ctx.is_end_keyword(TokenKind::If));
        ctx.pop_block(outer);
        assert!(!ctx.allows_continue(TokenKind::For));
        assert!(ctx.end_keywords().is_empty());
    }

    #[test]
    fn return_arity_binds_on_first_return() {
        let mut scope = FunctionScope::default();
        assert_eq!(scope.return_arity(), None);
        assert!(scope.bind_return(2, Span::new(0, 6)).is_ok());
        assert!(scope.bind_return(2, Span::new(10, 16)).is_ok());
        assert!(scope.bind_return(1, Span::new(20, 26)).is_err());
        assert_eq!(scope.return_arity(), Some(2));
    }
}
