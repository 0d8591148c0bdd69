#[cfg(test)]
mod tests {
    use crate::{
        parser::Parser,
        token::{TokenKind, Tokenizer},
        typ::{ConstraintResult, verify_valid_constraint},
    };

    fn constraint(src: &str, optional: bool) -> (ConstraintResult, usize) {
        let tokens = Tokenizer::tokenize(src);
        let mut parser = Parser::new(&tokens);
        let head = parser.next_token().kind;
        let result = verify_valid_constraint(&mut parser, head, false, optional);
        (result, parser.error_count())
    }

    #[test]
    fn decimal_precision_and_scale() {
        assert_eq!(constraint("decimal(8,2)", true).0.text(), Some("decimal(8,2)"));
        assert_eq!(constraint("money(10)", true).0.text(), Some("money(10)"));
        assert_eq!(constraint("decimal", true), (ConstraintResult::Unconstrained, 0));
    }

    #[test]
    fn decimal_missing_scale() {
        let (result, errors) = constraint("decimal(8,)", true);
        assert_eq!(result, ConstraintResult::Invalid);
        assert_eq!(errors, 1);
    }

    #[test]
    fn character_sizes() {
        assert_eq!(constraint("varchar(20)", true).0.text(), Some("varchar(20)"));
        let (result, errors) = constraint("char(", true);
        assert_eq!(result, ConstraintResult::Invalid);
        assert_eq!(errors, 1);
    }

    #[test]
    fn datetime_ranges() {
        assert_eq!(
            constraint("datetime year to second", false).0.text(),
            Some("datetime year to second")
        );
        assert_eq!(
            constraint("datetime hour to fraction(3)", false).0.text(),
            Some("datetime hour to fraction(3)")
        );
        let (result, errors) = constraint("datetime year", false);
        assert_eq!(result, ConstraintResult::Invalid);
        assert_eq!(errors, 1);
    }

    #[test]
    fn datetime_range_after_consumed_qualifier() {
        let tokens = Tokenizer::tokenize("year to day");
        let mut parser = Parser::new(&tokens);
        parser.next_token();
        let result = verify_valid_constraint(&mut parser, TokenKind::Current, true, true);
        assert_eq!(result.text(), Some("year to day"));
    }

    #[test]
    fn interval_ranges() {
        assert_eq!(
            constraint("interval day(4) to minute", false).0.text(),
            Some("interval day(4) to minute")
        );
        let (result, _) = constraint("interval fraction(2) to fraction", false);
        assert_eq!(result, ConstraintResult::Invalid);
    }
}
