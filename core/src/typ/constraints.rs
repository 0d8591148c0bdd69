use crate::{parser::Parser, token::TokenKind};

/// Scalar type keywords that accept a size, precision or qualifier range.
pub const CONSTRAINED_TYPES: &[TokenKind] = &[
    TokenKind::Char,
    TokenKind::Character,
    TokenKind::Varchar,
    TokenKind::Dec,
    TokenKind::Decimal,
    TokenKind::Numeric,
    TokenKind::Money,
    TokenKind::Datetime,
    TokenKind::Interval,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintResult {
    /// Canonical text of the constrained type, e.g. `decimal(8,2)`.
    Constrained(String),
    /// No constraint follows the type keyword.
    Unconstrained,
    /// A constraint was started but is malformed; an error has been reported.
    Invalid,
}

impl ConstraintResult {
    pub fn text(&self) -> Option<&str> {
        match self {
            ConstraintResult::Constrained(s) => Some(s),
            _ => None,
        }
    }
}

/// Parses the constraint following `head`, which the caller has just
/// consumed. `head` is a constrained type keyword or `current`.
///
/// When `qualifier_consumed` is set the first datetime qualifier is the
/// current token (a bare `year to day` range). With `optional` set, a
/// missing constraint is not an error.
pub fn verify_valid_constraint(
    parser: &mut Parser,
    head: TokenKind,
    qualifier_consumed: bool,
    optional: bool,
) -> ConstraintResult {
    match head {
        TokenKind::Char | TokenKind::Character | TokenKind::Varchar => character_size(parser, head),
        TokenKind::Dec | TokenKind::Decimal | TokenKind::Numeric | TokenKind::Money => decimal_precision(parser, head),
        TokenKind::Datetime | TokenKind::Current => datetime_range(parser, head, qualifier_consumed, optional),
        TokenKind::Interval => interval_range(parser, optional),
        _ => ConstraintResult::Unconstrained,
    }
}

fn number(parser: &mut Parser) -> Option<String> {
    if parser.peek().kind == TokenKind::NumberLiteral {
        Some(parser.next_token().value.clone())
    } else {
        None
    }
}

fn character_size(parser: &mut Parser, head: TokenKind) -> ConstraintResult {
    if !parser.accept(TokenKind::LeftParenthesis) {
        return ConstraintResult::Unconstrained;
    }
    if let Some(size) = number(parser) {
        if parser.accept(TokenKind::RightParenthesis) {
            return ConstraintResult::Constrained(format!("{}({})", head.text(), size));
        }
    }
    parser.report_syntax_error("Incomplete character-type size specification found.");
    ConstraintResult::Invalid
}

fn decimal_precision(parser: &mut Parser, head: TokenKind) -> ConstraintResult {
    if !parser.accept(TokenKind::LeftParenthesis) {
        return ConstraintResult::Unconstrained;
    }
    if let Some(precision) = number(parser) {
        let mut text = format!("{}({}", head.text(), precision);
        if parser.accept(TokenKind::Comma) {
            match number(parser) {
                Some(scale) => {
                    text.push(',');
                    text.push_str(&scale);
                }
                None => {
                    parser.report_syntax_error("Incomplete decimal/money-type scale specification found.");
                    return ConstraintResult::Invalid;
                }
            }
        }
        if parser.accept(TokenKind::RightParenthesis) {
            text.push(')');
            return ConstraintResult::Constrained(text);
        }
    }
    parser.report_syntax_error("Incomplete decimal/money-type precision specification found.");
    ConstraintResult::Invalid
}

fn qualifier(parser: &mut Parser) -> Option<TokenKind> {
    let kind = parser.peek().kind;
    if kind.is_datetime_qualifier() {
        parser.next_token();
        Some(kind)
    } else {
        None
    }
}

/// `fraction(n)` scale after the closing qualifier.
fn fraction_scale(parser: &mut Parser, text: &mut String, message: &str) -> bool {
    if !parser.accept(TokenKind::LeftParenthesis) {
        return true;
    }
    if let Some(scale) = number(parser) {
        if parser.accept(TokenKind::RightParenthesis) {
            text.push_str(&format!("({})", scale));
            return true;
        }
    }
    parser.report_syntax_error(message);
    false
}

fn datetime_range(parser: &mut Parser, head: TokenKind, qualifier_consumed: bool, optional: bool) -> ConstraintResult {
    let first = if qualifier_consumed {
        let kind = parser.token().kind;
        if !parser.peek_kind(TokenKind::To) {
            return ConstraintResult::Unconstrained;
        }
        Some(kind)
    } else {
        qualifier(parser)
    };

    let Some(first) = first else {
        if optional {
            return ConstraintResult::Unconstrained;
        }
        parser.report_syntax_error("Invalid datetime specification found.");
        return ConstraintResult::Invalid;
    };

    let mut text = if qualifier_consumed {
        first.text().to_string()
    } else {
        format!("{} {}", head.text(), first.text())
    };

    if parser.accept(TokenKind::To) {
        if let Some(last) = qualifier(parser) {
            text.push_str(" to ");
            text.push_str(last.text());
            if last == TokenKind::Fraction
                && !fraction_scale(parser, &mut text, "Invalid datetime fraction specification found.")
            {
                return ConstraintResult::Invalid;
            }
            return ConstraintResult::Constrained(text);
        }
    }
    parser.report_syntax_error("Invalid datetime specification found.");
    ConstraintResult::Invalid
}

fn interval_range(parser: &mut Parser, optional: bool) -> ConstraintResult {
    let Some(first) = qualifier(parser) else {
        if optional {
            return ConstraintResult::Unconstrained;
        }
        parser.report_syntax_error("Invalid interval specification found.");
        return ConstraintResult::Invalid;
    };

    let mut text = format!("interval {}", first.text());
    if parser.peek_kind(TokenKind::LeftParenthesis) {
        if first == TokenKind::Fraction {
            parser.report_syntax_error("A scale cannot be defined on the first span of the interval.");
            return ConstraintResult::Invalid;
        }
        parser.next_token();
        match number(parser) {
            Some(precision) if parser.accept(TokenKind::RightParenthesis) => {
                text.push_str(&format!("({})", precision));
            }
            _ => {
                parser.report_syntax_error("Invalid interval specification found.");
                return ConstraintResult::Invalid;
            }
        }
    }

    if parser.accept(TokenKind::To) {
        if let Some(last) = qualifier(parser) {
            text.push_str(" to ");
            text.push_str(last.text());
            if last == TokenKind::Fraction
                && !fraction_scale(parser, &mut text, "Invalid fraction scale specification found.")
            {
                return ConstraintResult::Invalid;
            }
            return ConstraintResult::Constrained(text);
        }
    }
    parser.report_syntax_error("Invalid interval specification found.");
    ConstraintResult::Invalid
}
