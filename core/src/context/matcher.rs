use tracing::trace;

use crate::{
    analysis::{AnalysisContext, MemberResult},
    context::{BackwardSearchItem, ContextMap, ContextPossibility, SearchTarget, TokenKey, statement_start_keywords},
    expr::ExpressionNode,
    parser::{ExpressionParsingOptions, Parser},
    token::{ReverseTokenizer, Token, TokenCategory, TokenKind},
    typ::is_builtin_type,
    util::fast_map::{FastHashMap, FastHashSet, fast_hash_set_new},
};

/// Completion candidates at `caret`, using the shared context map.
pub fn get_context_members(caret: usize, tokens: &dyn ReverseTokenizer, ctx: &AnalysisContext) -> Vec<MemberResult> {
    get_context_members_with(caret, tokens, ctx, &ContextMap::current())
}

/// Completion candidates at `caret` against an explicit map.
///
/// A caret right after `.` lists the members of the expression before it
/// and nothing else. Otherwise the nearest mapped token decides; when no
/// possibility applies the statement keywords are offered.
pub fn get_context_members_with(
    caret: usize,
    tokens: &dyn ReverseTokenizer,
    ctx: &AnalysisContext,
    map: &ContextMap,
) -> Vec<MemberResult> {
    if let Some(members) = try_member_access(caret, tokens, ctx) {
        trace!(caret, members = members.len(), "member access");
        return members;
    }

    let Some((trigger, matched)) = determine_context(caret, tokens, map) else {
        trace!(caret, "no context matched, offering statement keywords");
        return statement_start_keywords();
    };
    trace!(caret, trigger = %trigger.value, possibilities = matched.len(), "context matched");

    let mut seen: FastHashSet<String> = fast_hash_set_new();
    let mut members = Vec::new();
    let mut push = |member: MemberResult| {
        if seen.insert(member.name.to_ascii_lowercase()) {
            members.push(member);
        }
    };
    for possibility in &matched {
        possibility.tokens.iter().copied().map(MemberResult::keyword).for_each(&mut push);
        for provider in &possibility.providers {
            provider.load(ctx).into_iter().for_each(&mut push);
        }
    }
    // a value ending the previous line may equally be followed by a new statement
    if at_fresh_line(caret, tokens) && (ends_value(&trigger) || closes_statement(&trigger, tokens)) {
        statement_start_keywords().into_iter().for_each(&mut push);
    }
    members
}

/// Tokens before `offset`, nearest first, without newlines and comments.
fn significant<'t>(tokens: &'t dyn ReverseTokenizer, offset: usize) -> impl Iterator<Item = Token> + 't {
    tokens.reverse_tokens(offset).filter(|t| !t.is_trivia())
}

/// Like [`significant`], but a word the caret is still touching is the
/// one being completed and does not count.
fn before_caret<'t>(tokens: &'t dyn ReverseTokenizer, caret: usize) -> impl Iterator<Item = Token> + 't {
    let mut first = true;
    significant(tokens, caret).filter(move |token| {
        let typing = first && token.is_name_like() && token.span.end >= caret;
        first = false;
        !typing
    })
}

fn at_fresh_line(caret: usize, tokens: &dyn ReverseTokenizer) -> bool {
    tokens
        .reverse_tokens(caret)
        .take_while(|t| t.is_trivia() || (t.is_name_like() && t.span.end >= caret))
        .any(|t| t.kind == TokenKind::NewLine)
}

fn ends_value(token: &Token) -> bool {
    matches!(
        token.category,
        TokenCategory::Identifier | TokenCategory::NumericLiteral | TokenCategory::StringLiteral
    ) || matches!(token.kind, TokenKind::RightParenthesis | TokenKind::RightBracket)
        || (token.category == TokenCategory::Keyword && is_builtin_type(&token.value))
}

/// `end while`, `exit for`, `continue foreach`, or a trailing `clipped`.
fn closes_statement(trigger: &Token, tokens: &dyn ReverseTokenizer) -> bool {
    if matches!(trigger.kind, TokenKind::Clipped | TokenKind::Spaces) {
        return true;
    }
    significant(tokens, trigger.span.start)
        .next()
        .is_some_and(|t| matches!(t.kind, TokenKind::End | TokenKind::Exit | TokenKind::Continue))
}

/// `expr.` before the caret: the members of `expr`, or nothing when it
/// does not resolve. `None` when the caret is not after a dot.
fn try_member_access(caret: usize, tokens: &dyn ReverseTokenizer, ctx: &AnalysisContext) -> Option<Vec<MemberResult>> {
    let mut backward = before_caret(tokens, caret);
    let dot = backward.next().filter(|t| t.kind == TokenKind::Dot)?;

    let mut collected: Vec<Token> = Vec::new();
    let mut expect_name = true;
    let mut backward = backward.peekable();
    while let Some((kind, name_like)) = backward
        .peek()
        .map(|t| (t.kind, t.is_name_like() && !t.kind.is_statement_keyword()))
    {
        match kind {
            TokenKind::RightBracket | TokenKind::RightParenthesis if expect_name => {
                if !take_group(&mut backward, &mut collected) {
                    return Some(Vec::new());
                }
            }
            TokenKind::Dot if !expect_name => {
                collected.extend(backward.next());
                expect_name = true;
            }
            _ if expect_name && name_like => {
                collected.extend(backward.next());
                expect_name = false;
            }
            _ => break,
        }
    }
    if collected.is_empty() || expect_name {
        return Some(Vec::new());
    }
    collected.reverse();
    collected.push(Token::eof(dot.span.start));

    let mut parser = Parser::new(&collected);
    let members = ExpressionNode::try_parse(&mut parser, &[], &ExpressionParsingOptions::default())
        .and_then(|expression| ctx.resolve_expression(&expression))
        .map(|owner| owner.get_members(ctx))
        .unwrap_or_default();
    Some(members)
}

/// Moves a balanced `(...)` or `[...]` group, read backward, into `out`.
fn take_group(backward: &mut std::iter::Peekable<impl Iterator<Item = Token>>, out: &mut Vec<Token>) -> bool {
    let mut depth = 0usize;
    for token in backward.by_ref() {
        match token.kind {
            TokenKind::RightBracket | TokenKind::RightParenthesis => depth += 1,
            TokenKind::LeftBracket | TokenKind::LeftParenthesis => depth = depth.saturating_sub(1),
            kind if kind.is_statement_keyword() => return false,
            _ => {}
        }
        out.push(token);
        if depth == 0 {
            return true;
        }
    }
    false
}

/// The trigger token and the possibilities that apply to it, or `None`
/// when no mapped token precedes the caret within the current statement
/// or none of its possibilities match.
pub(crate) fn determine_context<'m>(
    caret: usize,
    tokens: &dyn ReverseTokenizer,
    map: &'m ContextMap,
) -> Option<(Token, Vec<&'m ContextPossibility>)> {
    for token in before_caret(tokens, caret) {
        if let Some(possibilities) = map.possibilities_for(&token) {
            let matcher = PossibilityMatcher::new(possibilities);
            let matched = matcher.try_match(token.span.start, tokens);
            return (!matched.is_empty()).then_some((token, matched));
        }
        if token.kind.is_statement_keyword() {
            return None;
        }
    }
    None
}

struct PossibilityMatcher<'m> {
    possibilities: &'m [ContextPossibility],
    /// Backward items by the key that starts them, with their owner.
    flat: FastHashMap<TokenKey, Vec<(&'m BackwardSearchItem, usize)>>,
    non_matching: Vec<TokenKey>,
    unguarded: Vec<usize>,
}

impl<'m> PossibilityMatcher<'m> {
    fn new(possibilities: &'m [ContextPossibility]) -> Self {
        let mut flat: FastHashMap<TokenKey, Vec<(&BackwardSearchItem, usize)>> = FastHashMap::default();
        let mut non_matching = Vec::new();
        let mut unguarded = Vec::new();
        for (index, possibility) in possibilities.iter().enumerate() {
            if possibility.backward.is_empty() {
                unguarded.push(index);
                continue;
            }
            for item in &possibility.backward {
                let Some(key) = item.first_key() else { continue };
                flat.entry(key).or_default().push((item, index));
                if !item.matches && !non_matching.contains(&key) {
                    non_matching.push(key);
                }
            }
        }
        Self {
            possibilities,
            flat,
            non_matching,
            unguarded,
        }
    }

    fn lookup(&self, token: &Token) -> Option<&Vec<(&'m BackwardSearchItem, usize)>> {
        self.flat
            .get(&TokenKey::Kind(token.kind))
            .or_else(|| self.flat.get(&TokenKey::Category(token.category)))
    }

    /// Ordered sequences first, then every single-token guard seen at the
    /// same token. Non-matching guards apply at the first token that is
    /// none of their keys. Possibilities without guards are the fallback.
    fn try_match(&self, trigger_start: usize, tokens: &dyn ReverseTokenizer) -> Vec<&'m ContextPossibility> {
        let mut matched: Vec<usize> = Vec::new();
        let mut rejected: Vec<usize> = Vec::new();
        if !self.flat.is_empty() {
            for token in significant(tokens, trigger_start) {
                if let Some(items) = self.lookup(&token) {
                    let positive = items.iter().filter(|(item, owner)| item.matches && !rejected.contains(owner));
                    if let Some(owner) = self.first_ordered(positive.clone(), &token, tokens, true) {
                        trace!(token = %token.value, "ordered backward match");
                        matched.push(owner);
                        break;
                    }
                    let singles: Vec<usize> = positive
                        .filter(|(item, _)| matches!(item.target, SearchTarget::Single(_)))
                        .map(|(_, owner)| *owner)
                        .collect();
                    if !singles.is_empty() {
                        trace!(token = %token.value, count = singles.len(), "single-token backward match");
                        matched.extend(singles);
                        break;
                    }
                    // a present "none of these" token rules its owners out
                    rejected.extend(items.iter().filter(|(item, _)| !item.matches).map(|(_, owner)| *owner));
                } else if !self.non_matching.is_empty() && !self.non_matching.iter().any(|key| key.matches(&token)) {
                    let negative: Vec<(&BackwardSearchItem, usize)> = self
                        .non_matching
                        .iter()
                        .filter_map(|key| self.flat.get(key))
                        .flatten()
                        .filter(|(item, owner)| !item.matches && !rejected.contains(owner))
                        .copied()
                        .collect();
                    if let Some(owner) = self.first_ordered(negative.iter(), &token, tokens, false) {
                        matched.push(owner);
                        break;
                    }
                    let singles: Vec<usize> = negative
                        .iter()
                        .filter(|(item, _)| matches!(item.target, SearchTarget::Single(_)))
                        .map(|(_, owner)| *owner)
                        .collect();
                    if !singles.is_empty() {
                        trace!(token = %token.value, count = singles.len(), "non-matching guard accepted");
                        matched.extend(singles);
                        break;
                    }
                } else if token.kind.is_statement_keyword() {
                    break;
                }
            }
        }
        if matched.is_empty() {
            matched.extend(self.unguarded.iter().copied());
        }
        let mut unique: Vec<usize> = Vec::with_capacity(matched.len());
        for owner in matched {
            if !unique.contains(&owner) {
                unique.push(owner);
            }
        }
        unique.into_iter().map(|owner| &self.possibilities[owner]).collect()
    }

    fn first_ordered<'i>(
        &self,
        items: impl Iterator<Item = &'i (&'m BackwardSearchItem, usize)>,
        token: &Token,
        tokens: &dyn ReverseTokenizer,
        expect: bool,
    ) -> Option<usize>
    where
        'm: 'i,
    {
        items
            .filter_map(|(item, owner)| match &item.target {
                SearchTarget::Ordered(keys) => Some((keys, *owner)),
                SearchTarget::Single(_) => None,
            })
            .find(|(keys, _)| sequence_matches(keys, token.span.start, tokens, expect))
            .map(|(_, owner)| owner)
    }
}

/// Matches `keys[1..]` backward from `from`, skipping unrelated tokens but
/// not crossing a statement keyword. With `expect` unset each key must be
/// absent at its step instead.
fn sequence_matches(keys: &[TokenKey], from: usize, tokens: &dyn ReverseTokenizer, expect: bool) -> bool {
    let mut index = 1;
    if index >= keys.len() {
        return true;
    }
    for token in significant(tokens, from) {
        if keys[index].matches(&token) == expect {
            index += 1;
            if index == keys.len() {
                return true;
            }
        } else if token.kind.is_statement_keyword() || token.kind == TokenKind::EndOfFile {
            return false;
        }
    }
    false
}
