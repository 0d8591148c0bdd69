use serde::Deserialize;

use crate::{
    analysis::{AnalysisContext, AnalysisResult, MemberKind, MemberResult, MemberType, PACKAGES},
    token::{STATEMENT_KEYWORDS, TokenKind},
    typ::BUILTIN_TYPES,
};

const POST_UNARY_OPERATORS: &[TokenKind] = &[TokenKind::Clipped, TokenKind::Spaces, TokenKind::Units];

const BINARY_OPERATOR_KEYWORDS: &[TokenKind] = &[
    TokenKind::And,
    TokenKind::Or,
    TokenKind::Mod,
    TokenKind::Using,
    TokenKind::Like,
    TokenKind::Matches,
    TokenKind::Between,
    TokenKind::Through,
    TokenKind::Thru,
    TokenKind::InstanceOf,
    TokenKind::As,
];

/// Keywords that can open an expression term.
const EXPRESSION_KEYWORDS: &[TokenKind] = &[
    TokenKind::Not,
    TokenKind::Null,
    TokenKind::Current,
    TokenKind::Interval,
    TokenKind::Column,
    TokenKind::Ascii,
];

/// Named candidate sets a context possibility can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetProvider {
    PostUnaryOperators,
    ExpressionComponents,
    Types,
    SystemTypes,
    Functions,
    Variables,
    Constants,
    DatabaseTables,
    ImportModules,
    StatementStartKeywords,
    Cursors,
    PreparedCursors,
    DeclaredCursors,
    BinaryOperatorKeywords,
}

impl SetProvider {
    pub fn load(self, ctx: &AnalysisContext) -> Vec<MemberResult> {
        match self {
            SetProvider::PostUnaryOperators => keywords(POST_UNARY_OPERATORS),
            SetProvider::BinaryOperatorKeywords => keywords(BINARY_OPERATOR_KEYWORDS),
            SetProvider::StatementStartKeywords => statement_start_keywords(),
            SetProvider::ExpressionComponents => {
                let mut members: Vec<MemberResult> = ctx
                    .get_members(MemberKind::All)
                    .into_iter()
                    .filter(|m| !matches!(m.result(), Some(AnalysisResult::Type(_) | AnalysisResult::Cursor(_) | AnalysisResult::Prepared(_))))
                    .collect();
                members.extend(keywords(EXPRESSION_KEYWORDS));
                members
            }
            SetProvider::Types => {
                let mut members = ctx.type_names();
                members.extend(system_types());
                members
            }
            SetProvider::SystemTypes => system_types(),
            SetProvider::Functions => ctx.get_members(MemberKind::Functions),
            SetProvider::Variables => ctx.get_members(MemberKind::Variables),
            SetProvider::Constants => ctx.get_members(MemberKind::Constants),
            SetProvider::DatabaseTables => ctx
                .database
                .map(|db| db.tables())
                .unwrap_or_default()
                .into_iter()
                .map(|table| MemberResult::new(table.clone(), MemberType::Instance, format!("(table) {}", table)))
                .collect(),
            SetProvider::ImportModules => {
                let mut members: Vec<MemberResult> = PACKAGES
                    .iter()
                    .map(|package| MemberResult::from_result(AnalysisResult::Package(package)))
                    .collect();
                if let Some(project) = ctx.project {
                    members.extend(
                        project
                            .module_names()
                            .into_iter()
                            .map(|name| MemberResult::new(name.clone(), MemberType::Class, format!("(module) {}", name))),
                    );
                }
                members
            }
            SetProvider::Cursors => ctx.get_members(MemberKind::Cursors),
            SetProvider::DeclaredCursors => ctx
                .get_members(MemberKind::Cursors)
                .into_iter()
                .filter(|m| matches!(m.result(), Some(AnalysisResult::Cursor(_))))
                .collect(),
            SetProvider::PreparedCursors => ctx
                .get_members(MemberKind::Cursors)
                .into_iter()
                .filter(|m| matches!(m.result(), Some(AnalysisResult::Prepared(_))))
                .collect(),
        }
    }
}

fn keywords(kinds: &[TokenKind]) -> Vec<MemberResult> {
    kinds.iter().copied().map(MemberResult::keyword).collect()
}

/// Every keyword that may begin a statement, access modifiers included.
pub fn statement_start_keywords() -> Vec<MemberResult> {
    keywords(STATEMENT_KEYWORDS)
}

fn system_types() -> Vec<MemberResult> {
    BUILTIN_TYPES
        .iter()
        .map(|name| MemberResult::new(*name, MemberType::Class, format!("(type) {}", name)))
        .collect()
}
