//! Name, type and member resolution over parsed modules.
//!
//! Everything resolvable is an [`AnalysisResult`]. Completion and quick
//! info see results through [`MemberResult`], whose type and documentation
//! are computed on first access and then kept.

mod builtins;
mod check;
mod project;
mod providers;
mod resolve;

#[cfg(test)]
mod analysis_test;
#[cfg(test)]
mod check_test;
#[cfg(test)]
mod project_test;

pub use builtins::{
    ARRAY_TYPE, BuiltinFunction, BuiltinVariable, PACKAGES, Package, PackageClass, SYSTEM_FUNCTIONS,
    SYSTEM_VARIABLES, STRING_TYPE, class, package, system_function, system_variable,
};
pub use check::{
    AnalysisSettings, DEFAULT_NON_STAR_RECORD_FUNCTIONS, DEFAULT_SKIP_VALIDATION_FUNCTIONS, DeferredSearch,
    check_module, resolve_deferred_searches,
};
pub use project::{Project, ProjectGraph, StaticProjectGraph};
pub use providers::{DatabaseInformationProvider, ExternalFunction, FunctionProvider};
pub use resolve::AnalysisContext;

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::{
    expr::ExpressionKind,
    parser::{CursorDecl, PreparedDecl},
    stmt::{ConstantDef, FunctionBlockNode, FunctionKind, Statement, TypeDefinition, VariableDef},
    token::TokenKind,
    typ::TypeReference,
};

/// Where a declaration lives, for go-to-definition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocationInfo {
    pub file_path: Option<String>,
    /// 1-based.
    pub line: u32,
    /// 1-based.
    pub column: u32,
    pub index: usize,
}

/// Anything a name can resolve to.
#[derive(Debug, Clone)]
pub enum AnalysisResult {
    Variable(Arc<VariableDef>),
    Type(Arc<TypeDefinition>),
    Constant(Arc<ConstantDef>),
    Function(Arc<FunctionBlockNode>),
    External(Arc<ExternalFunction>),
    BuiltinFunction(&'static BuiltinFunction),
    BuiltinVariable(&'static BuiltinVariable),
    Package(&'static Package),
    Class(&'static PackageClass),
    /// `arr[i]`: one element of an array.
    Element { name: String, type_ref: Arc<TypeReference> },
    /// A field of a builtin record such as `sqlca.sqlcode`.
    Field { name: String, type_name: &'static str },
    Cursor(CursorDecl),
    Prepared(PreparedDecl),
    /// A database table seen through `like t.*`.
    Table { name: String, columns: Vec<(String, String)> },
    Column { table: String, name: String, type_name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberType {
    Instance,
    Constant,
    Keyword,
    Method,
    Class,
    Variable,
    Unknown,
}

/// Which scope members a listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberKind {
    #[default]
    All,
    Variables,
    Types,
    Constants,
    Functions,
    Cursors,
}

impl MemberKind {
    pub fn admits(self, result: &AnalysisResult) -> bool {
        match self {
            MemberKind::All => true,
            MemberKind::Variables => matches!(
                result,
                AnalysisResult::Variable(_) | AnalysisResult::BuiltinVariable(BuiltinVariable { is_constant: false, .. })
            ),
            MemberKind::Types => matches!(result, AnalysisResult::Type(_) | AnalysisResult::Class(_)),
            MemberKind::Constants => matches!(
                result,
                AnalysisResult::Constant(_) | AnalysisResult::BuiltinVariable(BuiltinVariable { is_constant: true, .. })
            ),
            MemberKind::Functions => matches!(
                result,
                AnalysisResult::Function(_) | AnalysisResult::BuiltinFunction(_) | AnalysisResult::External(_)
            ),
            MemberKind::Cursors => matches!(result, AnalysisResult::Cursor(_) | AnalysisResult::Prepared(_)),
        }
    }
}

impl AnalysisResult {
    pub fn name(&self) -> String {
        match self {
            AnalysisResult::Variable(v) => v.name.clone(),
            AnalysisResult::Type(t) => t.name.clone(),
            AnalysisResult::Constant(c) => c.name.clone(),
            AnalysisResult::Function(f) => f.name.clone(),
            AnalysisResult::External(f) => f.name.clone(),
            AnalysisResult::BuiltinFunction(f) => f.name.to_string(),
            AnalysisResult::BuiltinVariable(v) => v.name.to_string(),
            AnalysisResult::Package(p) => p.name.to_string(),
            AnalysisResult::Class(c) => c.name.to_string(),
            AnalysisResult::Element { name, .. } | AnalysisResult::Field { name, .. } => name.clone(),
            AnalysisResult::Cursor(c) => c.name.clone(),
            AnalysisResult::Prepared(p) => p.name.clone(),
            AnalysisResult::Table { name, .. } | AnalysisResult::Column { name, .. } => name.clone(),
        }
    }

    pub fn member_type(&self) -> MemberType {
        match self {
            AnalysisResult::Variable(_) | AnalysisResult::Field { .. } | AnalysisResult::Column { .. } => {
                MemberType::Variable
            }
            AnalysisResult::BuiltinVariable(v) if v.is_constant => MemberType::Constant,
            AnalysisResult::BuiltinVariable(_) => MemberType::Variable,
            AnalysisResult::Constant(_) => MemberType::Constant,
            AnalysisResult::Function(_) | AnalysisResult::External(_) | AnalysisResult::BuiltinFunction(_) => {
                MemberType::Method
            }
            AnalysisResult::Type(_) | AnalysisResult::Package(_) | AnalysisResult::Class(_) => MemberType::Class,
            AnalysisResult::Element { .. }
            | AnalysisResult::Cursor(_)
            | AnalysisResult::Prepared(_)
            | AnalysisResult::Table { .. } => MemberType::Instance,
        }
    }

    pub fn documentation(&self) -> String {
        match self {
            AnalysisResult::Variable(v) => v.documentation(),
            AnalysisResult::Type(t) => t.documentation(),
            AnalysisResult::Constant(c) => c.documentation(),
            AnalysisResult::Function(f) => function_documentation(f),
            AnalysisResult::External(f) => f.documentation(),
            AnalysisResult::BuiltinFunction(f) => f.documentation(),
            AnalysisResult::BuiltinVariable(v) => v.documentation(),
            AnalysisResult::Package(p) => p.documentation(),
            AnalysisResult::Class(c) => c.documentation(),
            AnalysisResult::Element { name, type_ref } => format!("{} {}", name, type_ref),
            AnalysisResult::Field { name, type_name } => format!("(record field) {} {}", name, type_name),
            AnalysisResult::Cursor(c) if c.scroll => format!("(scroll cursor) {}", c.name),
            AnalysisResult::Cursor(c) => format!("(cursor) {}", c.name),
            AnalysisResult::Prepared(p) => format!("(prepared statement) {}", p.name),
            AnalysisResult::Table { name, columns } => format!("(table) {} ({} columns)", name, columns.len()),
            AnalysisResult::Column { table, name, type_name } => {
                format!("(column) {}.{} {}", table, name, type_name)
            }
        }
    }

    pub fn location(&self) -> Option<LocationInfo> {
        match self {
            AnalysisResult::Variable(v) => v.location().cloned(),
            AnalysisResult::Type(t) => t.location().cloned(),
            AnalysisResult::Constant(c) => c.location().cloned(),
            AnalysisResult::Function(f) => f.location().cloned(),
            AnalysisResult::External(f) => f.location.clone(),
            _ => None,
        }
    }

    /// The declared type, for results that carry one.
    pub fn type_ref(&self) -> Option<&Arc<TypeReference>> {
        match self {
            AnalysisResult::Variable(v) => Some(&v.type_ref),
            AnalysisResult::Type(t) => Some(&t.type_ref),
            AnalysisResult::Element { type_ref, .. } => Some(type_ref),
            _ => None,
        }
    }

    /// The same declaration, compared by identity for shared nodes.
    pub fn same_as(&self, other: &AnalysisResult) -> bool {
        match (self, other) {
            (AnalysisResult::Variable(a), AnalysisResult::Variable(b)) => Arc::ptr_eq(a, b),
            (AnalysisResult::Type(a), AnalysisResult::Type(b)) => Arc::ptr_eq(a, b),
            (AnalysisResult::Constant(a), AnalysisResult::Constant(b)) => Arc::ptr_eq(a, b),
            (AnalysisResult::Function(a), AnalysisResult::Function(b)) => Arc::ptr_eq(a, b),
            (AnalysisResult::BuiltinFunction(a), AnalysisResult::BuiltinFunction(b)) => std::ptr::eq(*a, *b),
            (AnalysisResult::Class(a), AnalysisResult::Class(b)) => std::ptr::eq(*a, *b),
            (AnalysisResult::Package(a), AnalysisResult::Package(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

/// "(public function) string get_name(int id)" with the comment block
/// above the function appended.
fn function_documentation(function: &FunctionBlockNode) -> String {
    let mut doc = String::new();
    match function.kind {
        FunctionKind::Main => doc.push_str("(main) "),
        FunctionKind::Function if function.is_public() => doc.push_str("(public function) "),
        FunctionKind::Function => doc.push_str("(private function) "),
    }
    let returns = return_types(function);
    match returns.as_slice() {
        [] => doc.push_str("void "),
        [single] => {
            doc.push_str(single);
            doc.push(' ');
        }
        _ => {}
    }
    doc.push_str(&function.name);
    if function.kind == FunctionKind::Function {
        let params: Vec<String> = function
            .parameters()
            .map(|(arg, def)| match def {
                Some(def) => format!("{} {}", def.type_ref, arg.name()),
                None => arg.name().to_string(),
            })
            .collect();
        doc.push('(');
        doc.push_str(&params.join(", "));
        doc.push(')');
    }
    if returns.len() > 1 {
        doc.push_str("\nreturning ");
        doc.push_str(&returns.join(", "));
    }
    if let Some(comment) = function.documentation_comment.as_deref().filter(|c| !c.trim().is_empty()) {
        doc.push_str("\n\n");
        doc.push_str(comment);
    }
    doc
}

/// Types of the values the function returns, taken from the widest return
/// statement. Values that are not literals or local names read "unknown".
fn return_types(function: &FunctionBlockNode) -> Vec<String> {
    fn widest<'a>(body: &'a [Statement], best: &mut Option<&'a crate::stmt::ReturnStatement>) {
        for statement in body {
            if let Statement::Return(ret) = statement {
                if best.is_none_or(|b| ret.values.len() > b.values.len()) {
                    *best = Some(ret);
                }
            }
            for nested in statement.bodies() {
                widest(nested, best);
            }
        }
    }

    let mut best = None;
    widest(&function.body, &mut best);
    let Some(ret) = best else { return Vec::new() };
    ret.values
        .iter()
        .map(|value| {
            if !value.appended.is_empty() {
                return "unknown".to_string();
            }
            match &value.kind {
                ExpressionKind::String(_) => "string".to_string(),
                ExpressionKind::Token(token) if token.kind == TokenKind::NumberLiteral => {
                    if token.value.contains('.') { "decimal" } else { "int" }.to_string()
                }
                ExpressionKind::Name(name) if name.is_simple() => function
                    .symbols
                    .variables
                    .get(name.base())
                    .map(|v| v.type_ref.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                _ => "unknown".to_string(),
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
enum MemberSource {
    Keyword(TokenKind),
    Result(AnalysisResult),
    Plain { member_type: MemberType, documentation: String },
}

/// One completion or quick-info entry.
#[derive(Debug, Clone)]
pub struct MemberResult {
    pub name: String,
    pub completion: String,
    source: MemberSource,
    member_type: OnceCell<MemberType>,
    documentation: OnceCell<String>,
}

impl MemberResult {
    pub fn new(name: impl Into<String>, member_type: MemberType, documentation: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            completion: name.clone(),
            name,
            source: MemberSource::Plain {
                member_type,
                documentation: documentation.into(),
            },
            member_type: OnceCell::new(),
            documentation: OnceCell::new(),
        }
    }

    pub fn keyword(kind: TokenKind) -> Self {
        let name = kind.text().to_string();
        Self {
            completion: name.clone(),
            name,
            source: MemberSource::Keyword(kind),
            member_type: OnceCell::new(),
            documentation: OnceCell::new(),
        }
    }

    pub fn from_result(result: AnalysisResult) -> Self {
        let name = result.name();
        Self {
            completion: name.clone(),
            name,
            source: MemberSource::Result(result),
            member_type: OnceCell::new(),
            documentation: OnceCell::new(),
        }
    }

    pub fn member_type(&self) -> MemberType {
        *self.member_type.get_or_init(|| match &self.source {
            MemberSource::Keyword(_) => MemberType::Keyword,
            MemberSource::Result(result) => result.member_type(),
            MemberSource::Plain { member_type, .. } => *member_type,
        })
    }

    pub fn documentation(&self) -> &str {
        self.documentation.get_or_init(|| match &self.source {
            MemberSource::Keyword(kind) => format!("(keyword) {}", kind.text()),
            MemberSource::Result(result) => result.documentation(),
            MemberSource::Plain { documentation, .. } => documentation.clone(),
        })
    }

    pub fn location(&self) -> Option<LocationInfo> {
        match &self.source {
            MemberSource::Result(result) => result.location(),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.source {
            MemberSource::Result(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_keyword(&self) -> bool {
        matches!(self.source, MemberSource::Keyword(_))
    }
}
