mod constraints;

#[cfg(test)]
mod constraints_test;

pub use constraints::{CONSTRAINED_TYPES, ConstraintResult, verify_valid_constraint};

use std::{fmt, sync::Arc};

use once_cell::sync::OnceCell;

use crate::{
    analysis::AnalysisResult,
    ast::{NodeInfo, impl_ast_node},
    parser::{ParseContext, Parser},
    stmt::{VariableDef, VariableDefinitionNode, bind_symbol},
    token::{TokenCategory, TokenKind},
    util::SymbolTable,
};

/// Scalar type names understood without resolution.
pub const BUILTIN_TYPES: &[&str] = &[
    "bigint",
    "boolean",
    "byte",
    "char",
    "character",
    "date",
    "datetime",
    "dec",
    "decimal",
    "float",
    "int",
    "integer",
    "interval",
    "money",
    "numeric",
    "real",
    "smallfloat",
    "smallint",
    "string",
    "text",
    "tinyint",
    "varchar",
];

pub fn is_builtin_type(name: &str) -> bool {
    let base = name.split('(').next().unwrap_or(name).split(' ').next().unwrap_or(name);
    BUILTIN_TYPES.iter().any(|t| t.eq_ignore_ascii_case(base))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimicReference {
    pub database: Option<String>,
    pub table: String,
    pub column: String,
    /// `record like t.*`
    pub record: bool,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Array(Box<ArrayTypeReference>),
    Record(Box<RecordDefinitionNode>),
    Mimic(MimicReference),
    /// Builtin scalar (with its canonical constraint text) or a named
    /// user/package type such as `t_customer` or `base.Channel`.
    Named { name: String, constrained: bool },
}

/// `attribute(...)` trailer on a type, kept as raw text.
#[derive(Debug, Clone)]
pub struct AttributeSpecifier {
    pub info: NodeInfo,
    pub text: String,
}

impl AttributeSpecifier {
    pub fn try_parse(parser: &mut Parser) -> Option<AttributeSpecifier> {
        if !parser.peek_any(&[TokenKind::Attribute, TokenKind::Attributes]) {
            return None;
        }
        let start = parser.next_token().start();
        let mut info = NodeInfo::at(start);
        if !parser.accept(TokenKind::LeftParenthesis) {
            parser.report_syntax_error("Attribute specifier requires a parenthesized list.");
            info.end = parser.token().end();
            return Some(AttributeSpecifier { info, text: String::new() });
        }
        let mut depth = 1;
        let mut parts = Vec::new();
        while !parser.at_eof() {
            let token = parser.next_token();
            match token.kind {
                TokenKind::LeftParenthesis => depth += 1,
                TokenKind::RightParenthesis => {
                    depth -= 1;
                    if depth == 0 {
                        info.is_complete = true;
                        break;
                    }
                }
                _ => {}
            }
            parts.push(token.value.clone());
        }
        if !info.is_complete {
            parser.report_syntax_error("Attribute specifier missing right parenthesis.");
        }
        info.end = parser.token().end();
        Some(AttributeSpecifier {
            info,
            text: parts.join(" "),
        })
    }
}

#[derive(Debug)]
pub struct TypeReference {
    pub info: NodeInfo,
    pub kind: TypeKind,
    pub attribute: Option<AttributeSpecifier>,
    pub is_public: bool,
    /// Declared inside a function body.
    pub is_local: bool,
    /// Id of the declaring module, zero outside the parser.
    pub module_id: u64,
    resolved: OnceCell<Option<AnalysisResult>>,
}

impl Clone for TypeReference {
    fn clone(&self) -> Self {
        Self {
            info: self.info.clone(),
            kind: self.kind.clone(),
            attribute: self.attribute.clone(),
            is_public: self.is_public,
            is_local: self.is_local,
            module_id: self.module_id,
            resolved: OnceCell::new(),
        }
    }
}

impl TypeReference {
    pub fn new(info: NodeInfo, kind: TypeKind) -> Self {
        Self {
            info,
            kind,
            attribute: None,
            is_public: false,
            is_local: false,
            module_id: 0,
            resolved: OnceCell::new(),
        }
    }

    /// A scalar reference built outside the parser (builtin catalogues).
    pub fn named(name: &str) -> Self {
        Self::new(
            NodeInfo::default(),
            TypeKind::Named {
                name: name.to_string(),
                constrained: false,
            },
        )
    }

    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext, is_public: bool) -> Option<TypeReference> {
        let next = parser.peek();
        let mut node = match next.kind {
            TokenKind::Array | TokenKind::Dynamic => {
                let array = ArrayTypeReference::try_parse(parser, ctx, is_public)?;
                let info = array.info.clone();
                TypeReference::new(info, TypeKind::Array(Box::new(array)))
            }
            TokenKind::Record if parser.peek_kind_n(TokenKind::Like, 2) => {
                let start = parser.next_token().start();
                parser.next_token();
                let mut node = Self::parse_mimic(parser, true);
                node.info.start = start;
                node
            }
            TokenKind::Record => {
                let record = RecordDefinitionNode::try_parse(parser, ctx, is_public)?;
                let info = record.info.clone();
                TypeReference::new(info, TypeKind::Record(Box::new(record)))
            }
            TokenKind::Like => {
                parser.next_token();
                Self::parse_mimic(parser, false)
            }
            _ if next.is_name_like() && !next.kind.is_statement_keyword() => Self::parse_named(parser),
            TokenKind::EndOfFile => {
                parser.report_syntax_error("Unexpected end of type definition");
                return None;
            }
            _ => return None,
        };
        node.is_public = is_public;
        node.is_local = ctx.function.is_some();
        node.module_id = ctx.module_id;
        Some(node)
    }

    /// `like [db:]table.column`, with `like` already consumed.
    fn parse_mimic(parser: &mut Parser, record: bool) -> TypeReference {
        let mut info = NodeInfo::at(parser.token().start());
        let mut mimic = MimicReference {
            database: None,
            table: String::new(),
            column: String::new(),
            record,
        };
        let format_error = if record {
            "A mimicking variable must use the format \"like table.*\""
        } else {
            "A mimicking variable must use the format \"like table.column\""
        };

        if parser.peek().is_name_like() && parser.peek_kind_n(TokenKind::Colon, 2) {
            mimic.database = Some(parser.next_token().value.clone());
            parser.next_token();
        }
        if !parser.peek_category(TokenCategory::Identifier) {
            parser.report_syntax_error("Database table name expected.");
        } else {
            mimic.table = parser.next_token().value.clone();
            if parser.accept(TokenKind::Dot) {
                if parser.peek_kind(TokenKind::Multiply) || parser.peek().is_name_like() {
                    mimic.column = parser.next_token().value.clone();
                    if !record && mimic.column == "*" {
                        parser.report_syntax_error(
                            "A variable cannot mimic an entire table without being a record. The variable must be defined as a mimicking record.",
                        );
                    }
                    info.is_complete = true;
                } else {
                    parser.report_syntax_error(format_error);
                }
            } else {
                parser.report_syntax_error(format_error);
            }
        }
        info.end = parser.token().end();
        TypeReference::new(info, TypeKind::Mimic(mimic))
    }

    fn parse_named(parser: &mut Parser) -> TypeReference {
        let first = parser.next_token();
        let mut info = NodeInfo::at(first.start());
        let mut constrained = false;
        let mut name = first.value.clone();

        if CONSTRAINED_TYPES.contains(&first.kind) {
            name = first.kind.text().to_string();
            let optional = !matches!(first.kind, TokenKind::Datetime | TokenKind::Interval);
            if let ConstraintResult::Constrained(text) = verify_valid_constraint(parser, first.kind, false, optional) {
                name = text;
                constrained = true;
            }
        } else if first.category == TokenCategory::Keyword && is_builtin_type(&first.value) {
            name = first.kind.text().to_string();
        } else {
            while parser.peek_kind(TokenKind::Dot) {
                parser.next_token();
                name.push('.');
                if parser.peek().is_name_like() {
                    name.push_str(&parser.next_token().value);
                } else {
                    parser.report_syntax_error("Unexpected token in type reference.");
                    break;
                }
            }
        }

        let mut node = TypeReference::new(info.clone(), TypeKind::Named { name, constrained });
        node.attribute = AttributeSpecifier::try_parse(parser);
        info.end = parser.token().end();
        info.is_complete = true;
        node.info = info;
        node
    }

    /// The array or record wrapper, if any. Scalars and mimics have none.
    pub fn child_count(&self) -> usize {
        match self.kind {
            TypeKind::Array(_) | TypeKind::Record(_) => 1,
            _ => 0,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array(_))
    }

    pub fn is_record(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Record(_) | TypeKind::Mimic(MimicReference { record: true, .. })
        )
    }

    pub fn record(&self) -> Option<&RecordDefinitionNode> {
        match &self.kind {
            TypeKind::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn array(&self) -> Option<&ArrayTypeReference> {
        match &self.kind {
            TypeKind::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn mimic(&self) -> Option<&MimicReference> {
        match &self.kind {
            TypeKind::Mimic(mimic) => Some(mimic),
            _ => None,
        }
    }

    /// Type name for named references, canonical constraint text included.
    pub fn type_name(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_builtin(&self) -> bool {
        match &self.kind {
            TypeKind::Named { name, constrained } => *constrained || is_builtin_type(name),
            _ => false,
        }
    }

    pub(crate) fn resolved_cell(&self) -> &OnceCell<Option<AnalysisResult>> {
        &self.resolved
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeKind::Named { name, .. } => f.write_str(name),
            TypeKind::Mimic(mimic) => {
                if mimic.record {
                    f.write_str("record ")?;
                }
                match &mimic.database {
                    Some(db) => write!(f, "like {}:{}.{}", db, mimic.table, mimic.column),
                    None => write!(f, "like {}.{}", mimic.table, mimic.column),
                }
            }
            TypeKind::Record(_) => f.write_str("record"),
            TypeKind::Array(array) => write!(f, "{}", array),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayKind {
    Static(Vec<String>),
    Dynamic { dimensions: usize },
    Java,
}

#[derive(Debug, Clone)]
pub struct ArrayTypeReference {
    pub info: NodeInfo,
    pub array_kind: ArrayKind,
    pub element: Arc<TypeReference>,
}

impl ArrayTypeReference {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext, is_public: bool) -> Option<ArrayTypeReference> {
        let start = parser.peek().start();
        let mut info = NodeInfo::at(start);
        let array_kind = if parser.accept(TokenKind::Dynamic) {
            if !parser.accept(TokenKind::Array) {
                parser.report_syntax_error("Expected \"array\" keyword after \"dynamic\".");
            }
            let mut dimensions = 1;
            if parser.accept(TokenKind::With) {
                if !parser.accept(TokenKind::Dimension) {
                    parser.report_syntax_error("Expected \"dimension\" keyword.");
                }
                match parser.peek().kind {
                    TokenKind::NumberLiteral => {
                        let value = parser.next_token().value.parse::<usize>().unwrap_or(0);
                        if !(1..=3).contains(&value) {
                            parser.report_syntax_error("Invalid dynamic array dimension.");
                        }
                        dimensions = value.max(1);
                    }
                    _ => parser.report_syntax_error("Invalid dynamic array dimension."),
                }
            }
            ArrayKind::Dynamic { dimensions }
        } else if parser.accept(TokenKind::Array) {
            if parser.accept(TokenKind::LeftBracket) {
                let mut sizes = Vec::new();
                loop {
                    match parser.peek().kind {
                        TokenKind::NumberLiteral => sizes.push(parser.next_token().value.clone()),
                        _ if parser.peek().is_name_like() => sizes.push(parser.next_token().value.clone()),
                        _ => {
                            parser.report_syntax_error("Invalid static array dimension.");
                            break;
                        }
                    }
                    if !parser.accept(TokenKind::Comma) {
                        break;
                    }
                }
                if !parser.accept(TokenKind::RightBracket) {
                    parser.report_syntax_error("Static array definition missing right bracket.");
                }
                ArrayKind::Static(sizes)
            } else {
                ArrayKind::Java
            }
        } else {
            return None;
        };

        if !parser.accept(TokenKind::Of) {
            parser.report_syntax_error("Array type missing \"of\" keyword.");
        }
        let element = match TypeReference::try_parse(parser, ctx, is_public) {
            Some(element) => {
                info.is_complete = element.info.is_complete;
                element
            }
            None => {
                parser.report_syntax_error("Array element type expected.");
                TypeReference::new(NodeInfo::at(parser.token().end()), TypeKind::Named {
                    name: String::new(),
                    constrained: false,
                })
            }
        };
        info.end = parser.token().end();
        Some(ArrayTypeReference {
            info,
            array_kind,
            element: Arc::new(element),
        })
    }
}

impl fmt::Display for ArrayTypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.array_kind {
            ArrayKind::Static(sizes) => write!(f, "array[{}] of {}", sizes.join(","), self.element),
            ArrayKind::Dynamic { dimensions: 1 } => write!(f, "dynamic array of {}", self.element),
            ArrayKind::Dynamic { dimensions } => {
                write!(f, "dynamic array with dimension {} of {}", dimensions, self.element)
            }
            ArrayKind::Java => write!(f, "array of {}", self.element),
        }
    }
}

/// `record ... end record` with its field definitions.
#[derive(Debug, Clone)]
pub struct RecordDefinitionNode {
    pub info: NodeInfo,
    pub definitions: Vec<VariableDefinitionNode>,
    pub fields: SymbolTable<Arc<VariableDef>>,
}

impl RecordDefinitionNode {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext, is_public: bool) -> Option<RecordDefinitionNode> {
        if !parser.peek_kind(TokenKind::Record) {
            return None;
        }
        let start = parser.next_token().start();
        let mut node = RecordDefinitionNode {
            info: NodeInfo::at(start),
            definitions: Vec::new(),
            fields: SymbolTable::new(),
        };
        node.info.decorator_end = Some(parser.token().end());

        loop {
            if parser.peek_end(TokenKind::Record) {
                parser.next_token();
                parser.next_token();
                node.info.is_complete = true;
                break;
            }
            if parser.at_eof() || parser.peek_kind(TokenKind::End) {
                parser.report_syntax_error("A record definition must be terminated with \"end record\".");
                break;
            }
            let before = parser.position();
            if let Some(definition) = VariableDefinitionNode::try_parse(parser, ctx, "record field", is_public) {
                for var in &definition.variables {
                    bind_symbol(parser, &mut node.fields, "Variable", &var.name, var.location_index, var.clone());
                }
                node.definitions.push(definition);
            }
            if !parser.accept(TokenKind::Comma) && !parser.peek_end(TokenKind::Record) && parser.position() == before {
                parser.report_syntax_error("Unexpected token in record definition.");
                parser.next_token();
            }
        }
        node.info.end = parser.token().end();
        Some(node)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

impl_ast_node!(TypeReference, ArrayTypeReference, RecordDefinitionNode, AttributeSpecifier);
