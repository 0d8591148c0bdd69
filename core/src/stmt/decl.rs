use std::{fmt, sync::Arc};

use once_cell::sync::OnceCell;

use crate::{
    analysis::LocationInfo,
    ast::{NodeInfo, impl_ast_node},
    expr::ExpressionNode,
    parser::{ParseContext, Parser},
    token::{Diagnostic, Span, TokenKind},
    typ::TypeReference,
    util::SymbolTable,
};

/// Adds `value` under `name`, reporting "`what` `name` defined more than
/// once." when the table already has it.
pub(crate) fn bind_symbol<T>(
    parser: &mut Parser,
    table: &mut SymbolTable<T>,
    what: &str,
    name: &str,
    location: usize,
    value: T,
) {
    if !table.insert(name, value) {
        parser.report(Diagnostic::syntax(
            format!("{} {} defined more than once.", what, name),
            Span::new(location, location + name.len()),
        ));
    }
}

/// One declared variable.
#[derive(Debug)]
pub struct VariableDef {
    pub name: String,
    pub type_ref: Arc<TypeReference>,
    pub location_index: usize,
    pub is_public: bool,
    /// "local variable", "module variable", "global variable", "record field".
    pub scope: String,
    location: OnceCell<LocationInfo>,
}

impl VariableDef {
    pub fn new(name: &str, type_ref: Arc<TypeReference>, location_index: usize, is_public: bool, scope: &str) -> Self {
        Self {
            name: name.to_string(),
            type_ref,
            location_index,
            is_public,
            scope: scope.to_string(),
            location: OnceCell::new(),
        }
    }

    pub fn documentation(&self) -> String {
        if self.scope.is_empty() {
            format!("{} {}", self.name, self.type_ref)
        } else {
            format!("({}) {} {}", self.scope, self.name, self.type_ref)
        }
    }

    pub fn location(&self) -> Option<&LocationInfo> {
        self.location.get()
    }

    pub(crate) fn stamp_location(&self, location: LocationInfo) {
        let _ = self.location.set(location);
    }
}

/// `identifier [,...] type-reference`
#[derive(Debug, Clone)]
pub struct VariableDefinitionNode {
    pub info: NodeInfo,
    pub identifiers: Vec<(String, usize)>,
    pub type_ref: Option<Arc<TypeReference>>,
    pub variables: Vec<Arc<VariableDef>>,
}

impl_ast_node!(VariableDefinitionNode);

impl VariableDefinitionNode {
    pub fn try_parse(
        parser: &mut Parser,
        ctx: &mut ParseContext,
        scope: &str,
        is_public: bool,
    ) -> Option<VariableDefinitionNode> {
        let mut lookahead = 1;
        let mut identifiers = Vec::new();
        while parser.peek_n(lookahead).is_name_like() && !parser.peek_n(lookahead).kind.is_statement_keyword() {
            let token = parser.peek_n(lookahead);
            identifiers.push((token.value.clone(), token.start()));
            lookahead += 1;
            if !parser.peek_kind_n(TokenKind::Comma, lookahead) {
                break;
            }
            lookahead += 1;
        }
        if identifiers.is_empty() {
            return None;
        }

        let start = parser.peek().start();
        // identifiers and separating commas
        for _ in 1..lookahead {
            parser.next_token();
        }
        let mut node = VariableDefinitionNode {
            info: NodeInfo::at(start),
            identifiers,
            type_ref: None,
            variables: Vec::new(),
        };

        match TypeReference::try_parse(parser, ctx, is_public) {
            Some(type_ref) => {
                node.info.is_complete = type_ref.info.is_complete;
                let type_ref = Arc::new(type_ref);
                node.variables = node
                    .identifiers
                    .iter()
                    .map(|(name, at)| Arc::new(VariableDef::new(name, type_ref.clone(), *at, is_public, scope)))
                    .collect();
                node.type_ref = Some(type_ref);
            }
            None => parser.report_syntax_error("No type defined for variable(s)."),
        }
        node.info.end = parser.token().end();
        Some(node)
    }
}

/// `define group [, group ...]`
#[derive(Debug, Clone)]
pub struct DefineNode {
    pub info: NodeInfo,
    pub is_public: bool,
    pub definitions: Vec<VariableDefinitionNode>,
}

impl_ast_node!(DefineNode);

impl DefineNode {
    /// Expects `define` as the next token; a leading access modifier has
    /// been consumed by the caller.
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext, scope: &str, is_public: bool) -> Option<DefineNode> {
        if !parser.peek_kind(TokenKind::Define) {
            return None;
        }
        let start = parser.next_token().start();
        let mut node = DefineNode {
            info: NodeInfo::at(start),
            is_public,
            definitions: Vec::new(),
        };
        loop {
            match VariableDefinitionNode::try_parse(parser, ctx, scope, is_public) {
                Some(definition) => node.definitions.push(definition),
                None => {
                    parser.report_syntax_error("Variable name expected in define statement.");
                    break;
                }
            }
            if !parser.accept(TokenKind::Comma) {
                break;
            }
        }
        node.info.is_complete = !node.definitions.is_empty() && node.definitions.iter().all(|d| d.info.is_complete);
        node.info.end = parser.token().end();
        Some(node)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Arc<VariableDef>> {
        self.definitions.iter().flat_map(|d| d.variables.iter())
    }
}

/// A named user type: `type t_cust record ... end record`.
#[derive(Debug)]
pub struct TypeDefinition {
    pub name: String,
    pub type_ref: Arc<TypeReference>,
    pub location_index: usize,
    pub is_public: bool,
    pub scope: String,
    location: OnceCell<LocationInfo>,
}

impl TypeDefinition {
    pub fn documentation(&self) -> String {
        format!("({}) {} {}", self.scope, self.name, self.type_ref)
    }

    pub fn location(&self) -> Option<&LocationInfo> {
        self.location.get()
    }

    pub(crate) fn stamp_location(&self, location: LocationInfo) {
        let _ = self.location.set(location);
    }
}

#[derive(Debug, Clone)]
pub struct TypeDefNode {
    pub info: NodeInfo,
    pub definitions: Vec<Arc<TypeDefinition>>,
}

impl_ast_node!(TypeDefNode);

impl TypeDefNode {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext, scope: &str, is_public: bool) -> Option<TypeDefNode> {
        if !parser.peek_kind(TokenKind::Type) {
            return None;
        }
        let start = parser.next_token().start();
        let mut node = TypeDefNode {
            info: NodeInfo::at(start),
            definitions: Vec::new(),
        };
        loop {
            if !parser.peek().is_name_like() || parser.peek().kind.is_statement_keyword() {
                parser.report_syntax_error("Type name expected.");
                break;
            }
            let name = parser.next_token();
            match TypeReference::try_parse(parser, ctx, is_public) {
                Some(type_ref) => node.definitions.push(Arc::new(TypeDefinition {
                    name: name.value.clone(),
                    type_ref: Arc::new(type_ref),
                    location_index: name.start(),
                    is_public,
                    scope: scope.to_string(),
                    location: OnceCell::new(),
                })),
                None => {
                    parser.report_syntax_error("Unexpected end of type definition");
                    break;
                }
            }
            if !parser.accept(TokenKind::Comma) {
                break;
            }
        }
        node.info.is_complete = !node.definitions.is_empty();
        node.info.end = parser.token().end();
        Some(node)
    }
}

#[derive(Debug)]
pub struct ConstantDef {
    pub name: String,
    pub type_name: Option<String>,
    pub value: Option<ExpressionNode>,
    pub location_index: usize,
    pub is_public: bool,
    pub scope: String,
    location: OnceCell<LocationInfo>,
}

impl ConstantDef {
    pub fn value_text(&self) -> String {
        self.value.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    pub fn documentation(&self) -> String {
        format!("({}) {} = {}", self.scope, self.name, self.value_text())
    }

    pub fn location(&self) -> Option<&LocationInfo> {
        self.location.get()
    }

    pub(crate) fn stamp_location(&self, location: LocationInfo) {
        let _ = self.location.set(location);
    }
}

/// `constant name [type] = literal [, ...]`
#[derive(Debug, Clone)]
pub struct ConstantDefNode {
    pub info: NodeInfo,
    pub definitions: Vec<Arc<ConstantDef>>,
}

impl_ast_node!(ConstantDefNode);

impl ConstantDefNode {
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext, scope: &str, is_public: bool) -> Option<ConstantDefNode> {
        if !parser.peek_kind(TokenKind::Constant) {
            return None;
        }
        let start = parser.next_token().start();
        let mut node = ConstantDefNode {
            info: NodeInfo::at(start),
            definitions: Vec::new(),
        };
        loop {
            if !parser.peek().is_name_like() || parser.peek().kind.is_statement_keyword() {
                parser.report_syntax_error("Constant name expected.");
                break;
            }
            let name = parser.next_token();
            let type_name = if parser.peek_kind(TokenKind::Equals) {
                None
            } else {
                TypeReference::try_parse(parser, ctx, is_public).map(|t| t.to_string())
            };
            let value = if parser.accept(TokenKind::Equals) {
                let options = ctx.expression_options;
                let value = ExpressionNode::try_parse(parser, &[TokenKind::Comma], &options);
                if value.is_none() {
                    parser.report_syntax_error("Constant value expected.");
                }
                value
            } else {
                parser.report_syntax_error("Constant definition missing \"=\".");
                None
            };
            node.definitions.push(Arc::new(ConstantDef {
                name: name.value.clone(),
                type_name,
                value,
                location_index: name.start(),
                is_public,
                scope: scope.to_string(),
                location: OnceCell::new(),
            }));
            if !parser.accept(TokenKind::Comma) {
                break;
            }
        }
        node.info.is_complete = node.definitions.iter().all(|d| d.value.is_some());
        node.info.end = parser.token().end();
        Some(node)
    }
}

/// Declarations allowed at the top of modules, globals and functions.
#[derive(Debug, Clone)]
pub enum Declaration {
    Define(DefineNode),
    Type(TypeDefNode),
    Constant(ConstantDefNode),
}

impl Declaration {
    pub fn info(&self) -> &NodeInfo {
        match self {
            Declaration::Define(node) => &node.info,
            Declaration::Type(node) => &node.info,
            Declaration::Constant(node) => &node.info,
        }
    }

    /// Parses whichever declaration `define`, `type` or `constant` starts.
    pub fn try_parse(parser: &mut Parser, ctx: &mut ParseContext, scope: &str, is_public: bool) -> Option<Declaration> {
        let (variable_scope, type_scope, constant_scope) = declaration_scopes(scope);
        match parser.peek().kind {
            TokenKind::Define => DefineNode::try_parse(parser, ctx, variable_scope, is_public).map(Declaration::Define),
            TokenKind::Type => TypeDefNode::try_parse(parser, ctx, type_scope, is_public).map(Declaration::Type),
            TokenKind::Constant => {
                ConstantDefNode::try_parse(parser, ctx, constant_scope, is_public).map(Declaration::Constant)
            }
            _ => None,
        }
    }
}

/// Scope strings for variables, types and constants declared at `level`
/// ("local", "module" or "global").
fn declaration_scopes(level: &str) -> (&'static str, &'static str, &'static str) {
    match level {
        "local" => ("local variable", "local type", "local constant"),
        "global" => ("global variable", "global type", "global constant"),
        _ => ("module variable", "module type", "module constant"),
    }
}

/// Symbol tables shared by modules, globals blocks and functions.
#[derive(Debug, Clone, Default)]
pub struct Symbols {
    pub variables: SymbolTable<Arc<VariableDef>>,
    pub types: SymbolTable<Arc<TypeDefinition>>,
    pub constants: SymbolTable<Arc<ConstantDef>>,
}

impl Symbols {
    /// Registers everything `declaration` defines, reporting duplicates.
    pub fn bind(&mut self, parser: &mut Parser, declaration: &Declaration) {
        match declaration {
            Declaration::Define(define) => {
                for var in define.variables() {
                    bind_symbol(parser, &mut self.variables, "Variable", &var.name, var.location_index, var.clone());
                }
            }
            Declaration::Type(types) => {
                for def in &types.definitions {
                    bind_symbol(parser, &mut self.types, "Type", &def.name, def.location_index, def.clone());
                }
            }
            Declaration::Constant(constants) => {
                for def in &constants.definitions {
                    bind_symbol(parser, &mut self.constants, "Constant", &def.name, def.location_index, def.clone());
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.types.is_empty() && self.constants.is_empty()
    }
}

impl fmt::Display for VariableDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.type_ref)
    }
}
