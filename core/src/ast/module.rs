use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tracing::debug;

use crate::{
    analysis::LocationInfo,
    ast::{Children, NodeInfo, impl_ast_node},
    parser::{CursorDecl, ExpressionParsingOptions, ParseContext, Parser, PreparedDecl},
    stmt::{Declaration, FunctionBlockNode, GlobalsNode, Symbols, VariableDef, bind_symbol},
    token::{Diagnostic, LineIndex, Span, TokenKind, Tokenizer, unquote},
    typ::{TypeKind, TypeReference},
    util::SymbolTable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import fgl module`
    Fgl,
    /// `import java a.b.C`
    Java,
    /// `import util`, `import os`
    Package,
}

#[derive(Debug, Clone)]
pub struct ImportNode {
    pub info: NodeInfo,
    pub kind: ImportKind,
    pub name: String,
}

/// `database db` or `schema db`.
#[derive(Debug, Clone)]
pub struct DatabaseNode {
    pub info: NodeInfo,
    pub name: String,
    pub is_schema: bool,
}

impl_ast_node!(ImportNode, DatabaseNode, ModuleNode);

#[derive(Debug, Clone)]
pub enum ModuleItem {
    Import(ImportNode),
    Database(DatabaseNode),
    Globals(GlobalsNode),
    Declaration(Declaration),
    Function(Arc<FunctionBlockNode>),
}

impl ModuleItem {
    pub fn info(&self) -> &NodeInfo {
        match self {
            ModuleItem::Import(node) => &node.info,
            ModuleItem::Database(node) => &node.info,
            ModuleItem::Globals(node) => &node.info,
            ModuleItem::Declaration(node) => node.info(),
            ModuleItem::Function(node) => &node.info,
        }
    }
}

/// Switches applied to a whole module parse.
#[derive(Debug, Clone, Default)]
pub struct ParserOptions {
    /// Keep call arguments as raw tokens instead of expressions.
    pub allow_anything_for_function_params: bool,
    pub allow_nested_select: bool,
    /// Recorded in the locations stamped on declarations.
    pub file_path: Option<String>,
}

impl ParserOptions {
    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn expression_options(&self) -> ExpressionParsingOptions {
        ExpressionParsingOptions {
            allow_anything_for_function_params: self.allow_anything_for_function_params,
            allow_nested_select_statement: self.allow_nested_select,
            ..Default::default()
        }
    }
}

/// Zero is left for modules built outside the parser.
static NEXT_MODULE_ID: AtomicU64 = AtomicU64::new(1);

/// The root of a parsed `.4gl` file with its module-level symbol tables.
#[derive(Debug, Clone, Default)]
pub struct ModuleNode {
    /// Distinct per parse; type references carry the id of their module.
    pub id: u64,
    pub info: NodeInfo,
    pub file_path: Option<String>,
    pub items: Children<ModuleItem>,
    /// `define`/`type`/`constant` outside functions and globals.
    pub symbols: Symbols,
    /// Everything declared in `globals ... end globals` blocks.
    pub globals: Symbols,
    pub functions: SymbolTable<Arc<FunctionBlockNode>>,
    pub cursors: SymbolTable<CursorDecl>,
    pub prepared: SymbolTable<PreparedDecl>,
    pub imports: Vec<ImportNode>,
    /// Files named by `globals "file.4gl"`.
    pub includes: Vec<String>,
    pub database: Option<String>,
    line_index: LineIndex,
}

impl ModuleNode {
    pub fn location_of(&self, offset: usize) -> LocationInfo {
        let position = self.line_index.position(offset);
        LocationInfo {
            file_path: self.file_path.clone(),
            line: position.line,
            column: position.column,
            index: offset,
        }
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// The function whose span contains `offset`.
    pub fn function_at(&self, offset: usize) -> Option<&Arc<FunctionBlockNode>> {
        self.functions
            .values()
            .filter(|f| offset >= f.info.start && (offset <= f.info.end || !f.info.is_complete))
            .max_by_key(|f| f.info.start)
    }

    pub fn function(&self, name: &str) -> Option<&Arc<FunctionBlockNode>> {
        self.functions.get(name)
    }

    pub fn public_functions(&self) -> impl Iterator<Item = &Arc<FunctionBlockNode>> {
        self.functions.values().filter(|f| f.is_public())
    }

    pub fn imports_module(&self, name: &str) -> bool {
        self.imports.iter().any(|i| i.name.eq_ignore_ascii_case(name))
    }
}

/// A parsed module and everything reported while building it.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub module: ModuleNode,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Tokenizes and parses a whole module. Never fails: a malformed module
/// comes back incomplete with its problems in `diagnostics`.
pub fn parse_module(source: &str, options: &ParserOptions) -> ParseOutput {
    let tokens = Tokenizer::tokenize(source);
    let mut parser = Parser::new(&tokens);
    let id = NEXT_MODULE_ID.fetch_add(1, Ordering::Relaxed);
    let mut ctx = ParseContext::new(options.expression_options()).for_module(id);
    let mut module = ModuleNode {
        id,
        info: NodeInfo::at(0),
        file_path: options.file_path.clone(),
        line_index: LineIndex::new(source),
        ..Default::default()
    };

    while !parser.at_eof() {
        let start = parser.peek().start();
        match parse_item(&mut parser, &mut ctx, &mut module, source) {
            Some(item) => {
                module.items.insert(start, item);
            }
            None => skip_unexpected(&mut parser),
        }
    }

    for cursor in std::mem::take(&mut ctx.cursors) {
        let (name, at) = (cursor.name.clone(), cursor.span.start);
        bind_symbol(&mut parser, &mut module.cursors, "Cursor", &name, at, cursor);
    }
    for prepared in std::mem::take(&mut ctx.prepared) {
        let (name, at) = (prepared.name.clone(), prepared.span.start);
        bind_symbol(&mut parser, &mut module.prepared, "Prepared statement", &name, at, prepared);
    }

    module.info.end = source.len();
    module.info.is_complete = true;
    stamp_locations(&module);

    let diagnostics = parser.into_diagnostics();
    debug!(
        file = module.file_path.as_deref().unwrap_or("<buffer>"),
        tokens = tokens.len(),
        items = module.items.len(),
        diagnostics = diagnostics.len(),
        "parsed module"
    );
    ParseOutput { module, diagnostics }
}

fn parse_item(
    parser: &mut Parser,
    ctx: &mut ParseContext,
    module: &mut ModuleNode,
    source: &str,
) -> Option<ModuleItem> {
    match parser.peek().kind {
        TokenKind::Import => {
            let node = parse_import(parser)?;
            module.imports.push(node.clone());
            Some(ModuleItem::Import(node))
        }
        TokenKind::Database | TokenKind::Schema => {
            let node = parse_database(parser);
            module.database.get_or_insert_with(|| node.name.clone());
            Some(ModuleItem::Database(node))
        }
        TokenKind::Globals => {
            let node = GlobalsNode::try_parse(parser, ctx)?;
            if let Some(file) = &node.include_file {
                module.includes.push(file.clone());
            }
            merge_globals(parser, &mut module.globals, &node.symbols);
            Some(ModuleItem::Globals(node))
        }
        TokenKind::Function | TokenKind::Main => parse_function(parser, ctx, module, source),
        TokenKind::Public | TokenKind::Private if parser.peek_kind_n(TokenKind::Function, 2) => {
            parse_function(parser, ctx, module, source)
        }
        TokenKind::Public | TokenKind::Private => {
            let is_public = parser.next_token().kind == TokenKind::Public;
            let declaration = Declaration::try_parse(parser, ctx, "module", is_public)?;
            Some(bind_declaration(parser, module, declaration))
        }
        TokenKind::Define | TokenKind::Type | TokenKind::Constant => {
            let declaration = Declaration::try_parse(parser, ctx, "module", false)?;
            Some(bind_declaration(parser, module, declaration))
        }
        _ => None,
    }
}

fn bind_declaration(parser: &mut Parser, module: &mut ModuleNode, declaration: Declaration) -> ModuleItem {
    module.symbols.bind(parser, &declaration);
    ModuleItem::Declaration(declaration)
}

fn parse_function(
    parser: &mut Parser,
    ctx: &mut ParseContext,
    module: &mut ModuleNode,
    source: &str,
) -> Option<ModuleItem> {
    let mut function = FunctionBlockNode::try_parse(parser, ctx)?;
    function.documentation_comment = documentation_above(source, &module.line_index, function.info.start);
    let function = Arc::new(function);
    if !function.name.is_empty() {
        let (name, at) = (function.name.clone(), function.name_span.start);
        bind_symbol(parser, &mut module.functions, "Function", &name, at, function.clone());
    }
    Some(ModuleItem::Function(function))
}

/// `import fgl name`, `import java a.b.C`, `import package`
fn parse_import(parser: &mut Parser) -> Option<ImportNode> {
    let start = parser.next_token().start();
    let kind = if parser.accept(TokenKind::Fgl) {
        ImportKind::Fgl
    } else if parser.peek().value.eq_ignore_ascii_case("java") && parser.peek_n(2).is_name_like() {
        parser.next_token();
        ImportKind::Java
    } else {
        ImportKind::Package
    };
    let mut info = NodeInfo::at(start);
    if !parser.peek().is_name_like() {
        parser.report_syntax_error("Import statement requires a module name.");
        info.end = parser.token().end();
        return Some(ImportNode {
            info,
            kind,
            name: String::new(),
        });
    }
    let mut name = parser.next_token().value.clone();
    while parser.peek_kind(TokenKind::Dot) && parser.peek_n(2).is_name_like() {
        parser.next_token();
        name.push('.');
        name.push_str(&parser.next_token().value);
    }
    info.end = parser.token().end();
    info.is_complete = true;
    Some(ImportNode { info, kind, name })
}

fn parse_database(parser: &mut Parser) -> DatabaseNode {
    let keyword = parser.next_token();
    let mut info = NodeInfo::at(keyword.start());
    let mut name = String::new();
    if parser.peek().is_name_like() || parser.peek().category.is_string_like() {
        name = unquote(&parser.next_token().value);
        info.is_complete = true;
    } else {
        parser.report_syntax_error("Database name expected.");
    }
    info.end = parser.token().end();
    DatabaseNode {
        info,
        name,
        is_schema: keyword.kind == TokenKind::Schema,
    }
}

/// Adds one globals block's symbols to the module-wide globals table.
/// Duplicates inside the block were already reported when it was parsed.
fn merge_globals(parser: &mut Parser, globals: &mut Symbols, block: &Symbols) {
    for var in block.variables.values() {
        bind_symbol(parser, &mut globals.variables, "Variable", &var.name, var.location_index, var.clone());
    }
    for def in block.types.values() {
        bind_symbol(parser, &mut globals.types, "Type", &def.name, def.location_index, def.clone());
    }
    for def in block.constants.values() {
        bind_symbol(parser, &mut globals.constants, "Constant", &def.name, def.location_index, def.clone());
    }
}

/// Reports one error for a run of tokens no module-level production claims,
/// then resumes at the next module starter.
fn skip_unexpected(parser: &mut Parser) {
    if parser.at_eof() {
        parser.report_syntax_error("Unexpected end of file.");
        return;
    }
    let first = parser.next_token();
    let mut end = first.end();
    while !parser.at_eof() && !starts_item(parser) {
        end = parser.next_token().end();
    }
    parser.report(Diagnostic::syntax(
        format!("Unexpected token \"{}\" found at module level.", first.value),
        Span::new(first.start(), end),
    ));
}

fn starts_item(parser: &Parser) -> bool {
    matches!(
        parser.peek().kind,
        TokenKind::Import
            | TokenKind::Database
            | TokenKind::Schema
            | TokenKind::Globals
            | TokenKind::Function
            | TokenKind::Main
            | TokenKind::Public
            | TokenKind::Private
            | TokenKind::Define
            | TokenKind::Type
            | TokenKind::Constant
    )
}

/// Comment lines directly above `start`, markers stripped. A blank line or
/// code ends the block.
fn documentation_above(source: &str, lines: &LineIndex, start: usize) -> Option<String> {
    let mut collected = Vec::new();
    for line in (0..lines.line_of(start)).rev() {
        let from = lines.line_start(line).unwrap_or(0);
        let to = lines.line_start(line + 1).unwrap_or(source.len());
        let trimmed = source.get(from..to).unwrap_or_default().trim();
        let text = if let Some(rest) = trimmed.strip_prefix("--") {
            rest
        } else if let Some(rest) = trimmed.strip_prefix('#') {
            rest
        } else {
            break;
        };
        collected.push(text.trim().to_string());
    }
    if collected.is_empty() {
        return None;
    }
    collected.reverse();
    Some(collected.join("\n"))
}

/// Gives every declaration its file/line/column for navigation.
fn stamp_locations(module: &ModuleNode) {
    let stamp_symbols = |symbols: &Symbols| {
        for var in symbols.variables.values() {
            stamp_variable(module, var);
        }
        for def in symbols.types.values() {
            def.stamp_location(module.location_of(def.location_index));
            stamp_type(module, &def.type_ref);
        }
        for def in symbols.constants.values() {
            def.stamp_location(module.location_of(def.location_index));
        }
    };
    stamp_symbols(&module.symbols);
    stamp_symbols(&module.globals);
    for function in module.functions.values() {
        function.stamp_location(module.location_of(function.name_span.start));
        stamp_symbols(&function.symbols);
    }
}

fn stamp_variable(module: &ModuleNode, var: &Arc<VariableDef>) {
    var.stamp_location(module.location_of(var.location_index));
    stamp_type(module, &var.type_ref);
}

fn stamp_type(module: &ModuleNode, type_ref: &TypeReference) {
    match &type_ref.kind {
        TypeKind::Record(record) => {
            for field in record.fields.values() {
                stamp_variable(module, field);
            }
        }
        TypeKind::Array(array) => stamp_type(module, &array.element),
        _ => {}
    }
}
