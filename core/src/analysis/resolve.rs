use std::{cell::Cell, sync::Arc};

use once_cell::unsync::OnceCell;

use crate::{
    analysis::{
        AnalysisResult, AnalysisSettings, DatabaseInformationProvider, FunctionProvider, MemberKind, MemberResult,
        ProjectGraph,
        builtins::{self, ARRAY_TYPE, PACKAGES, PackageClass, SYSTEM_FUNCTIONS, SYSTEM_VARIABLES},
    },
    ast::ModuleNode,
    expr::{ExpressionKind, ExpressionNode, FunctionCallExpression, NameExpression, NamePiece},
    stmt::{FunctionBlockNode, Symbols},
    typ::{TypeKind, TypeReference, is_builtin_type},
    util::fast_map::{FastHashSet, fast_hash_set_new},
};

/// Named types may refer to other named types; deeper chains are cycles.
const MAX_TYPE_DEPTH: usize = 16;

/// Everything one resolution request needs: the module, the enclosing
/// function, and the optional cross-file collaborators. Built per request
/// and dropped afterwards.
pub struct AnalysisContext<'a> {
    pub module: &'a ModuleNode,
    pub function: Option<&'a FunctionBlockNode>,
    pub project: Option<&'a dyn ProjectGraph>,
    pub database: Option<&'a dyn DatabaseInformationProvider>,
    pub functions: Option<&'a dyn FunctionProvider>,
    pub settings: AnalysisSettings,
    includes: OnceCell<Vec<Arc<ModuleNode>>>,
    depth: Cell<usize>,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(module: &'a ModuleNode) -> Self {
        Self {
            module,
            function: None,
            project: None,
            database: None,
            functions: None,
            settings: AnalysisSettings::default(),
            includes: OnceCell::new(),
            depth: Cell::new(0),
        }
    }

    pub fn with_function(mut self, function: &'a FunctionBlockNode) -> Self {
        self.function = Some(function);
        self
    }

    /// Scopes lookups to the function containing `offset`, if any.
    pub fn at_offset(mut self, offset: usize) -> Self {
        self.function = self.module.function_at(offset).map(|f| f.as_ref());
        self
    }

    pub fn with_project(mut self, project: &'a dyn ProjectGraph) -> Self {
        self.project = Some(project);
        self
    }

    pub fn with_database(mut self, database: &'a dyn DatabaseInformationProvider) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_functions(mut self, functions: &'a dyn FunctionProvider) -> Self {
        self.functions = Some(functions);
        self
    }

    pub fn with_settings(mut self, settings: AnalysisSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The same module and collaborators, scoped to another function.
    pub(crate) fn for_function<'b>(&self, function: Option<&'b FunctionBlockNode>) -> AnalysisContext<'b>
    where
        'a: 'b,
    {
        AnalysisContext {
            module: self.module,
            function,
            project: self.project,
            database: self.database,
            functions: self.functions,
            settings: self.settings.clone(),
            includes: self.includes.clone(),
            depth: Cell::new(0),
        }
    }

    /// A module reached through an include or a referenced project, looked
    /// at on its own.
    fn for_module<'b>(&self, module: &'b ModuleNode, project: Option<&'b dyn ProjectGraph>) -> AnalysisContext<'b>
    where
        'a: 'b,
    {
        AnalysisContext {
            module,
            function: None,
            project,
            database: self.database,
            functions: self.functions,
            settings: self.settings.clone(),
            includes: OnceCell::new(),
            depth: Cell::new(self.depth.get()),
        }
    }

    /// Modules named by `globals "file"`, loaded once per context.
    pub fn includes(&self) -> &[Arc<ModuleNode>] {
        self.includes.get_or_init(|| match self.project {
            Some(project) if !self.module.includes.is_empty() => project.included_modules(self.module),
            _ => Vec::new(),
        })
    }

    /// Resolves an unqualified name: function scope, module scope, included
    /// globals, referenced projects, then the runtime library.
    pub fn find(&self, name: &str) -> Option<AnalysisResult> {
        self.find_scoped(name, self.function)
    }

    fn find_scoped(&self, name: &str, function: Option<&FunctionBlockNode>) -> Option<AnalysisResult> {
        if let Some(function) = function {
            if let Some(found) = find_in(&function.symbols, name) {
                return Some(found);
            }
        }
        if let Some(found) = self.find_in_module(name) {
            return Some(found);
        }
        for included in self.includes() {
            if let Some(found) = find_in(&included.globals, name) {
                return Some(found);
            }
        }
        if let Some(project) = self.project {
            for referenced in project.referenced_projects() {
                if let Some(found) = referenced.find_public(name) {
                    return Some(found);
                }
            }
        }
        find_builtin(name)
    }

    fn find_in_module(&self, name: &str) -> Option<AnalysisResult> {
        let module = self.module;
        find_in(&module.symbols, name)
            .or_else(|| find_in(&module.globals, name))
            .or_else(|| module.function(name).cloned().map(AnalysisResult::Function))
            .or_else(|| module.cursors.get(name).cloned().map(AnalysisResult::Cursor))
            .or_else(|| module.prepared.get(name).cloned().map(AnalysisResult::Prepared))
    }

    /// The function a call invokes, without consulting the function provider.
    pub fn find_function(&self, name: &str) -> Option<AnalysisResult> {
        self.find(name).filter(is_callable)
    }

    /// `a`, `rec.field`, `arr[i].field`, `base.Channel.create`.
    pub fn resolve_name(&self, name: &NameExpression) -> Option<AnalysisResult> {
        let head = self.find(name.base())?;
        self.walk_pieces(head, &name.pieces)
    }

    fn walk_pieces(&self, mut current: AnalysisResult, pieces: &[NamePiece]) -> Option<AnalysisResult> {
        for piece in pieces {
            current = match piece {
                NamePiece::Member(member) => current.get_member(&member.value, self)?,
                NamePiece::Index(..) => self.element_of(&current)?,
                NamePiece::Star(_) => return Some(current),
            };
        }
        Some(current)
    }

    /// The callee, then any member chained after the call.
    pub fn resolve_call(&self, call: &FunctionCallExpression) -> Option<AnalysisResult> {
        let callee = self.resolve_name(&call.function)?;
        match call.member.as_deref() {
            Some(member) => self.resolve_member_of(callee, member),
            None => Some(callee),
        }
    }

    fn resolve_member_of(&self, owner: AnalysisResult, member: &ExpressionNode) -> Option<AnalysisResult> {
        match &member.kind {
            ExpressionKind::Name(name) => {
                let head = owner.get_member(name.base(), self)?;
                self.walk_pieces(head, &name.pieces)
            }
            ExpressionKind::Call(call) => {
                let head = owner.get_member(call.function.base(), self)?;
                let current = self.walk_pieces(head, &call.function.pieces)?;
                match call.member.as_deref() {
                    Some(next) => self.resolve_member_of(current, next),
                    None => Some(current),
                }
            }
            _ => None,
        }
    }

    /// A name or call expression; other expressions have no members.
    pub fn resolve_expression(&self, expression: &ExpressionNode) -> Option<AnalysisResult> {
        match &expression.kind {
            ExpressionKind::Name(name) => self.resolve_name(name),
            ExpressionKind::Call(call) => self.resolve_call(call),
            _ => None,
        }
    }

    pub(crate) fn element_of(&self, result: &AnalysisResult) -> Option<AnalysisResult> {
        let type_ref = match result {
            AnalysisResult::Field { name, type_name } => {
                let element = type_name.rsplit(" of ").next().unwrap_or(type_name);
                return Some(AnalysisResult::Column {
                    table: String::new(),
                    name: name.clone(),
                    type_name: element.to_string(),
                });
            }
            other => other.type_ref()?,
        };
        match &type_ref.kind {
            TypeKind::Array(array) => Some(AnalysisResult::Element {
                name: result.name(),
                type_ref: array.element.clone(),
            }),
            // substring access on a character value
            _ => Some(result.clone()),
        }
    }

    /// What a named or mimicking type reference stands for, looked up once
    /// and kept on the node.
    pub fn resolved_type<'t>(&self, type_ref: &'t TypeReference) -> Option<&'t AnalysisResult> {
        type_ref
            .resolved_cell()
            .get_or_init(|| self.compute_resolved_type(type_ref))
            .as_ref()
    }

    /// Module-level references never see function locals, so the cached
    /// result is the same from every function.
    fn compute_resolved_type(&self, type_ref: &TypeReference) -> Option<AnalysisResult> {
        if type_ref.module_id != 0 && type_ref.module_id != self.module.id {
            if let Some(resolved) = self.resolve_in_owner(type_ref) {
                return resolved;
            }
        }
        let scope = if type_ref.is_local { self.function } else { None };
        match &type_ref.kind {
            TypeKind::Named { name, constrained } => {
                if *constrained || is_builtin_type(name) {
                    return builtins::class(base_type_name(name)).map(AnalysisResult::Class);
                }
                if name.contains('.') {
                    if let Some(class) = builtins::class(name) {
                        return Some(AnalysisResult::Class(class));
                    }
                    // `module.type` from an imported module
                    let (_, short) = name.rsplit_once('.')?;
                    return self
                        .find_scoped(short, scope)
                        .filter(|r| matches!(r, AnalysisResult::Type(_)));
                }
                self.find_scoped(name, scope)
            }
            TypeKind::Mimic(mimic) => {
                let database = self.database?;
                if mimic.record {
                    Some(AnalysisResult::Table {
                        name: mimic.table.clone(),
                        columns: database.table_columns(&mimic.table),
                    })
                } else {
                    let type_name = database.column_type(&mimic.table, &mimic.column)?;
                    Some(AnalysisResult::Column {
                        table: mimic.table.clone(),
                        name: mimic.column.clone(),
                        type_name,
                    })
                }
            }
            TypeKind::Array(_) | TypeKind::Record(_) => None,
        }
    }

    /// Resolves `type_ref` from the included or referenced module that
    /// declared it. `None` when that module is not reachable from here.
    fn resolve_in_owner(&self, type_ref: &TypeReference) -> Option<Option<AnalysisResult>> {
        if let Some(owner) = self.includes().iter().find(|m| m.id == type_ref.module_id) {
            return Some(self.for_module(owner, self.project).compute_resolved_type(type_ref));
        }
        let project = self.project?;
        for referenced in project.referenced_projects() {
            if let Some(owner) = referenced.module_with_id(type_ref.module_id) {
                let graph: &dyn ProjectGraph = &*referenced;
                return Some(self.for_module(&owner, Some(graph)).compute_resolved_type(type_ref));
            }
        }
        None
    }

    /// Runs `f` one level deeper into a named-type chain, or gives up.
    fn nested<T>(&self, f: impl FnOnce() -> Option<T>) -> Option<T> {
        let depth = self.depth.get();
        if depth >= MAX_TYPE_DEPTH {
            return None;
        }
        self.depth.set(depth + 1);
        let result = f();
        self.depth.set(depth);
        result
    }

    /// The member `name` of a value declared with `type_ref`.
    pub fn type_member(&self, type_ref: &TypeReference, name: &str) -> Option<AnalysisResult> {
        match &type_ref.kind {
            TypeKind::Record(record) => record.fields.get(name).cloned().map(AnalysisResult::Variable),
            TypeKind::Array(_) => ARRAY_TYPE.method(name).map(AnalysisResult::BuiltinFunction),
            TypeKind::Mimic(mimic) if mimic.record => {
                let database = self.database?;
                let type_name = database.column_type(&mimic.table, name)?;
                Some(AnalysisResult::Column {
                    table: mimic.table.clone(),
                    name: name.to_string(),
                    type_name,
                })
            }
            _ => match self.resolved_type(type_ref)? {
                AnalysisResult::Type(def) => self.nested(|| self.type_member(&def.type_ref, name)),
                AnalysisResult::Class(class) => class.method(name).map(AnalysisResult::BuiltinFunction),
                AnalysisResult::Column { type_name, .. } => instance_member(type_name, name),
                _ => None,
            },
        }
    }

    /// Every member of a value declared with `type_ref`.
    pub fn type_members(&self, type_ref: &TypeReference) -> Vec<AnalysisResult> {
        match &type_ref.kind {
            TypeKind::Record(record) => record.fields.values().cloned().map(AnalysisResult::Variable).collect(),
            TypeKind::Array(_) => methods_of(&ARRAY_TYPE),
            _ => match self.resolved_type(type_ref) {
                Some(AnalysisResult::Type(def)) => {
                    self.nested(|| Some(self.type_members(&def.type_ref))).unwrap_or_default()
                }
                Some(AnalysisResult::Class(class)) => methods_of(*class),
                Some(AnalysisResult::Table { name, columns }) => columns
                    .iter()
                    .map(|(column, type_name)| AnalysisResult::Column {
                        table: name.clone(),
                        name: column.clone(),
                        type_name: type_name.clone(),
                    })
                    .collect(),
                Some(AnalysisResult::Column { type_name, .. }) => instance_members(type_name),
                _ => Vec::new(),
            },
        }
    }

    /// The record behind `type_ref`, seen through named types, as a field
    /// count. Mimicking records count their table's columns when known.
    pub fn record_field_count(&self, type_ref: &TypeReference) -> Option<usize> {
        match &type_ref.kind {
            TypeKind::Record(record) => Some(record.field_count()),
            TypeKind::Mimic(mimic) if mimic.record => match self.resolved_type(type_ref) {
                Some(AnalysisResult::Table { columns, .. }) if !columns.is_empty() => Some(columns.len()),
                _ => Some(1),
            },
            TypeKind::Named { .. } => match self.resolved_type(type_ref)? {
                AnalysisResult::Type(def) => self.nested(|| self.record_field_count(&def.type_ref)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Names visible at the current scope, nearest first, filtered by
    /// `kind`. A name shadowed by a nearer scope is listed once.
    pub fn get_members(&self, kind: MemberKind) -> Vec<MemberResult> {
        let mut seen: FastHashSet<String> = fast_hash_set_new();
        let mut members = Vec::new();
        let mut push = |result: AnalysisResult| {
            if kind.admits(&result) && seen.insert(result.name().to_ascii_lowercase()) {
                members.push(MemberResult::from_result(result));
            }
        };

        if let Some(function) = self.function {
            symbols_of(&function.symbols).into_iter().for_each(&mut push);
        }
        symbols_of(&self.module.symbols).into_iter().for_each(&mut push);
        symbols_of(&self.module.globals).into_iter().for_each(&mut push);
        self.module
            .functions
            .values()
            .cloned()
            .map(AnalysisResult::Function)
            .for_each(&mut push);
        self.module
            .cursors
            .values()
            .cloned()
            .map(AnalysisResult::Cursor)
            .for_each(&mut push);
        self.module
            .prepared
            .values()
            .cloned()
            .map(AnalysisResult::Prepared)
            .for_each(&mut push);
        for included in self.includes() {
            symbols_of(&included.globals).into_iter().for_each(&mut push);
        }
        if let Some(project) = self.project {
            for referenced in project.referenced_projects() {
                referenced.public_members().into_iter().for_each(&mut push);
            }
        }
        SYSTEM_FUNCTIONS.iter().map(AnalysisResult::BuiltinFunction).for_each(&mut push);
        SYSTEM_VARIABLES.iter().map(AnalysisResult::BuiltinVariable).for_each(&mut push);
        if kind == MemberKind::All {
            PACKAGES.iter().map(AnalysisResult::Package).for_each(&mut push);
        }
        members
    }

    /// Package classes plus the types declared in scope.
    pub fn type_names(&self) -> Vec<MemberResult> {
        let mut members = self.get_members(MemberKind::Types);
        for package in PACKAGES {
            for class in package.classes {
                members.push(MemberResult::new(
                    class.qualified_name(),
                    crate::analysis::MemberType::Class,
                    class.documentation(),
                ));
            }
        }
        members
    }
}

impl AnalysisResult {
    /// Resolves `.name` on this result.
    pub fn get_member(&self, name: &str, ctx: &AnalysisContext) -> Option<AnalysisResult> {
        match self {
            AnalysisResult::Variable(var) => ctx.type_member(&var.type_ref, name),
            AnalysisResult::Element { type_ref, .. } => ctx.type_member(type_ref, name),
            AnalysisResult::Package(package) => package.class(name).map(AnalysisResult::Class),
            AnalysisResult::Class(class) => class.static_method(name).map(AnalysisResult::BuiltinFunction),
            AnalysisResult::BuiltinFunction(function) => instance_member(function.return_type()?, name),
            AnalysisResult::BuiltinVariable(var) => var
                .fields
                .iter()
                .find(|(field, _)| field.eq_ignore_ascii_case(name))
                .map(|&(field, type_name)| AnalysisResult::Field {
                    name: field.to_string(),
                    type_name,
                }),
            AnalysisResult::Table { name: table, columns } => columns
                .iter()
                .find(|(column, _)| column.eq_ignore_ascii_case(name))
                .map(|(column, type_name)| AnalysisResult::Column {
                    table: table.clone(),
                    name: column.clone(),
                    type_name: type_name.clone(),
                }),
            AnalysisResult::Field { type_name, .. } => instance_member(type_name, name),
            AnalysisResult::Column { type_name, .. } => instance_member(type_name, name),
            _ => None,
        }
    }

    /// Everything reachable with `.` after this result.
    pub fn get_members(&self, ctx: &AnalysisContext) -> Vec<MemberResult> {
        let results = match self {
            AnalysisResult::Variable(var) => ctx.type_members(&var.type_ref),
            AnalysisResult::Element { type_ref, .. } => ctx.type_members(type_ref),
            AnalysisResult::Package(package) => package.classes.iter().map(AnalysisResult::Class).collect(),
            AnalysisResult::Class(class) => class.static_methods.iter().map(AnalysisResult::BuiltinFunction).collect(),
            AnalysisResult::BuiltinFunction(function) => {
                function.return_type().map(instance_members).unwrap_or_default()
            }
            AnalysisResult::BuiltinVariable(var) => var
                .fields
                .iter()
                .map(|&(name, type_name)| AnalysisResult::Field {
                    name: name.to_string(),
                    type_name,
                })
                .collect(),
            AnalysisResult::Table { name, columns } => columns
                .iter()
                .map(|(column, type_name)| AnalysisResult::Column {
                    table: name.clone(),
                    name: column.clone(),
                    type_name: type_name.clone(),
                })
                .collect(),
            AnalysisResult::Field { type_name, .. } => instance_members(type_name),
            AnalysisResult::Column { type_name, .. } => instance_members(type_name),
            _ => Vec::new(),
        };
        results.into_iter().map(MemberResult::from_result).collect()
    }
}

fn is_callable(result: &AnalysisResult) -> bool {
    matches!(
        result,
        AnalysisResult::Function(_) | AnalysisResult::BuiltinFunction(_) | AnalysisResult::External(_)
    )
}

fn find_in(symbols: &Symbols, name: &str) -> Option<AnalysisResult> {
    symbols
        .variables
        .get(name)
        .cloned()
        .map(AnalysisResult::Variable)
        .or_else(|| symbols.types.get(name).cloned().map(AnalysisResult::Type))
        .or_else(|| symbols.constants.get(name).cloned().map(AnalysisResult::Constant))
}

fn symbols_of(symbols: &Symbols) -> Vec<AnalysisResult> {
    let mut results: Vec<AnalysisResult> = symbols.variables.values().cloned().map(AnalysisResult::Variable).collect();
    results.extend(symbols.types.values().cloned().map(AnalysisResult::Type));
    results.extend(symbols.constants.values().cloned().map(AnalysisResult::Constant));
    results
}

fn find_builtin(name: &str) -> Option<AnalysisResult> {
    builtins::system_function(name)
        .map(AnalysisResult::BuiltinFunction)
        .or_else(|| builtins::system_variable(name).map(AnalysisResult::BuiltinVariable))
        .or_else(|| builtins::package(name).map(AnalysisResult::Package))
}

/// `char(20)` and `datetime year to day` resolve through their first word.
fn base_type_name(name: &str) -> &str {
    let end = name.find(['(', ' ']).unwrap_or(name.len());
    &name[..end]
}

/// The class whose instance methods a value of `type_name` exposes.
fn instance_class(type_name: &str) -> Option<&'static PackageClass> {
    let lowered = type_name.trim().to_ascii_lowercase();
    if lowered.starts_with("array") || lowered.starts_with("dynamic array") {
        return Some(&ARRAY_TYPE);
    }
    if lowered.starts_with("char") || lowered.starts_with("varchar") {
        return builtins::class("string");
    }
    builtins::class(base_type_name(type_name.trim()))
}

fn instance_member(type_name: &str, name: &str) -> Option<AnalysisResult> {
    instance_class(type_name)?.method(name).map(AnalysisResult::BuiltinFunction)
}

fn instance_members(type_name: &str) -> Vec<AnalysisResult> {
    instance_class(type_name).map(methods_of).unwrap_or_default()
}

fn methods_of(class: &'static PackageClass) -> Vec<AnalysisResult> {
    class.methods.iter().map(AnalysisResult::BuiltinFunction).collect()
}
