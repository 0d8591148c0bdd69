use tracing::debug;

use crate::{
    analysis::{AnalysisContext, AnalysisResult},
    ast::{ImportKind, ModuleItem},
    expr::{ExpressionKind, ExpressionNode, FunctionCallExpression, NameExpression, NamePiece},
    stmt::{Declaration, FunctionBlockNode, Statement},
    token::{Diagnostic, ErrorSink, Span, TokenCategory},
    typ::{TypeKind, TypeReference},
    util::fast_map::{FastHashSet, fast_hash_set_new},
};

/// Functions whose arguments are never counted or checked.
pub const DEFAULT_SKIP_VALIDATION_FUNCTIONS: &[&str] = &["cast", "get_fldbuf", "field_touched", "sfmt"];

/// Functions that take whole records without a `.*` suffix.
pub const DEFAULT_NON_STAR_RECORD_FUNCTIONS: &[&str] = &["base.typeinfo.create", "com.WebOperation.CreateRPCStyle"];

/// Call-checking exceptions, the builtin sets plus configured additions.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    skip_validation: FastHashSet<String>,
    non_star_record: FastHashSet<String>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        let mut settings = Self {
            skip_validation: fast_hash_set_new(),
            non_star_record: fast_hash_set_new(),
        };
        settings = settings.with_skip_validation(DEFAULT_SKIP_VALIDATION_FUNCTIONS.iter().copied());
        settings.with_non_star_record(DEFAULT_NON_STAR_RECORD_FUNCTIONS.iter().copied())
    }
}

impl AnalysisSettings {
    pub fn with_skip_validation<S: AsRef<str>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.skip_validation
            .extend(names.into_iter().map(|n| n.as_ref().to_ascii_lowercase()));
        self
    }

    pub fn with_non_star_record<S: AsRef<str>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.non_star_record
            .extend(names.into_iter().map(|n| n.as_ref().to_ascii_lowercase()));
        self
    }

    pub fn skips_validation(&self, function: &str) -> bool {
        self.skip_validation.contains(&function.to_ascii_lowercase())
    }

    pub fn allows_non_star_record(&self, function: &str) -> bool {
        self.non_star_record.contains(&function.to_ascii_lowercase())
    }
}

/// A call whose target was not found in the module, left for
/// [`resolve_deferred_searches`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredSearch {
    pub name: String,
    pub span: Span,
    /// Arguments after `.*` expansion.
    pub argument_count: usize,
}

/// Walks every declaration and function body, reporting binding problems.
/// Calls to functions defined elsewhere come back as deferred searches.
pub fn check_module(ctx: &AnalysisContext, sink: &mut dyn ErrorSink) -> Vec<DeferredSearch> {
    let mut checker = Checker {
        ctx,
        sink,
        deferred: Vec::new(),
        reported: 0,
    };
    for item in ctx.module.items.values() {
        match item {
            ModuleItem::Declaration(declaration) => checker.check_declaration(declaration),
            ModuleItem::Globals(globals) => globals.declarations.iter().for_each(|d| checker.check_declaration(d)),
            ModuleItem::Function(function) => {
                let scoped = ctx.for_function(Some(function.as_ref()));
                let mut inner = Checker {
                    ctx: &scoped,
                    sink: &mut *checker.sink,
                    deferred: Vec::new(),
                    reported: 0,
                };
                inner.check_function(function);
                let (deferred, reported) = (inner.deferred, inner.reported);
                checker.deferred.extend(deferred);
                checker.reported += reported;
            }
            ModuleItem::Import(_) | ModuleItem::Database(_) => {}
        }
    }
    debug!(
        file = ctx.module.file_path.as_deref().unwrap_or("<buffer>"),
        diagnostics = checker.reported,
        deferred = checker.deferred.len(),
        "analysis pass complete"
    );
    checker.deferred
}

/// Looks up each deferred call in the function provider and referenced
/// projects. Returns the searches that stayed unresolved, each already
/// reported as "Function X not found.".
pub fn resolve_deferred_searches(
    deferred: Vec<DeferredSearch>,
    ctx: &AnalysisContext,
    sink: &mut dyn ErrorSink,
) -> Vec<DeferredSearch> {
    let mut unresolved = Vec::new();
    for search in deferred {
        let required = if let Some(external) = ctx.functions.and_then(|p| p.find_function(&search.name)) {
            Some(external.parameters.len())
        } else {
            ctx.project
                .into_iter()
                .flat_map(|project| project.referenced_projects())
                .find_map(|project| match project.find_public(&search.name) {
                    Some(AnalysisResult::Function(function)) => Some(function.arguments.len()),
                    _ => None,
                })
        };
        match required {
            Some(required) if required != search.argument_count => {
                sink.report(count_mismatch(search.argument_count, required, search.span));
            }
            Some(_) => {}
            None => {
                sink.report(Diagnostic::binding(format!("Function {} not found.", search.name), search.span));
                unresolved.push(search);
            }
        }
    }
    unresolved
}

fn count_mismatch(actual: usize, required: usize, span: Span) -> Diagnostic {
    Diagnostic::binding(
        format!(
            "Unexpected number of parameters ({}) found, expected {} variables.",
            actual, required
        ),
        span,
    )
}

struct Checker<'c, 'a> {
    ctx: &'c AnalysisContext<'a>,
    sink: &'c mut dyn ErrorSink,
    deferred: Vec<DeferredSearch>,
    reported: usize,
}

impl Checker<'_, '_> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.reported += 1;
        self.sink.report(diagnostic);
    }

    fn check_declaration(&mut self, declaration: &Declaration) {
        match declaration {
            Declaration::Define(define) => {
                for definition in &define.definitions {
                    if let Some(type_ref) = &definition.type_ref {
                        self.check_type(type_ref);
                    }
                }
            }
            Declaration::Type(types) => types.definitions.iter().for_each(|d| self.check_type(&d.type_ref)),
            Declaration::Constant(_) => {}
        }
    }

    fn check_type(&mut self, type_ref: &TypeReference) {
        match &type_ref.kind {
            TypeKind::Array(array) => self.check_type(&array.element),
            TypeKind::Record(record) => {
                for definition in &record.definitions {
                    if let Some(field_type) = &definition.type_ref {
                        self.check_type(field_type);
                    }
                }
            }
            TypeKind::Named { name, .. } if !name.is_empty() && !type_ref.is_builtin() => {
                match self.ctx.resolved_type(type_ref) {
                    None => self.report(Diagnostic::binding(format!("Type {} not found.", name), type_ref.info.span())),
                    Some(AnalysisResult::Type(_) | AnalysisResult::Class(_)) => {}
                    Some(_) => {
                        self.report(Diagnostic::binding(format!("Invalid type {} found.", name), type_ref.info.span()))
                    }
                }
            }
            TypeKind::Named { .. } | TypeKind::Mimic(_) => {}
        }
    }

    fn check_function(&mut self, function: &FunctionBlockNode) {
        if function.info.is_complete && function.info.end < function.info.start {
            self.report(Diagnostic::internal(
                format!("Function {} ends before it starts.", function.name),
                function.name_span,
            ));
        }
        for (argument, definition) in function.parameters() {
            if definition.is_none() {
                self.report(Diagnostic::binding(
                    format!("No definition found for parameter {}", argument.name()),
                    argument.span(),
                ));
            }
        }
        function.declarations.iter().for_each(|d| self.check_declaration(d));
        self.check_body(&function.body);
    }

    fn check_body(&mut self, body: &[Statement]) {
        for statement in body {
            for expression in statement.expressions() {
                self.check_expression(expression);
            }
            for target in statement.targets() {
                self.check_name(target);
            }
            if let Some(call) = statement.call() {
                self.check_call(call);
            }
            for nested in statement.bodies() {
                self.check_body(nested);
            }
        }
    }

    fn check_expression(&mut self, expression: &ExpressionNode) {
        for term in expression.terms() {
            match &term.kind {
                ExpressionKind::Name(name) => self.check_name(name),
                ExpressionKind::Call(call) => self.check_call(call),
                ExpressionKind::Paren(paren) => {
                    if let Some(inner) = &paren.inner {
                        self.check_expression(inner);
                    }
                }
                ExpressionKind::Bracket(items) => items.iter().for_each(|item| self.check_expression(item)),
                _ => {}
            }
        }
    }

    /// Names brought in by imports are not declared in the module.
    fn is_imported(&self, name: &str) -> bool {
        self.ctx.module.imports.iter().any(|import| {
            let last = import.name.rsplit('.').next().unwrap_or(&import.name);
            import.name.eq_ignore_ascii_case(name) || last.eq_ignore_ascii_case(name)
        })
    }

    fn check_name(&mut self, name: &NameExpression) {
        for index in name.indices() {
            self.check_expression(index);
        }
        let Some(mut current) = self.ctx.find(name.base()) else {
            if name.head.category != TokenCategory::Keyword && !self.is_imported(name.base()) {
                self.report(Diagnostic::binding(
                    format!("No definition found for {}.", name.base()),
                    name.head.span,
                ));
            }
            return;
        };
        for piece in &name.pieces {
            current = match piece {
                NamePiece::Member(member) => match current.get_member(&member.value, self.ctx) {
                    Some(next) => next,
                    None => {
                        // only members of something with a known shape are reported
                        if !current.get_members(self.ctx).is_empty() {
                            self.report(Diagnostic::binding(
                                format!("{} is not a member of {}.", member.value, current.name()),
                                member.span,
                            ));
                        }
                        return;
                    }
                },
                NamePiece::Index(..) => match self.ctx.element_of(&current) {
                    Some(element) => element,
                    None => return,
                },
                NamePiece::Star(_) => return,
            };
        }
    }

    fn check_call(&mut self, call: &FunctionCallExpression) {
        let name = call.name();
        if self.ctx.settings.skips_validation(&name) {
            return;
        }
        for param in &call.params {
            self.check_expression(param);
        }
        let function = &call.function;
        let callee = if function.is_simple() {
            match self.ctx.find_function(function.base()) {
                Some(callee) => callee,
                None => {
                    let argument_count = self.count_arguments(call, &name);
                    self.deferred.push(DeferredSearch {
                        name,
                        span: function.info.span(),
                        argument_count,
                    });
                    return;
                }
            }
        } else {
            let head = function.base();
            let import = self
                .ctx
                .module
                .imports
                .iter()
                .find(|i| {
                    i.name.eq_ignore_ascii_case(head)
                        || i.name.rsplit('.').next().is_some_and(|last| last.eq_ignore_ascii_case(head))
                });
            match import.map(|i| i.kind) {
                Some(ImportKind::Fgl) if self.ctx.find(head).is_none() => {
                    let argument_count = self.count_arguments(call, &name);
                    let member = function.dotted().rsplit('.').next().unwrap_or_default().to_string();
                    self.deferred.push(DeferredSearch {
                        name: member,
                        span: function.info.span(),
                        argument_count,
                    });
                    return;
                }
                Some(ImportKind::Java) => return,
                _ => {}
            }
            match self.ctx.resolve_name(function) {
                Some(callee) => callee,
                None => {
                    self.check_name(function);
                    return;
                }
            }
        };
        if !call.anything.is_empty() {
            return;
        }
        if let Some(required) = self.required_arguments(&callee) {
            let actual = self.count_arguments(call, &name);
            if actual != required {
                self.report(count_mismatch(actual, required, call.info.span()));
            }
        }
    }

    /// Parameters the callee expects, with record parameters counting one
    /// per field. Variadic and unknown callees expect nothing in particular.
    fn required_arguments(&self, callee: &AnalysisResult) -> Option<usize> {
        match callee {
            AnalysisResult::Function(function) => Some(
                function
                    .parameters()
                    .map(|(_, definition)| {
                        definition
                            .and_then(|d| self.ctx.for_function(Some(function.as_ref())).record_field_count(&d.type_ref))
                            .map(|count| count.max(1))
                            .unwrap_or(1)
                    })
                    .sum(),
            ),
            AnalysisResult::BuiltinFunction(function) if !function.variadic => Some(function.params.len()),
            AnalysisResult::External(function) => Some(function.parameters.len()),
            _ => None,
        }
    }

    /// Counts arguments, expanding `rec.*` to its fields and reporting
    /// misused records and types along the way.
    fn count_arguments(&mut self, call: &FunctionCallExpression, function_name: &str) -> usize {
        let allow_records = self.ctx.settings.allows_non_star_record(function_name);
        let mut actual = 0;
        for param in &call.params {
            actual += 1;
            let Some(name) = param.as_name() else { continue };
            match self.ctx.resolve_name(name) {
                Some(AnalysisResult::Type(_)) => {
                    self.report(Diagnostic::binding("Invalid parameter found.", param.info.span()));
                }
                Some(result) if !allow_records => {
                    let Some(fields) = self.record_size(&result) else { continue };
                    if name.ends_with_star() {
                        actual += fields.saturating_sub(1);
                    } else {
                        self.report(Diagnostic::binding(
                            "Records must be specified with a '.*' ending when passed as a function parameter.",
                            param.info.span(),
                        ));
                    }
                }
                _ => {}
            }
        }
        actual
    }

    fn record_size(&self, result: &AnalysisResult) -> Option<usize> {
        match result {
            AnalysisResult::Variable(_) | AnalysisResult::Element { .. } => {
                let type_ref = result.type_ref()?;
                self.ctx.record_field_count(type_ref).map(|count| count.max(1))
            }
            AnalysisResult::BuiltinVariable(var) if !var.fields.is_empty() => Some(var.fields.len()),
            _ => None,
        }
    }
}
