use crate::{
    ast::{ModuleItem, ModuleNode, NodeInfo},
    stmt::{Declaration, FunctionKind, Statement},
    token::Span,
    typ::TypeKind,
};

/// A foldable block: its whole span and the header shown when folded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRegion {
    pub label: String,
    pub span: Span,
    pub header: Option<Span>,
    pub depth: usize,
    pub is_complete: bool,
}

impl OutlineRegion {
    fn from_info(label: impl Into<String>, info: &NodeInfo, depth: usize) -> Self {
        Self {
            label: label.into(),
            span: info.span(),
            header: info.decorator_span(),
            depth,
            is_complete: info.is_complete,
        }
    }
}

impl ModuleNode {
    /// Every block with a header, in source order, nested blocks after
    /// their parent.
    pub fn outline_regions(&self) -> Vec<OutlineRegion> {
        let mut regions = Vec::new();
        for item in self.items.values() {
            match item {
                ModuleItem::Globals(globals) if !globals.is_include() => {
                    regions.push(OutlineRegion::from_info("globals", &globals.info, 0));
                    for declaration in &globals.declarations {
                        outline_declaration(declaration, 1, &mut regions);
                    }
                }
                ModuleItem::Declaration(declaration) => outline_declaration(declaration, 0, &mut regions),
                ModuleItem::Function(function) => {
                    let label = match function.kind {
                        FunctionKind::Main => "main".to_string(),
                        FunctionKind::Function => format!("function {}", function.name),
                    };
                    regions.push(OutlineRegion::from_info(label, &function.info, 0));
                    for declaration in &function.declarations {
                        outline_declaration(declaration, 1, &mut regions);
                    }
                    outline_statements(&function.body, 1, &mut regions);
                }
                _ => {}
            }
        }
        regions
    }
}

fn outline_statements(body: &[Statement], depth: usize, regions: &mut Vec<OutlineRegion>) {
    for statement in body {
        let info = statement.info();
        if info.decorator_end.is_some() {
            regions.push(OutlineRegion::from_info(statement.label(), info, depth));
        }
        for nested in statement.bodies() {
            outline_statements(nested, depth + 1, regions);
        }
    }
}

/// Record definitions are the only foldable declarations.
fn outline_declaration(declaration: &Declaration, depth: usize, regions: &mut Vec<OutlineRegion>) {
    let type_refs: Vec<_> = match declaration {
        Declaration::Define(define) => define.definitions.iter().filter_map(|d| d.type_ref.as_ref()).collect(),
        Declaration::Type(types) => types.definitions.iter().map(|d| &d.type_ref).collect(),
        Declaration::Constant(_) => Vec::new(),
    };
    for type_ref in type_refs {
        let mut current = type_ref.as_ref();
        while let TypeKind::Array(array) = &current.kind {
            current = array.element.as_ref();
        }
        if let TypeKind::Record(record) = &current.kind {
            regions.push(OutlineRegion::from_info("record", &record.info, depth));
        }
    }
}
