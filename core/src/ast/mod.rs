mod module;
mod outline;


pub use module::{DatabaseNode, ImportKind, ImportNode, ModuleItem, ModuleNode, ParseOutput, ParserOptions, parse_module};
pub use outline::OutlineRegion;

use std::collections::BTreeMap;

use crate::token::Span;

/// Span and completion state shared by every node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeInfo {
    pub start: usize,
    pub end: usize,
    pub is_complete: bool,
    /// End of the header (`if cond then`, `function f(a)`) used for folding.
    pub decorator_end: Option<usize>,
}

impl NodeInfo {
    pub fn at(start: usize) -> Self {
        Self {
            start,
            end: start,
            ..Default::default()
        }
    }

    pub fn spanning(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            is_complete: true,
            decorator_end: None,
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    pub fn decorator_span(&self) -> Option<Span> {
        self.decorator_end.map(|end| Span::new(self.start, end))
    }
}

pub trait AstNode {
    fn info(&self) -> &NodeInfo;

    fn start_index(&self) -> usize {
        self.info().start
    }

    fn end_index(&self) -> usize {
        self.info().end
    }

    fn is_complete(&self) -> bool {
        self.info().is_complete
    }
}

macro_rules! impl_ast_node {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::ast::AstNode for $ty {
                fn info(&self) -> &$crate::ast::NodeInfo {
                    &self.info
                }
            }
        )*
    };
}
pub(crate) use impl_ast_node;

/// Child nodes keyed by start offset. Keys are unique, so iteration order is
/// source order.
#[derive(Debug, Clone)]
pub struct Children<T> {
    items: BTreeMap<usize, T>,
}

impl<T> Default for Children<T> {
    fn default() -> Self {
        Self { items: BTreeMap::new() }
    }
}

impl<T> Children<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a child unless one already starts at `start`.
    pub fn insert(&mut self, start: usize, node: T) -> bool {
        if self.items.contains_key(&start) {
            return false;
        }
        self.items.insert(start, node);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, start: usize) -> Option<&T> {
        self.items.get(&start)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (usize, &T)> {
        self.items.iter().map(|(k, v)| (*k, v))
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.items.values()
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.items.keys().copied()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.values().next()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.values().next_back()
    }
}
