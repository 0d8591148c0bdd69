//! Completion context determination.
//!
//! Works on tokens, not on the syntax tree: the buffer is usually mid-edit
//! and need not parse. The nearest mapped token before the caret selects a
//! set of [`ContextPossibility`] entries from the shared [`ContextMap`],
//! and backward guards narrow them down.

mod map;
mod matcher;
mod providers;

#[cfg(test)]
mod map_test;
#[cfg(test)]
mod matcher_test;

pub use map::{BackwardSearchItem, ContextMap, ContextPossibility, SearchTarget, TokenKey};
pub use matcher::{get_context_members, get_context_members_with};
pub use providers::{SetProvider, statement_start_keywords};
