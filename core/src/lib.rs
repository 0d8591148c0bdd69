pub mod analysis;
pub mod ast;
pub mod config;
pub mod context;
pub mod expr;
pub mod parser;
pub mod stmt;
pub mod token;
pub mod typ;
pub mod util;
