//! This crate provides the syntax definition of mCRL2.
//!
//! This crate contains no unsafe code.
#![forbid(unsafe_code)]

mod consume;
mod parse;
mod precedence;
mod syntax_tree;
mod syntax_tree_display;
mod visitor;

pub use consume::*;
pub use parse::*;
pub use precedence::*;
pub use syntax_tree::*;
pub use syntax_tree_display::*;
pub use visitor::*;
