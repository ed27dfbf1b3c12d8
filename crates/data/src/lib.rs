//! Data expressions, sorts and the rewrite-and-enumerate substitution layer they are evaluated
//! under.

mod data_expression;
mod data_specification;
mod enumerator;
mod enumerator_identifier_generator;
mod mutable_indexed_substitution;
mod sort_terms;

pub use data_expression::*;
pub use data_specification::*;
pub use enumerator::*;
pub use enumerator_identifier_generator::*;
pub use mutable_indexed_substitution::*;
pub use sort_terms::*;
