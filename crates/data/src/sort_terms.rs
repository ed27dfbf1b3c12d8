use std::borrow::Borrow;
use std::fmt;
use std::marker::PhantomData;
use std::mem::transmute;
use std::ops::Deref;

use delegate::delegate;

use symck_aterm::ATerm;
use symck_aterm::ATermArgs;
use symck_aterm::ATermIndex;
use symck_aterm::ATermRef;
use symck_aterm::Markable;
use symck_aterm::Marker;
use symck_aterm::Symb;
use symck_aterm::SymbolRef;
use symck_aterm::Term;
use symck_aterm::TermIterator;
use symck_aterm::Transmutable;
use symck_macros::symck_derive_terms;
use symck_macros::symck_term;

use crate::DATA_SYMBOLS;
use crate::is_sort_expression;

// This module is only used internally to run the proc macro.
#[symck_derive_terms]
mod inner {
    use symck_aterm::ATermString;

    use super::*;

    #[symck_term(is_sort_expression)]
    pub struct SortExpression {
        term: ATerm,
    }

    impl SortExpression {
        /// Returns the name of the sort.
        pub fn name(&self) -> &str {
            self.term.arg(0).get_head_symbol().name()
        }

        /// Creates a sort expression with the unknown value.
        pub fn unknown_sort() -> SortExpression {
            DATA_SYMBOLS.with_borrow(|ds| SortExpression {
                term: ATerm::with_args(ds.sort_id_symbol.deref(), &[ATermString::new("@no_value@")]).protect(),
            })
        }
    }

    impl fmt::Display for SortExpression {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.name())
        }
    }
}

pub use inner::*;
