#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

#[macro_use]
mod cast_macro;

mod compressed_vec;
mod debug_trace;
mod error;
mod format;
mod generational_index;
mod helper;
mod indexed_set;
mod macros;
mod no_hasher;
mod permutation;
mod pest_display_pair;
mod protection_set;
mod random_test;
mod tagged_index;
mod test_logger;
mod timing;
mod vecset;

pub use compressed_vec::*;
pub use error::*;
pub use format::*;
pub use generational_index::*;
pub use helper::*;
pub use indexed_set::*;
pub use no_hasher::*;
pub use permutation::*;
pub use pest_display_pair::*;
pub use protection_set::*;
pub use random_test::*;
pub use tagged_index::*;
pub use test_logger::*;
pub use timing::*;
pub use vecset::*;
