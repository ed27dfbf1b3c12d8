#![doc = include_str!("../README.md")]

mod aterm;
mod aterm_binary_stream;
mod aterm_builder;
mod aterm_int;
mod aterm_list;
mod aterm_storage;
mod aterm_string;
mod gc_mutex;
mod global_aterm_pool;
mod markable;
mod parse_term;
mod protected;
mod random_term;
mod shared_term;
mod symbol;
mod symbol_pool;
mod thread_aterm_pool;
mod transmutable;

pub use aterm::*;
pub use aterm_binary_stream::*;
pub use aterm_builder::*;
pub use aterm_int::*;
pub use aterm_list::*;
pub(crate) use aterm_storage::*;
pub use aterm_string::*;
pub use global_aterm_pool::*;
pub use markable::*;
pub use parse_term::*;
pub use protected::*;
pub use random_term::*;
pub use shared_term::*;
pub use symbol::*;
pub use symbol_pool::*;
pub use thread_aterm_pool::*;
pub use transmutable::*;
