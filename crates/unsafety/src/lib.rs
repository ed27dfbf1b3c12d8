#![doc = include_str!("../README.md")]

mod block_allocator;
mod counting_allocator;
mod erasable;
mod global_allocator;
mod index_edge;
mod slice_dst;
mod stable_pointer_set;

pub use block_allocator::*;
pub use counting_allocator::*;
pub use erasable::*;
pub use global_allocator::*;
pub use index_edge::*;
pub use slice_dst::*;
pub use stable_pointer_set::*;
