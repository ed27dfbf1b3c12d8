#![doc = include_str!("../README.md")]
#[forbid(unsafe_code)]
mod format;
mod io_ldd;
mod io_sylvan;
pub mod iterators;
mod operations;
mod storage;
mod test_utility;

pub use format::*;
pub use io_ldd::*;
pub use io_sylvan::*;
pub use operations::*;
pub use storage::*;
pub use test_utility::*;
