
#![forbid(unsafe_code)]

mod cube_iter;
mod format;
mod io;
mod io_sylvan;
mod io_symbolic_lts;
mod ldd_to_bdd;
mod random_bdd;
mod reachability;
mod summand_group;
mod symbolic_lts;

pub use cube_iter::*;
pub use format::*;
pub use io::*;
pub use io_sylvan::*;
pub use io_symbolic_lts::*;
pub use ldd_to_bdd::*;
pub use random_bdd::*;
pub use reachability::*;
pub use summand_group::*;
pub use symbolic_lts::*;
