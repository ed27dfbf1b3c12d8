#![doc = include_str!("../README.md")]

mod incoming_transitions;
mod io_aut;
mod io_bcg;
mod io_lts;
mod io;
mod labelled_transition_system;
mod lts_builder_fast;
mod lts_builder;
mod lts;
mod multi_action;
mod product_lts;
mod random_lts;

pub use incoming_transitions::*;
pub use io_aut::*;
pub use io_bcg::*;
pub use io_lts::*;
pub use io::*;
pub use labelled_transition_system::*;
pub use lts_builder_fast::*;
pub use lts_builder::*;
pub use lts::*;
pub use multi_action::*;
pub use product_lts::*;
pub use random_lts::*;
