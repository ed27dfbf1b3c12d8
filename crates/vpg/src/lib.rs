//! Representation, I/O and solvers for parity games.
//!
//! This crate provides two solvers for an explicit parity game
//! ([`ParityGame`]): the recursive Zielonka algorithm ([`solve_zielonka`])
//! and the region-based priority-promotion algorithm
//! ([`solve_priority_promotion`]). It also provides a symbolic parity-game
//! representation and solver ([`SymbolicParityGame`], [`zielonka`]) built
//! directly on top of the reachable-state LDD produced by `symck_symbolic`.

#![forbid(unsafe_code)]

mod display;
#[cfg(feature = "clap")]
mod io;
mod parity_game;
mod partial_solve;
mod pbes_equation_index;
mod predecessors;
mod priority_promotion;
mod random_game;
mod reachability;
mod srf;
mod symbolic_parity_game;
mod symbolic_solve;
mod zielonka;

pub use display::*;
#[cfg(feature = "clap")]
pub use io::*;
pub use parity_game::*;
pub use partial_solve::*;
pub use pbes_equation_index::*;
pub use predecessors::*;
pub use priority_promotion::*;
pub use random_game::*;
pub use reachability::*;
pub use srf::*;
pub use symbolic_parity_game::*;
pub use symbolic_solve::*;
pub use zielonka::*;
