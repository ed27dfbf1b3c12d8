//! Small pieces of CLI plumbing shared by the workspace's command line tools.

pub mod verbosity;
pub mod version;

pub use verbosity::*;
pub use version::*;
