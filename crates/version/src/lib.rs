//! Build-time version information, shared by every binary in the workspace.

/// The crate version declared in the workspace's `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The `git rev-parse HEAD` hash captured at build time, or `"UNKNOWN0"` outside a git checkout.
pub const BUILD_HASH: &str = env!("BUILD_HASH");
