use std::fmt;

use clap::Args;

#[derive(Args, Clone, Copy, Debug)]
pub struct VersionFlag {
    #[arg(long, global = true, default_value_t = false, help = "Print the version of this tool")]
    version: bool,
}

impl From<VersionFlag> for bool {
    fn from(val: VersionFlag) -> Self {
        val.version
    }
}

pub struct Version;

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", symck_version::VERSION, &symck_version::BUILD_HASH[..8])
    }
}
