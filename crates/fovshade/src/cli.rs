use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "fovshade",
    author,
    version,
    about = "Live shader experimentation host with foveated rendering",
    arg_required_else_help = false
)]
pub struct Args {
    /// Path to the TOML configuration file; shader paths inside it resolve
    /// relative to its directory.
    #[arg(long, value_name = "PATH", default_value = "params/fovshade.toml")]
    pub config: PathBuf,

    /// Override the configured vsync setting.
    #[arg(long, value_name = "BOOL")]
    pub vsync: Option<bool>,
}

pub fn parse() -> Args {
    Args::parse()
}
