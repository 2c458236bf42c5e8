use std::path::PathBuf;

use clap::Parser;

pub const VERSION: &str = git_version::git_version!(
    args = ["--tags", "--always", "--dirty=-modified"],
    fallback = env!("CARGO_PKG_VERSION")
);

/// Stops an idle game server and starts it again on request
#[derive(Parser, Debug)]
#[command(author, version = VERSION, about, long_about = None)]
pub struct Cli {
    /// Config file, defaults to /etc/idle-controller/idle-controller.cfg or ./idle-controller.cfg
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Validate the config and exit
    #[arg(long, default_value_t = false)]
    pub check: bool,
}

impl Cli {
    pub fn init() -> Self { Cli::parse() }
}
