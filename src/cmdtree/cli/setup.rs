use clap::Parser;
use cmdtree::ColorChoice;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `CMDTREE_LOG=debug`.
pub const LOG_ENV: &str = "CMDTREE_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "cmdtree",
    bin_name = "cmdtree",
    about = "Command-tree framework demo",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Launcher {
    /// When to use colors
    #[arg(long, value_name = "WHEN")]
    pub color: Option<ColorChoice>,

    /// Directory holding cmdtree.json
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Command path and arguments, handled by the command tree
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Logs go to stderr so they never mix with command output.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
