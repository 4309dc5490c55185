use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "scoreday")]
#[command(about = "Sports-day scoreboard - enter results and watch the standings update live")]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Score store file (overrides config)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Initial page query, e.g. "?year=y7&group=boys"
    #[arg(long)]
    pub query: Option<String>,

    /// Acknowledge each submission with its event id instead of page-wide
    #[arg(long)]
    pub keyed_completions: bool,
}
