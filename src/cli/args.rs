use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config JSON file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging for internal details
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Edit text interactively with named transformations (default)
    Interactive(InteractiveArgs),
    /// Apply transformations once to the clipboard, or to stdin with --stdin
    Apply(ApplyArgs),
    /// List loaded transformations
    List,
    /// Show hotkey bindings declared by transformations
    Hotkeys,
}

#[derive(Args, Debug, Default)]
pub struct InteractiveArgs {
    /// Reload rules when the config file changes
    #[arg(long)]
    pub watch: bool,
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Transformations to apply, in order
    #[arg(required = true, num_args = 1..)]
    pub rules: Vec<String>,

    /// Read text from stdin and print the result instead of using the clipboard
    #[arg(long)]
    pub stdin: bool,
}
