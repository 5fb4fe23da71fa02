mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, InteractiveArgs};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments first to get debug flag
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    // Session output owns stdout
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        None => cli::run_interactive(cli.config, &InteractiveArgs::default()).await?,
        Some(command) => match command {
            Commands::Interactive(args) => cli::run_interactive(cli.config, &args).await?,
            Commands::Apply(args) => cli::handle_apply_command(cli.config, &args).await?,
            Commands::List => cli::handle_list_command(cli.config).await?,
            Commands::Hotkeys => cli::handle_hotkeys_command(cli.config).await?,
        },
    }

    Ok(())
}
