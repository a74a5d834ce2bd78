use anyhow::Context;
use clap::Parser;

use linkpulse::cli::Cli;
use linkpulse::config::StaticConfig;
use linkpulse::interfaces::cli::run_cli_command;
use linkpulse::system::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = StaticConfig::load_from(&cli.config);

    let _guard = init_logging(&config.logging).context("Failed to initialize logging")?;

    if let Err(e) = run_cli_command(cli.command, config).await {
        eprintln!("{}", e.format_colored());
        std::process::exit(1);
    }
    Ok(())
}
