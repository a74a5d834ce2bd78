//! Sweep and long-running mode

use colored::Colorize;
use tracing::info;

use crate::interfaces::cli::CliError;
use crate::runtime::AppContext;

pub async fn sweep(ctx: &AppContext) -> Result<(), CliError> {
    let affected = ctx.sweeper.run_once().await?;
    println!(
        "{} Deactivated {} expired links",
        "✓".bold().green(),
        affected.to_string().cyan()
    );
    Ok(())
}

pub async fn run_until_signal(ctx: &AppContext) -> Result<(), CliError> {
    info!(
        "linkpulse running with {} background tasks, press Ctrl-C to stop",
        ctx.background_task_count()
    );
    crate::system::signal::wait_for_shutdown().await;
    info!("Shutdown signal received");
    Ok(())
}
