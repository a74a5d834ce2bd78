//! CLI interface module

pub mod commands;

use std::fmt;

use crate::cli::Commands;
use crate::config::StaticConfig;
use crate::runtime::AppContext;

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::LinkpulseError> for CliError {
    fn from(err: crate::errors::LinkpulseError) -> Self {
        if matches!(err, crate::errors::LinkpulseError::InvalidInput(_)) {
            CliError::ParseError(err.format_simple())
        } else if err.is_database() {
            CliError::StorageError(err.format_simple())
        } else {
            CliError::CommandError(err.format_simple())
        }
    }
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli_command(cmd: Commands, config: StaticConfig) -> Result<(), CliError> {
    // 不需要存储的命令
    if let Commands::GenerateConfig { path } = &cmd {
        return commands::generate_config(path.clone());
    }

    let ctx = AppContext::build(config).await?;
    let result = match cmd {
        Commands::Create {
            url,
            owner,
            expires_in,
        } => commands::create_link(&ctx, &url, owner, expires_in.as_deref()).await,
        Commands::Resolve {
            code,
            user_agent,
            ip,
            referrer,
        } => commands::resolve_link(&ctx, &code, &ip, user_agent, referrer).await,
        Commands::Stats { code, refresh } => commands::show_stats(&ctx, &code, refresh).await,
        Commands::Sweep => commands::sweep(&ctx).await,
        Commands::List {
            owner,
            active,
            page,
            page_size,
        } => commands::list_links(&ctx, owner, active, page, page_size).await,
        Commands::Run => commands::run_until_signal(&ctx).await,
        Commands::GenerateConfig { .. } => Ok(()),
    };

    ctx.shutdown().await;
    result
}
