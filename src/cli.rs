//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// linkpulse - short link resolution and click analytics
#[derive(Parser)]
#[command(name = "linkpulse")]
#[command(version)]
#[command(about = "Short link resolution with click analytics", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, short = 'c', global = true, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Create a short link
    Create {
        /// Target URL
        url: String,

        /// Owner id
        #[arg(long)]
        owner: Option<i64>,

        /// Expiration (RFC3339 or relative like "30m", "2h", "7d", "1w")
        #[arg(long)]
        expires_in: Option<String>,
    },

    /// Resolve a short code and record a click
    Resolve {
        code: String,

        #[arg(long)]
        user_agent: Option<String>,

        /// Client IP used for the click record
        #[arg(long, default_value = "127.0.0.1")]
        ip: String,

        #[arg(long)]
        referrer: Option<String>,
    },

    /// Show click statistics for a short code
    Stats {
        code: String,

        /// Drop the cached snapshot and recompute
        #[arg(long)]
        refresh: bool,
    },

    /// Deactivate expired links now
    Sweep,

    /// List links of an owner
    List {
        #[arg(long)]
        owner: i64,

        /// Only active links
        #[arg(long)]
        active: bool,

        #[arg(long, default_value_t = 1)]
        page: u64,

        #[arg(long, default_value_t = 20)]
        page_size: u64,
    },

    /// Keep background tasks running until Ctrl-C
    Run,

    /// Generate a configuration file with default values
    GenerateConfig {
        /// Output path (default: config.example.toml)
        path: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create() {
        let cli = Cli::parse_from([
            "linkpulse",
            "create",
            "https://example.com",
            "--owner",
            "3",
            "--expires-in",
            "7d",
        ]);
        assert_eq!(
            cli.command,
            Commands::Create {
                url: "https://example.com".into(),
                owner: Some(3),
                expires_in: Some("7d".into()),
            }
        );
        assert_eq!(cli.config, "config.toml");
    }

    #[test]
    fn test_parse_list_defaults() {
        let cli = Cli::parse_from(["linkpulse", "-c", "x.toml", "list", "--owner", "5"]);
        assert_eq!(cli.config, "x.toml");
        assert_eq!(
            cli.command,
            Commands::List {
                owner: 5,
                active: false,
                page: 1,
                page_size: 20,
            }
        );
    }

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::parse_from(["linkpulse", "resolve", "abc", "--user-agent", "curl/8"]);
        match cli.command {
            Commands::Resolve {
                code,
                user_agent,
                ip,
                referrer,
            } => {
                assert_eq!(code, "abc");
                assert_eq!(user_agent.as_deref(), Some("curl/8"));
                assert_eq!(ip, "127.0.0.1");
                assert!(referrer.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
