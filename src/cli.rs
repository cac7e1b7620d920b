//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// link-shorter - sequential short keys for long URLs
#[derive(Parser)]
#[command(name = "link-shorter")]
#[command(version)]
#[command(about = "Assign short keys to URLs and resolve them back", long_about = None)]
pub struct Cli {
    /// Configuration file path (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Assign a short key to each URL
    Shorten {
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,
    },

    /// Resolve short keys back to their URLs
    Resolve {
        #[arg(required = true, num_args = 1..)]
        keys: Vec<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: stdout)
        output_path: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shorten_with_config() {
        let cli = Cli::parse_from([
            "link-shorter",
            "-c",
            "custom.toml",
            "shorten",
            "https://a.example",
            "https://b.example",
        ]);
        assert_eq!(cli.config.as_deref(), Some("custom.toml"));
        match cli.command {
            Commands::Shorten { urls } => assert_eq!(urls.len(), 2),
            _ => panic!("expected shorten"),
        }
    }

    #[test]
    fn test_resolve_requires_a_key() {
        assert!(Cli::try_parse_from(["link-shorter", "resolve"]).is_err());
    }
}
