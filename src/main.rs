use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::{debug, error};

use link_shorter::config::{StaticConfig, init_config};
use link_shorter::errors::LinkError;
use link_shorter::runtime::lifetime::{prepare_startup, shutdown_runtime};
use link_shorter::services::LinkCollection;
use link_shorter::system::logging::init_logging;

mod cli;

use cli::{Cli, Commands, ConfigCommands};

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Config {
            action: ConfigCommands::Generate { output_path },
        } => generate_config(output_path.as_deref()),
        command => run_links(cli.config.as_deref(), command),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<LinkError>() {
                Some(link_error) => eprintln!("{}", link_error.format_colored()),
                None => eprintln!("{} {:#}", "[ERROR]".red().bold(), e),
            }
            ExitCode::FAILURE
        }
    }
}

fn run_links(config_path: Option<&str>, command: Commands) -> Result<()> {
    let config = init_config(config_path)?;
    let _log_guard = init_logging(&config.logging)?;
    debug!("Configuration loaded: {:?}", config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let context = runtime.block_on(prepare_startup(&config))?;
    let links: &dyn LinkCollection = context.links.as_ref();

    let outcome = runtime.block_on(async {
        match command {
            Commands::Shorten { urls } => links.generate_keys(&urls).await,
            Commands::Resolve { keys } => links.get_urls(&keys).await,
            Commands::Config { .. } => Ok(Default::default()),
        }
    });

    // 无论成功与否都等待后台持久化，超时后放弃剩余任务
    shutdown_runtime(
        runtime,
        &context.runner,
        Duration::from_secs(config.shutdown.timeout_secs),
    );

    let output = outcome.inspect_err(|e| error!("{}", e.format_simple()))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to render output")?
    );

    Ok(())
}

fn generate_config(output_path: Option<&str>) -> Result<()> {
    match output_path {
        Some(path) => {
            StaticConfig::default().save_to_file(path)?;
            println!("Configuration written to {}", path);
        }
        None => print!("{}", StaticConfig::generate_sample_config()?),
    }
    Ok(())
}
