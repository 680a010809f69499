//! Autobot CLI - Main entry point

use autobot_cli::{commands, Cli, Commands};
use autobot_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use clap::Parser;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Warnings only unless verbose or serving
    let level = match (&cli.command, cli.verbose) {
        (_, true) => LogLevel::Debug,
        (Commands::Serve, false) => LogLevel::Info,
        _ => LogLevel::Warn,
    };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("autobot".to_string())
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging
    let _guard = init_logging(&log_config).ok();

    if let Err(e) = execute_command(cli).await {
        error!(kind = e.kind(), error = %e, "Command failed");
        eprintln!("Error [{}]: {}", e.kind(), e);
        process::exit(1);
    }
}

async fn execute_command(cli: Cli) -> autobot_cli::Result<()> {
    let config_path = cli.config.as_deref();

    match &cli.command {
        Commands::Init { path } => commands::init::run(path),
        Commands::Version => {
            commands::version::run();
            Ok(())
        },
        Commands::Serve => commands::serve::run(commands::load_config(config_path)?).await,
        Commands::Sync { provider } => {
            commands::sync::run(&commands::load_config(config_path)?, provider).await
        },
        Commands::Lookup(args) => {
            commands::lookup::run(&commands::load_config(config_path)?, args).await
        },
        Commands::Query(args) => {
            commands::query::run(&commands::load_config(config_path)?, args).await
        },
        Commands::Status => commands::status::run(&commands::load_config(config_path)?).await,
        Commands::Clear => commands::clear::run(&commands::load_config(config_path)?).await,
        Commands::Enable { hash } => {
            commands::vehicle::enable(&commands::load_config(config_path)?, hash).await
        },
        Commands::Disable { hash } => {
            commands::vehicle::disable(&commands::load_config(config_path)?, hash).await
        },
    }
}
