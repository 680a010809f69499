//! Autobot server - main entry point

use anyhow::Result;
use autobot_common::logging::{init_logging, LogConfig};
use autobot_server::config::Config;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("autobot-server".to_string())
        .filter_directives("autobot_server=debug,tower_http=debug,suppaftp=info".to_string())
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    let _guard = init_logging(&log_config)?;

    info!("Starting Autobot server");

    let config = Config::load(None)?;
    info!(
        providers = config.providers.len(),
        "Configuration loaded - server will bind to {}",
        config.server.bind_address()
    );

    autobot_server::run(config).await
}
