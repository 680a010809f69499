//! `autobot serve` command implementation

use autobot_server::config::Config;

use crate::error::Result;

/// Run the daemon until a shutdown signal arrives
pub async fn run(config: Config) -> Result<()> {
    println!("Serving on {}", config.server.bind_address());
    autobot_server::run(config).await?;
    Ok(())
}
