//! `autobot init` command implementation

use autobot_server::config::Config;
use colored::Colorize;
use std::path::Path;

use crate::error::{CliError, Result};

/// Write the configuration template to `path`
pub fn run(path: &Path) -> Result<()> {
    Config::write_template(path).map_err(CliError::Config)?;

    println!("{} {}", "Created".green().bold(), path.display());
    println!("Edit the [providers] section, then run 'autobot sync -p <provider>'.");
    Ok(())
}
