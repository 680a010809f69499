//! `autobot version` command implementation

/// Print the CLI version
pub fn run() {
    println!("autobot {}", env!("CARGO_PKG_VERSION"));
}
