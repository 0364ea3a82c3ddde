use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "filterstream")]
#[command(version = "0.3.0")]
#[command(about = "Consume a filtered real-time event stream with server-side rule management")]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Skip the startup rule reset (list, batch-delete, recreate)
    #[arg(long)]
    pub skip_rule_reset: bool,
}
