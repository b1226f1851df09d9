use clap::{Parser, Subcommand};
use std::path::PathBuf;

const HELP_EPILOG: &str = r#"Server options can also be provided via environment variables:
  CONFIG_PATH (default: ./config.yaml, built-in defaults if absent)
  DB_PATH     (default: config.db_path or database.sqlite)
  PORT        (default: config.listen_port or 5000)
  RUST_LOG    (default: info)
"#;

#[derive(Debug, Parser)]
#[command(
    name = "flyjar-server",
    version,
    about = "REST backend for users, jars and flies",
    long_about = None,
    after_long_help = HELP_EPILOG,
)]
pub struct Cli {
    /// Optional subcommand. Without one, runs the server.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a commented default config file
    InitConfig {
        /// Destination path for the config file
        #[arg(long, default_value = "config.yaml")]
        path: PathBuf,
        /// Overwrite the file if it already exists
        #[arg(long)]
        force: bool,
    },
}
