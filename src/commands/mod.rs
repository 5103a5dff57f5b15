//! CLI command definitions and dispatch.

pub mod serve;
pub mod token;

use clap::{Parser, Subcommand};

use chathub_core::config::AppConfig;
use chathub_core::error::AppError;

/// ChatHub — multi-channel chat over WebSocket
#[derive(Debug, Parser)]
#[command(name = "chathub", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding `default.toml` and per-environment overlays
    #[arg(short, long, default_value = "config")]
    pub config_dir: String,

    /// Environment overlay to apply (`{config_dir}/{env}.toml`)
    #[arg(short, long, env = "CHATHUB_ENV", default_value = "development")]
    pub env: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the ChatHub server
    Serve(serve::ServeArgs),
    /// Issue a signed token for a username
    Token(token::TokenArgs),
}

impl Cli {
    /// Load configuration for the selected environment.
    pub fn load_config(&self) -> Result<AppConfig, AppError> {
        AppConfig::load_from(&self.config_dir, &self.env)
    }

    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Serve(args) => serve::execute(args, config).await,
            Commands::Token(args) => token::execute(args, &config),
        }
    }
}
