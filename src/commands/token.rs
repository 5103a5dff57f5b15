//! Issue a token for local testing and scripted clients.

use clap::Args;

use chathub_auth::JwtEncoder;
use chathub_core::config::AppConfig;
use chathub_core::error::AppError;

/// Arguments for the token command
#[derive(Debug, Args)]
pub struct TokenArgs {
    /// Username to place in the token
    #[arg(short, long)]
    pub username: String,
}

/// Execute the token command: prints the signed token to stdout
pub fn execute(args: &TokenArgs, config: &AppConfig) -> Result<(), AppError> {
    let token = JwtEncoder::new(&config.auth).issue(&args.username)?;
    println!("{token}");
    Ok(())
}
