//! Application plumbing for Brezza: logging setup and configuration.

pub mod config;

pub use config::{Config, ProviderConfig, ValidationResult};

use anyhow::Result;

/// Initialize logging for the application.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Brezza core initialized");
    Ok(())
}
