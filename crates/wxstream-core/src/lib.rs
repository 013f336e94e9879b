//! Core configuration and bootstrap for wxstream.

pub mod config;

pub use config::{
    Config, DefaultSettings, Provider, ProviderConfig, RefreshConfig, Scale, ValidationResult,
};

use anyhow::Result;

/// Initialize tracing for the host process.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("wxstream core initialized");
    Ok(())
}
