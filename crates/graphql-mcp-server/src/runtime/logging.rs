//! Logging setup
//!
//! Stdout carries MCP messages, so logs always go to stderr.

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Build the filter from `RUST_LOG` plus the requested level
pub fn env_filter(level: Level) -> Result<EnvFilter, anyhow::Error> {
    let mut env_filter = EnvFilter::from_default_env().add_directive(level.into());

    if level == Level::INFO {
        env_filter = env_filter.add_directive("rmcp=warn".parse()?);
    }
    Ok(env_filter)
}

/// Sets up stderr logging
pub fn setup_logging(level: Level) -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(env_filter(level)?)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(false),
        )
        .init();

    Ok(())
}
