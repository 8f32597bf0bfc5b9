use std::sync::Arc;

use tracing::Level;

use crate::config::{ConfigError, GatewayConfig};
use crate::gateway::Gateway;
use crate::parser::{CommandParser, DocumentParser};

/// Wires the command-line parser into a gateway.
pub fn build_gateway(config: GatewayConfig) -> Result<Gateway, ConfigError> {
    let parser = CommandParser::new(&config.parser_command);
    tracing::info!(
        "parser command {} (version {})",
        parser.program(),
        parser.version()
    );
    Gateway::new(config, Arc::new(parser))
}

pub fn log_level(raw: &str) -> Level {
    match raw.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown requested"),
        Err(err) => {
            tracing::error!("failed to listen for ctrl-c: {}", err);
            std::future::pending::<()>().await
        }
    }
}
