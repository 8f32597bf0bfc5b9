use std::process::ExitCode;
use std::sync::Arc;

use docgate_rs::api::server::GatewayServer;
use docgate_rs::helpers::{build_gateway, log_level, shutdown_signal};
use docgate_rs::GatewayConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {}", err);
            return ExitCode::FAILURE;
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level(&config.log_level))
        .init();

    let listener = match GatewayServer::bind(&config.bind_addr()) {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    let gateway = match build_gateway(config) {
        Ok(gateway) => Arc::new(gateway),
        Err(err) => {
            tracing::error!("startup failed: {}", err);
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = GatewayServer::new(gateway).serve(listener, shutdown_signal()).await {
        tracing::error!("server error: {}", err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
