//! CloudSync admin console
//!
//! One invocation is one console session: the configuration is loaded, a
//! session is opened against the service, the subcommand runs, and the session
//! is closed.
//!
//! Request failures are printed by the session's default failure handler as
//! they happen, so `main` does not print them a second time.

mod cli;
mod commands;
mod config;
mod prompt;
mod render;

use std::process::ExitCode;

use clap::Parser;
use cloudsync_client::GatewayError;
use cloudsync_core::CoreError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use commands::Output;
use config::ConsoleConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ConsoleConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    // 日志输出到 stderr，stdout 留给结果
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .with(filter)
        .init();

    tracing::debug!("Using CloudSync API at {}", config.base_url);

    let mut session = match commands::open_session(&config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let output = if cli.json { Output::Json } else { Output::Text };
    let result = commands::run(&mut session, cli.command, &config, output).await;
    session.logout();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !already_reported(&e) {
                eprintln!("{e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn already_reported(error: &anyhow::Error) -> bool {
    error.downcast_ref::<GatewayError>().is_some()
        || matches!(
            error.downcast_ref::<CoreError>(),
            Some(CoreError::Gateway(_))
        )
}
