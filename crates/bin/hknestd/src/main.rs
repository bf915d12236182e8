//! # hknestd — Nest to HomeKit bridge daemon
//!
//! Composition root that wires the Nest and HomeKit adapters together and
//! runs the bridge until it is terminated.
//!
//! ## Responsibilities
//! - Parse configuration (CLI args, env vars, config file)
//! - Authorize against Nest once when no reusable token is supplied, and
//!   print the token so it can be passed on later runs
//! - Construct the Nest client, the HomeKit host and the application use-cases
//! - Subscribe to the device stream and mirror every device
//! - Stop every accessory transport on SIGTERM/SIGINT
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod cli;
mod config;
mod error;
mod sink;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use hknest_adapter_hap::HapHost;
use hknest_adapter_nest::{NestClient, NestConfig, NestCredentials};
use hknest_app::dispatcher::StreamDispatcher;
use hknest_app::factory::{AccessoryFactory, FactoryOptions};
use hknest_app::forwarder::CommandForwarder;
use hknest_app::transport::Transports;
use secrecy::{ExposeSecret, SecretString};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::{Config, NestAuth};
use crate::error::{RunError, exit_status};
use crate::sink::StdoutSnapshotSink;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(&cli.config, &cli) {
        Ok(config) => config,
        Err(err) => {
            println!("{}", RunError::from(err).report());
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.log_filter());

    let outcome = run(config).await;
    if let Err(err) = &outcome {
        println!("{}", err.report());
    }
    ExitCode::from(exit_status(&outcome))
}

fn init_tracing(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(config: Config) -> Result<(), RunError> {
    let Config {
        nest,
        homekit,
        bridge,
        ..
    } = config;

    let (auth, api) = nest.into_auth()?;
    let token = match auth {
        NestAuth::Token(token) => token,
        NestAuth::Pin(credentials) => authorize(&credentials, &api).await?,
    };

    // Nest
    let nest = Arc::new(NestClient::new(&api, token).map_err(RunError::Nest)?);
    let (forwarder, commands) = CommandForwarder::new(Arc::clone(&nest));
    let forwarder = forwarder.start();

    // HomeKit
    let host = HapHost::new(homekit).await?;
    let (transports, mut failures) = Transports::new();
    let options = FactoryOptions {
        mirror_alarm_state: bridge.mirror_alarm_state,
        ..FactoryOptions::default()
    };
    let factory = Arc::new(AccessoryFactory::new(
        host,
        transports.clone(),
        commands,
        options,
    ));

    // Stream
    let mut dispatcher =
        match StreamDispatcher::subscribe(nest.as_ref(), factory, StdoutSnapshotSink).await {
            Ok(dispatcher) => dispatcher,
            Err(err) => {
                forwarder.abort();
                return Err(RunError::Stream(err));
            }
        };
    println!("bridging Nest devices to HomeKit");

    let outcome = tokio::select! {
        result = dispatcher.run_until(shutdown_signal()) => result.map_err(RunError::Stream),
        Some(failure) = failures.recv() => Err(RunError::Transport {
            accessory: failure.accessory,
            source: failure.error,
        }),
    };

    if outcome.is_ok() {
        println!("shutting down");
    }
    let lingering = transports.stop_all(bridge.shutdown_timeout()).await;
    if lingering > 0 {
        tracing::warn!(lingering, "some accessory transports did not stop in time");
    }
    forwarder.abort();
    outcome
}

/// Print where to authorize the product, then trade the PIN for a token.
async fn authorize(
    credentials: &NestCredentials,
    api: &NestConfig,
) -> Result<SecretString, RunError> {
    let url = credentials
        .authorization_url(api)
        .map_err(RunError::Authorization)?;
    println!("authorization page: {url}");

    let http = api.build_client().map_err(RunError::Nest)?;
    let token = credentials
        .exchange_pin(&http, api)
        .await
        .map_err(RunError::Authorization)?;
    println!("nest token: {}", token.token.expose_secret());
    Ok(token.token)
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl-C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
