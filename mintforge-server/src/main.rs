//! # Mintforge Server
//!
//! Token deployment service.
//!
//! ## Overview
//!
//! Mintforge turns token-standard descriptors (kind + feature modules) into
//! deployed on-chain contracts with a durable audit record:
//!
//! - **Serialized deployments**: a single-concurrency job scheduler keeps at
//!   most one deployment in flight against the deployer account
//! - **Immutable builds**: deployable bytecode comes only from precompiled
//!   artifacts resolved by deterministic keys, never compiled per request
//! - **Supervised toolchain**: the deployment toolchain runs as an isolated
//!   child process with strict sentinel-file result semantics
//! - **Retry-safe verification**: source verification against an
//!   Etherscan-style registrar with bounded retries and resumable polling

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mintforge_server::{Config, routes, state::build_state};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "mintforge-server")]
#[command(about = "Token deployment service with serialized on-chain deployments")]
struct Cli {
    /// Server port (overrides config)
    #[arg(short, long, env = "MINTFORGE_PORT_OVERRIDE")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "MINTFORGE_HOST_OVERRIDE")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let env_loaded = dotenvy::dotenv().is_ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if env_loaded {
        info!("loaded .env file");
    }

    let mut config = Config::from_env().context("invalid configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }

    anyhow::ensure!(
        config.artifacts_dir.is_dir(),
        "artifacts directory does not exist: {}",
        config.artifacts_dir.display()
    );

    info!(
        artifacts_dir = %config.artifacts_dir.display(),
        toolchain = %config.toolchain.program,
        network = %config.default_network,
        verification = config.registrar.is_some(),
        "starting mintforge"
    );

    let state = build_state(&config);
    let app = routes::create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("listening on {addr}");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
