// Copyright (c) 2025 The Attestation Verifier Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use anyhow::{Context, Result};
use clap::Parser;
use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use verifier::{new_oracle, Baseline, Verifier};

mod config;
mod router;
mod verify;

use config::{load_config, DEFAULT_CONFIG_PATH};
use router::Router;
use verify::{VerifyHandler, VERIFY_ROOT};

type GenericError = Box<dyn std::error::Error + Send + Sync>;

/// Attestation verifier arguments info.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path for the attestation verifier
    #[arg(default_value_t = DEFAULT_CONFIG_PATH.to_string(), short, long = "config")]
    config: String,

    /// Listen address, overriding `bind` from the config file.
    ///
    /// Example:
    /// `--bind 127.0.0.1:5000`
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }

    info!(
        "Starting attestation verifier with config {} (bind {})",
        args.config, config.bind
    );

    let address: SocketAddr = config
        .bind
        .parse()
        .with_context(|| format!("failed to parse the bind address {}", config.bind))?;

    // The baseline must be in place before the first request is served.
    let baseline = Baseline::from_file(&config.baseline_path).context("load PCR baseline")?;
    let oracle = new_oracle(config.oracle.backend, &config.oracle.checkquote_path)?;
    info!(
        "Quote oracle: {} (timeout {}s)",
        config.oracle.backend, config.oracle.timeout_secs
    );
    let verifier = Verifier::new(Arc::new(baseline), oracle, config.session_config());

    let mut router = Router::new();
    router.register_route(VERIFY_ROOT, Box::new(VerifyHandler::new(verifier)));
    let router = Arc::new(router);

    let api_service = make_service_fn(|conn: &AddrStream| {
        let remote_addr = conn.remote_addr();
        let local_router = router.clone();

        async move {
            Ok::<_, GenericError>(service_fn(move |req| {
                let local_router = local_router.clone();
                async move { local_router.route(remote_addr, req).await }
            }))
        }
    });

    let server = Server::try_bind(&address)
        .with_context(|| format!("failed to bind {address}"))?
        .serve(api_service);

    info!("Attestation verifier listening on http://{}", address);

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = interrupt.recv() => info!("SIGINT received, gracefully shutdown."),
        _ = terminate.recv() => info!("SIGTERM received, gracefully shutdown."),
        res = server => {
            if let Err(e) = res {
                error!("Attestation verifier server error: {}", e);
            }
        }
    }

    Ok(())
}
