/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use powerseq::config::{Timings, ALL_PINS};
use powerseq::orchestrator::Orchestrator;
use powerseq::pin::CdevPins;
use powerseq::timer::TokioTimer;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Host CPU power sequencer: boot/operational heartbeats and the BMC
/// power-down handshake.
///
/// Runs until killed.
#[derive(Debug, Parser)]
#[command(
    name = "powerseq",
    about = "Host CPU power sequencer – heartbeat and BMC power-down handshake",
    long_about = None,
)]
struct Cli {
    /// Log every GPIO write and handshake poll.
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    verbose: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise --verbose selects debug.
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    info!(verbose = cli.verbose, "powerseq starting up...");

    // Lines that cannot be requested are logged and skipped; only a failure
    // to start the operational heartbeat ends the process.
    let pins = CdevPins::open(&ALL_PINS);
    let orchestrator = Orchestrator::new(Arc::new(pins), Timings::default(), TokioTimer);

    match orchestrator.run().await {
        Ok(never) => match never {},
        Err(e) => {
            error!("{:#}", anyhow::Error::from(e));
            process::exit(1);
        }
    }
}
