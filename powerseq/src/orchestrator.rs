/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Startup sequence and hand-over to the handshake loop.
//!
//! ```text
//! deassert all outputs ─► log inputs ─► settle ─► BOOTING + TRANSITION (blocking)
//!      ─► spawn OPERATIONAL heartbeat thread ─► handshake poll loop (never returns)
//! ```
//!
//! After startup two contexts run side by side: the heartbeat thread, which
//! only writes `CPU_OPERATIONAL_HEARTBEAT`, and the handshake loop, which only
//! writes the three handshake outputs.  They share the [`PinIo`] backend but
//! never a line, so no locking is needed between them.

use std::convert::Infallible;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Timings, INPUT_PINS, OUTPUT_PINS};
use crate::handshake::PowerDownHandshake;
use crate::heartbeat::{HeartbeatGenerator, HeartbeatTask};
use crate::pin::{Level, PinIo};
use crate::timer::Timer;

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The operational heartbeat thread (or its runtime) could not be created.
    #[error("failed to start the operational heartbeat task")]
    HeartbeatSpawn(#[source] std::io::Error),
}

/// Everything left running once startup has finished.
pub struct Running<T: Timer> {
    pub heartbeat: HeartbeatTask,
    pub handshake: PowerDownHandshake<T>,
}

pub struct Orchestrator<T: Timer> {
    pins: Arc<dyn PinIo>,
    timings: Timings,
    timer: T,
}

impl<T: Timer> Orchestrator<T> {
    pub fn new(pins: Arc<dyn PinIo>, timings: Timings, timer: T) -> Self {
        Self {
            pins,
            timings,
            timer,
        }
    }

    /// Drive every output deasserted and log the initial input levels.
    pub fn initialize(&self) {
        for pin in &OUTPUT_PINS {
            self.pins.drive(pin, Level::Deasserted);
        }

        for pin in &INPUT_PINS {
            match self.pins.read(pin) {
                Ok(level) => info!(pin = pin.name, %level, "Initial input level"),
                Err(e) => warn!(pin = pin.name, "Cannot read initial input level: {}", e),
            }
        }
    }

    /// Run the startup sequence up to (not including) the handshake loop.
    ///
    /// # Errors
    /// [`OrchestratorError::HeartbeatSpawn`] if the operational heartbeat
    /// cannot be started.
    pub async fn start(&self) -> Result<Running<T>, OrchestratorError> {
        self.initialize();
        info!(
            settle_ms = self.timings.settle_delay.as_millis() as u64,
            boot_secs = self.timings.boot_sequence_duration().as_secs(),
            "Settling before boot heartbeat"
        );
        self.timer.sleep(self.timings.settle_delay).await;

        let mut heartbeat =
            HeartbeatGenerator::new(Arc::clone(&self.pins), self.timings, self.timer.clone());
        heartbeat.run_boot_sequence().await;
        info!(phase = ?heartbeat.phase(), "Boot sequence complete");
        let heartbeat = heartbeat
            .spawn_operational()
            .map_err(OrchestratorError::HeartbeatSpawn)?;

        let handshake =
            PowerDownHandshake::new(Arc::clone(&self.pins), self.timings, self.timer.clone());

        Ok(Running {
            heartbeat,
            handshake,
        })
    }

    /// Start up, then poll the handshake forever.
    ///
    /// Only returns on a startup failure.
    pub async fn run(self) -> Result<Infallible, OrchestratorError> {
        let Running {
            heartbeat,
            mut handshake,
        } = self.start().await?;
        info!(pin = heartbeat.pin().name, "Host CPU operational");

        // The heartbeat handle stays alive for as long as the loop runs.
        let _heartbeat = heartbeat;
        Ok(handshake.run().await)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
