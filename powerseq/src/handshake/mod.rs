/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Power-down handshake between the host CPU and the BMC.
//!
//! [`PowerDownHandshake`] polls the two BMC-driven inputs and walks the three
//! host-side outputs through a fixed grace-delay sequence:
//!
//! 1. BMC asserts `MODULE_PWRDN_REQ`.
//! 2. Grace delay 1, then assert `SYS_PWRDN_REQ` and `MODULE_PWRDN_READY`.
//! 3. Once `SYS_PWRDN_READY` is seen asserted: grace delay 2, then assert
//!    `POWER_DOWN`.
//! 4. When `MODULE_PWRDN_REQ` drops, deassert all three outputs once.
//!
//! The protocol is level-triggered: the BMC must hold its request across the
//! grace window.  There is no retry or timeout beyond the fixed sleeps.
//!
//! # Edge cases
//!
//! | Situation | Behaviour |
//! |---|---|
//! | `SYS_PWRDN_READY` not asserted after grace 1 | [`HandshakePhase::AwaitingSystemReady`]: re-sample at the poll rate; grace 1 is not re-run and the outputs are not rewritten |
//! | Input read failure | logged; never treated as asserted |
//! | Repeated idle polls | outputs deasserted once, then latched by [`HandshakeState::outputs_released`] |

pub mod state;

pub use state::{HandshakePhase, HandshakeState};

use std::convert::Infallible;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{
    Timings, HANDSHAKE_OUTPUTS, MODULE_PWRDN_READY, MODULE_PWRDN_REQ, POWER_DOWN,
    SYS_PWRDN_READY, SYS_PWRDN_REQ,
};
use crate::pin::{Level, PinIo};
use crate::timer::Timer;

pub struct PowerDownHandshake<T: Timer> {
    pins: Arc<dyn PinIo>,
    timings: Timings,
    timer: T,
    state: HandshakeState,
}

impl<T: Timer> PowerDownHandshake<T> {
    pub fn new(pins: Arc<dyn PinIo>, timings: Timings, timer: T) -> Self {
        Self {
            pins,
            timings,
            timer,
            state: HandshakeState::new(),
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Poll forever.
    pub async fn run(&mut self) -> Infallible {
        info!("Power-down handshake loop started");
        loop {
            self.step().await;
        }
    }

    /// Perform one transition (or one idle poll) and return the new phase.
    pub async fn step(&mut self) -> HandshakePhase {
        match self.state.phase {
            HandshakePhase::Idle | HandshakePhase::AwaitingSystemReady | HandshakePhase::Done => {
                self.poll().await
            }
            HandshakePhase::GraceBeforeRequest => self.request_power_down().await,
            HandshakePhase::GraceBeforePowerDown => self.commit_power_down().await,
        }
        self.state.phase
    }

    // ── Phases ────────────────────────────────────────────────────────────────

    async fn poll(&mut self) {
        let request = match self.pins.read(&MODULE_PWRDN_REQ) {
            Ok(level) => level,
            Err(e) => {
                warn!(phase = %self.state.phase, "Cannot sample power-down request: {}", e);
                self.timer.sleep(self.timings.idle_poll).await;
                return;
            }
        };

        // SYS_PWRDN_READY is only read when the phase needs it; its level
        // is logged by sample_system_ready.
        debug!(module_pwrdn_req = %request, phase = %self.state.phase, "Handshake poll");

        if !request.is_asserted() {
            self.release_outputs();
            self.timer.sleep(self.timings.idle_poll).await;
            return;
        }

        let phase = self.state.phase;
        self.state.observe_request();
        match phase {
            HandshakePhase::Idle => {
                info!(
                    grace_s = self.timings.grace_delay.as_secs(),
                    "Module power-down requested, entering grace delay"
                );
            }
            HandshakePhase::AwaitingSystemReady => {
                if !self.sample_system_ready() {
                    self.timer.sleep(self.timings.idle_poll).await;
                }
            }
            _ => self.timer.sleep(self.timings.idle_poll).await,
        }
    }

    async fn request_power_down(&mut self) {
        self.timer.sleep(self.timings.grace_delay).await;

        self.pins.drive(&SYS_PWRDN_REQ, Level::Asserted);
        self.pins.drive(&MODULE_PWRDN_READY, Level::Asserted);
        info!("System power-down requested, module ready");

        self.state.phase = HandshakePhase::AwaitingSystemReady;
        self.sample_system_ready();
    }

    async fn commit_power_down(&mut self) {
        self.timer.sleep(self.timings.grace_delay).await;

        self.pins.drive(&POWER_DOWN, Level::Asserted);
        self.state.phase = HandshakePhase::Done;
        info!("Safe power-off point reached, POWER_DOWN asserted");
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// Sample `SYS_PWRDN_READY` once; on assertion move to the second grace
    /// delay.  A failed read counts as "not ready".
    fn sample_system_ready(&mut self) -> bool {
        match self.pins.read(&SYS_PWRDN_READY) {
            Ok(Level::Asserted) => {
                info!(
                    grace_s = self.timings.grace_delay.as_secs(),
                    "System power-down ready, entering final grace delay"
                );
                self.state.phase = HandshakePhase::GraceBeforePowerDown;
                true
            }
            Ok(Level::Deasserted) => {
                debug!("Waiting for system power-down ready");
                false
            }
            Err(e) => {
                warn!("Cannot sample system power-down ready: {}", e);
                false
            }
        }
    }

    /// Deassert all handshake outputs, unless already done since the last
    /// request.
    fn release_outputs(&mut self) {
        if !self.state.outputs_released {
            if self.state.phase != HandshakePhase::Idle {
                info!(phase = %self.state.phase, "Power-down request withdrawn");
            }
            for pin in &HANDSHAKE_OUTPUTS {
                self.pins.drive(pin, Level::Deasserted);
            }
            self.state.outputs_released = true;
        }
        self.state.observe_withdrawal();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
