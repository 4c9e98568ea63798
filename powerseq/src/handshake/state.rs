/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Handshake state, owned and mutated only by
//! [`PowerDownHandshake`](super::PowerDownHandshake).

use std::fmt;

/// Position in the power-down handshake.
///
/// ```text
///            request asserted                      grace delay 1,
///  Idle ─────────────────────► GraceBeforeRequest ──assert REQ/READY──┐
///   ▲                                                                 │
///   │ request deasserted                        ready not asserted    ▼
///   ├──────────────────────────────────────────── AwaitingSystemReady ◄┘
///   │                                                    │ ready asserted
///   │                                                    ▼
///   │                  grace delay 2, assert POWER_DOWN
///   └──────────── Done ◄──────────────────── GraceBeforePowerDown
/// ```
///
/// `GraceBeforeRequest` and `GraceBeforePowerDown` are committed: once
/// entered, the grace delay runs to completion and its outputs are written
/// regardless of what the BMC does in the meantime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakePhase {
    #[default]
    Idle,
    GraceBeforeRequest,
    AwaitingSystemReady,
    GraceBeforePowerDown,
    Done,
}

impl fmt::Display for HandshakePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandshakePhase::Idle => "idle",
            HandshakePhase::GraceBeforeRequest => "grace-before-request",
            HandshakePhase::AwaitingSystemReady => "awaiting-system-ready",
            HandshakePhase::GraceBeforePowerDown => "grace-before-power-down",
            HandshakePhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Phase plus the idle-chatter latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandshakeState {
    pub(super) phase: HandshakePhase,
    /// `true` once the three handshake outputs have been deasserted while
    /// idle.  Suppresses redundant writes on later idle polls; cleared
    /// whenever the BMC asserts its request.
    pub(super) outputs_released: bool,
}

impl HandshakeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    pub fn outputs_released(&self) -> bool {
        self.outputs_released
    }

    /// A power-down request has been observed.
    pub(super) fn observe_request(&mut self) {
        self.outputs_released = false;
        if self.phase == HandshakePhase::Idle {
            self.phase = HandshakePhase::GraceBeforeRequest;
        }
    }

    /// The request is gone; back to idle.
    pub(super) fn observe_withdrawal(&mut self) {
        self.phase = HandshakePhase::Idle;
    }
}
