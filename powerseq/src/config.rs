/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Fixed pin map and sequencing timings.
//!
//! The wiring between the host CPU and the BMC is fixed by the board, so the
//! pin map is compiled in.  All lines are active-low at the electrical
//! boundary.
//!
//! | Name | Direction | Chip | Line |
//! |---|---|---|---|
//! | CPU_BOOT_HEARTBEAT | out | 1 | 30 |
//! | CPU_OPERATIONAL_HEARTBEAT | out | 1 | 31 |
//! | SYS_PWRDN_READY | in | 3 | 18 |
//! | SYS_PWRDN_REQ | out | 3 | 19 |
//! | MODULE_PWRDN_READY | out | 3 | 20 |
//! | MODULE_PWRDN_REQ | in | 3 | 21 |
//! | POWER_DOWN | out | 3 | 23 |

use std::time::Duration;

use crate::pin::Pin;

// ── Pin map ───────────────────────────────────────────────────────────────────

/// Boot-phase liveness pulse to the BMC.
pub const CPU_BOOT_HEARTBEAT: Pin = Pin::output("CPU_BOOT_HEARTBEAT", 1, 30);
/// Operational-phase liveness pulse to the BMC.
pub const CPU_OPERATIONAL_HEARTBEAT: Pin = Pin::output("CPU_OPERATIONAL_HEARTBEAT", 1, 31);
/// BMC → host: system is ready to be powered down.
pub const SYS_PWRDN_READY: Pin = Pin::input("SYS_PWRDN_READY", 3, 18);
/// Host → BMC: host requests system power-down.
pub const SYS_PWRDN_REQ: Pin = Pin::output("SYS_PWRDN_REQ", 3, 19);
/// Host → BMC: module is ready to be powered down.
pub const MODULE_PWRDN_READY: Pin = Pin::output("MODULE_PWRDN_READY", 3, 20);
/// BMC → host: power the module down.
pub const MODULE_PWRDN_REQ: Pin = Pin::input("MODULE_PWRDN_REQ", 3, 21);
/// Host → BMC/PSU: safe power-off point reached.
pub const POWER_DOWN: Pin = Pin::output("POWER_DOWN", 3, 23);

pub const HEARTBEAT_PINS: [Pin; 2] = [CPU_BOOT_HEARTBEAT, CPU_OPERATIONAL_HEARTBEAT];

/// Outputs owned by the power-down handshake.
pub const HANDSHAKE_OUTPUTS: [Pin; 3] = [SYS_PWRDN_REQ, MODULE_PWRDN_READY, POWER_DOWN];

pub const INPUT_PINS: [Pin; 2] = [MODULE_PWRDN_REQ, SYS_PWRDN_READY];

pub const OUTPUT_PINS: [Pin; 5] = [
    CPU_BOOT_HEARTBEAT,
    CPU_OPERATIONAL_HEARTBEAT,
    SYS_PWRDN_REQ,
    MODULE_PWRDN_READY,
    POWER_DOWN,
];

pub const ALL_PINS: [Pin; 7] = [
    CPU_BOOT_HEARTBEAT,
    CPU_OPERATIONAL_HEARTBEAT,
    SYS_PWRDN_READY,
    SYS_PWRDN_REQ,
    MODULE_PWRDN_READY,
    MODULE_PWRDN_REQ,
    POWER_DOWN,
];

// ── Timings ───────────────────────────────────────────────────────────────────

/// Toggle counts, periods and grace delays for the whole sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Number of boot-heartbeat toggles in the BOOTING phase.
    pub boot_toggles: u32,
    /// Number of combined toggles in the TRANSITION phase.
    pub transition_toggles: u32,
    /// Half-period of the boot heartbeat (BOOTING and TRANSITION).
    pub boot_half_period: Duration,
    /// Half-period of the background operational heartbeat.
    pub operational_half_period: Duration,
    /// Wait before asserting the request/ready outputs, and again before
    /// asserting POWER_DOWN.
    pub grace_delay: Duration,
    /// Sleep between handshake polls while nothing is happening.
    pub idle_poll: Duration,
    /// Pause between initialising the outputs and the first heartbeat.
    pub settle_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            boot_toggles: 120,
            transition_toggles: 10,
            boot_half_period: Duration::from_millis(700),
            operational_half_period: Duration::from_millis(600),
            grace_delay: Duration::from_secs(60),
            idle_poll: Duration::from_millis(500),
            settle_delay: Duration::from_secs(1),
        }
    }
}

impl Timings {
    /// Total time spent in BOOTING + TRANSITION.
    pub fn boot_sequence_duration(&self) -> Duration {
        self.boot_half_period * (self.boot_toggles + self.transition_toggles)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
