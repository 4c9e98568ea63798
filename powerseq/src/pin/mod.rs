/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Pin interface – logical read/write access to named GPIO lines.
//!
//! Every signal between the host CPU and the BMC is an active-low GPIO line.
//! The [`PinIo`] capability hides both the access mechanism and the electrical
//! polarity: callers only ever see a logical [`Level`].
//!
//! ```text
//! HeartbeatGenerator ─┐
//!                     ├──► PinIo ──► CdevPins   (/dev/gpiochipN, kernel active-low flag)
//! PowerDownHandshake ─┘         └──► MemoryPins (in-memory double, polarity applied here)
//! ```
//!
//! # Error model
//! A failed read is `Err(PinError)`, never a `Level`.  Callers log the error
//! and carry on with the last commanded/assumed level; nothing in this layer
//! retries or aborts.

pub mod cdev;
pub mod error;
pub mod memory;

pub use cdev::CdevPins;
pub use error::PinError;
pub use memory::MemoryPins;

use std::fmt;

use tracing::{debug, warn};

// ── Level ─────────────────────────────────────────────────────────────────────

/// Logical level of a signal line, already corrected for polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
    /// Signal inactive (electrically high on an active-low line).
    #[default]
    Deasserted,
    /// Signal active (electrically low on an active-low line).
    Asserted,
}

impl Level {
    /// The opposite level.
    pub fn toggled(self) -> Self {
        match self {
            Level::Deasserted => Level::Asserted,
            Level::Asserted => Level::Deasserted,
        }
    }

    pub fn is_asserted(self) -> bool {
        self == Level::Asserted
    }

    /// Logical value as written to / read from the kernel (`0` or `1`).
    pub fn as_u8(self) -> u8 {
        match self {
            Level::Deasserted => 0,
            Level::Asserted => 1,
        }
    }

    /// Parse a logical `0`/`1` value.
    ///
    /// Anything else is rejected rather than being read as "asserted".
    pub fn from_u8(pin: &Pin, raw: u8) -> Result<Self, PinError> {
        match raw {
            0 => Ok(Level::Deasserted),
            1 => Ok(Level::Asserted),
            other => Err(PinError::InvalidValue {
                pin: pin.name,
                raw: other,
            }),
        }
    }

    /// Convert to the electrical level for a line with the given polarity.
    ///
    /// Returns `true` for a high voltage.
    pub fn to_electrical(self, active_low: bool) -> bool {
        self.is_asserted() != active_low
    }

    /// Inverse of [`to_electrical`](Self::to_electrical).
    pub fn from_electrical(high: bool, active_low: bool) -> Self {
        if high != active_low {
            Level::Asserted
        } else {
            Level::Deasserted
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

// ── Pin descriptor ────────────────────────────────────────────────────────────

/// Direction of a signal line as seen from the host CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// Hardware address of a line: `/dev/gpiochip{chip}`, offset `line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId {
    pub chip: u32,
    pub line: u32,
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpiochip{}:{}", self.chip, self.line)
    }
}

/// Static description of one named signal line.
///
/// A `Pin` is only a proxy: the current level lives in the hardware (or in
/// the [`MemoryPins`] double) and is always fetched through [`PinIo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pin {
    pub name: &'static str,
    pub id: PinId,
    pub direction: Direction,
    pub active_low: bool,
}

impl Pin {
    /// Active-low host output.
    pub const fn output(name: &'static str, chip: u32, line: u32) -> Self {
        Self {
            name,
            id: PinId { chip, line },
            direction: Direction::Output,
            active_low: true,
        }
    }

    /// Active-low host input.
    pub const fn input(name: &'static str, chip: u32, line: u32) -> Self {
        Self {
            name,
            id: PinId { chip, line },
            direction: Direction::Input,
            active_low: true,
        }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

// ── Capability ────────────────────────────────────────────────────────────────

/// Read/write capability over named pins.
///
/// Implementations must be shareable between the heartbeat thread and the
/// handshake loop.  Each output line has exactly one writer, so no
/// implementation needs to serialise writes to the same line.
pub trait PinIo: Send + Sync {
    /// Sample the logical level of `pin`.
    fn read(&self, pin: &Pin) -> Result<Level, PinError>;

    /// Drive `pin` to the logical `level`.
    fn write(&self, pin: &Pin, level: Level) -> Result<(), PinError>;

    /// Write and log the outcome; failures are not fatal.
    fn drive(&self, pin: &Pin, level: Level) {
        match self.write(pin, level) {
            Ok(()) => debug!(pin = pin.name, %level, "GPIO written"),
            Err(e) => warn!(pin = pin.name, %level, "GPIO write failed: {}", e),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const PROBE: Pin = Pin::input("PROBE", 3, 21);

    #[test]
    fn toggled_flips_level() {
        assert_eq!(Level::Asserted.toggled(), Level::Deasserted);
        assert_eq!(Level::Deasserted.toggled(), Level::Asserted);
    }

    #[test]
    fn active_low_asserted_is_electrically_low() {
        assert!(!Level::Asserted.to_electrical(true));
        assert!(Level::Deasserted.to_electrical(true));
        assert!(Level::Asserted.to_electrical(false));
    }

    #[test]
    fn electrical_conversion_is_inverse() {
        for level in [Level::Asserted, Level::Deasserted] {
            for active_low in [true, false] {
                let high = level.to_electrical(active_low);
                assert_eq!(Level::from_electrical(high, active_low), level);
            }
        }
    }

    #[test]
    fn from_u8_rejects_values_other_than_zero_or_one() {
        assert_eq!(Level::from_u8(&PROBE, 0).unwrap(), Level::Deasserted);
        assert_eq!(Level::from_u8(&PROBE, 1).unwrap(), Level::Asserted);

        let err = Level::from_u8(&PROBE, 255).unwrap_err();
        assert!(matches!(
            err,
            PinError::InvalidValue {
                pin: "PROBE",
                raw: 255
            }
        ));
    }

    #[test]
    fn pin_display_includes_chip_and_line() {
        assert_eq!(PROBE.to_string(), "PROBE (gpiochip3:21)");
    }

    #[test]
    fn pin_constructors_set_direction_and_polarity() {
        let out = Pin::output("OUT", 1, 30);
        assert_eq!(out.direction, Direction::Output);
        assert!(out.active_low);
        assert_eq!(PROBE.direction, Direction::Input);
        assert!(PROBE.active_low);
    }
}
