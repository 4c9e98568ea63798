/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error type for pin access.
//!
//! Every variant carries the pin name so the caller can emit a complete
//! `tracing` event without extra context.  None of these errors is fatal to
//! the power sequencer: the caller logs and continues with the last
//! commanded/assumed level.

use thiserror::Error;

use super::Direction;

#[derive(Debug, Error)]
pub enum PinError {
    /// The line was never registered with the backend.
    #[error("pin '{pin}' is not managed by this backend")]
    UnknownPin { pin: &'static str },

    /// An input was written, or a line was requested with the wrong direction.
    #[error("pin '{pin}' is an {direction} and cannot be used this way")]
    WrongDirection {
        pin: &'static str,
        direction: Direction,
    },

    /// The backend returned something other than a logical `0`/`1`.
    #[error("pin '{pin}' returned invalid value {raw}")]
    InvalidValue { pin: &'static str, raw: u8 },

    /// The GPIO access layer reported a failure (chip open, line request,
    /// ioctl).
    #[error("GPIO access failed for pin '{pin}': {message}")]
    Backend { pin: &'static str, message: String },

    /// Failure injected by the in-memory double.
    #[error("simulated access failure on pin '{pin}'")]
    Simulated { pin: &'static str },
}
