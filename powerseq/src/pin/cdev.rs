/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Linux GPIO character-device backend (`/dev/gpiochipN`).
//!
//! Every line is requested once at startup and the handle is held for the
//! lifetime of the process, so a read or write is a single ioctl.  Lines are
//! requested with `ACTIVE_LOW` where the [`Pin`] says so; the kernel then
//! presents logical levels exactly like `gpioget/gpioset --active-low`.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

use gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use tracing::{debug, info, warn};

use super::{Direction, Level, Pin, PinError, PinId, PinIo};

/// Label shown by `gpioinfo` for lines held by this process.
pub const CONSUMER: &str = "powerseq";

struct RequestedLine {
    pin: Pin,
    handle: LineHandle,
}

/// Real hardware access through the GPIO character device.
///
/// Lines that could not be requested at startup stay out of service: every
/// read or write on them returns the original request failure.
pub struct CdevPins {
    lines: BTreeMap<PinId, RequestedLine>,
    unavailable: BTreeMap<PinId, String>,
}

fn backend_error(pin: &Pin, err: impl fmt::Display) -> PinError {
    PinError::Backend {
        pin: pin.name,
        message: err.to_string(),
    }
}

fn request_line(chips: &mut BTreeMap<u32, Chip>, pin: &Pin) -> Result<LineHandle, PinError> {
    let chip = match chips.entry(pin.id.chip) {
        Entry::Occupied(e) => e.into_mut(),
        Entry::Vacant(e) => {
            let path = format!("/dev/gpiochip{}", pin.id.chip);
            debug!(path = %path, "Opening GPIO chip");
            e.insert(Chip::new(&path).map_err(|err| backend_error(pin, err))?)
        }
    };

    let mut flags = match pin.direction {
        Direction::Input => LineRequestFlags::INPUT,
        Direction::Output => LineRequestFlags::OUTPUT,
    };
    if pin.active_low {
        flags |= LineRequestFlags::ACTIVE_LOW;
    }

    chip.get_line(pin.id.line)
        .and_then(|line| line.request(flags, Level::Deasserted.as_u8(), CONSUMER))
        .map_err(|err| backend_error(pin, err))
}

impl CdevPins {
    /// Open the chips and request every pin in `pins`.
    ///
    /// Outputs are requested with an initial level of deasserted.  A chip or
    /// line that cannot be opened is logged and left out; the remaining
    /// lines are still usable.
    pub fn open(pins: &[Pin]) -> Self {
        let mut chips: BTreeMap<u32, Chip> = BTreeMap::new();
        let mut lines = BTreeMap::new();
        let mut unavailable = BTreeMap::new();

        for pin in pins {
            match request_line(&mut chips, pin) {
                Ok(handle) => {
                    debug!(pin = pin.name, id = %pin.id, direction = %pin.direction, "Line requested");
                    lines.insert(pin.id, RequestedLine { pin: *pin, handle });
                }
                Err(e) => {
                    warn!(pin = pin.name, id = %pin.id, "GPIO line unavailable: {}", e);
                    unavailable.insert(pin.id, e.to_string());
                }
            }
        }

        info!(
            requested = lines.len(),
            unavailable = unavailable.len(),
            chips = chips.len(),
            "GPIO lines opened"
        );
        Self { lines, unavailable }
    }

    /// Whether `pin` was successfully requested.
    pub fn is_available(&self, pin: &Pin) -> bool {
        self.lines.contains_key(&pin.id)
    }

    fn line(&self, pin: &Pin) -> Result<&RequestedLine, PinError> {
        if let Some(line) = self.lines.get(&pin.id) {
            return Ok(line);
        }
        match self.unavailable.get(&pin.id) {
            Some(reason) => Err(PinError::Backend {
                pin: pin.name,
                message: format!("line not requested at startup: {reason}"),
            }),
            None => Err(PinError::UnknownPin { pin: pin.name }),
        }
    }
}

impl PinIo for CdevPins {
    fn read(&self, pin: &Pin) -> Result<Level, PinError> {
        let line = self.line(pin)?;
        let raw = line
            .handle
            .get_value()
            .map_err(|err| backend_error(pin, err))?;
        Level::from_u8(pin, raw)
    }

    fn write(&self, pin: &Pin, level: Level) -> Result<(), PinError> {
        let line = self.line(pin)?;
        if line.pin.direction == Direction::Input {
            return Err(PinError::WrongDirection {
                pin: pin.name,
                direction: Direction::Input,
            });
        }
        line.handle
            .set_value(level.as_u8())
            .map_err(|err| backend_error(pin, err))
    }
}
