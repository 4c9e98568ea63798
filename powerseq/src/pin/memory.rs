/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! In-memory [`PinIo`] double.
//!
//! Stores the *electrical* level of every line and applies the active-low
//! conversion itself, so the polarity handling is exercised the same way the
//! kernel does it for [`CdevPins`](super::CdevPins).  Every successful write
//! is recorded with a [`tokio::time::Instant`] timestamp, which follows the
//! paused test clock.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;

use super::{Direction, Level, Pin, PinError, PinId, PinIo};

/// One recorded write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRecord {
    pub pin: &'static str,
    pub level: Level,
    pub at: Instant,
}

#[derive(Debug)]
struct Line {
    pin: Pin,
    /// `true` = electrically high.
    high: bool,
}

#[derive(Debug, Default)]
struct Inner {
    lines: BTreeMap<PinId, Line>,
    history: Vec<WriteRecord>,
    reads: BTreeMap<PinId, usize>,
    failing_reads: HashSet<PinId>,
    failing_writes: HashSet<PinId>,
}

/// Simulated GPIO bank.
#[derive(Debug, Default)]
pub struct MemoryPins {
    inner: Mutex<Inner>,
}

impl MemoryPins {
    /// Register `pins`, all starting logically deasserted.
    pub fn new(pins: &[Pin]) -> Self {
        let lines = pins
            .iter()
            .map(|pin| {
                let line = Line {
                    pin: *pin,
                    high: Level::Deasserted.to_electrical(pin.active_low),
                };
                (pin.id, line)
            })
            .collect();

        Self {
            inner: Mutex::new(Inner {
                lines,
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the level the BMC side is driving onto an input (or any line).
    ///
    /// Not recorded in the write history.
    pub fn drive_input(&self, pin: &Pin, level: Level) {
        if let Some(line) = self.lock().lines.get_mut(&pin.id) {
            line.high = level.to_electrical(line.pin.active_low);
        }
    }

    /// Current logical level, bypassing failure injection.
    pub fn level(&self, pin: &Pin) -> Option<Level> {
        self.lock()
            .lines
            .get(&pin.id)
            .map(|line| Level::from_electrical(line.high, line.pin.active_low))
    }

    /// Current electrical level (`true` = high).
    pub fn is_electrically_high(&self, pin: &Pin) -> Option<bool> {
        self.lock().lines.get(&pin.id).map(|line| line.high)
    }

    /// All recorded writes to `pin`, oldest first.
    pub fn writes(&self, pin: &Pin) -> Vec<WriteRecord> {
        self.lock()
            .history
            .iter()
            .filter(|record| record.pin == pin.name)
            .copied()
            .collect()
    }

    /// All recorded writes across every pin, oldest first.
    pub fn history(&self) -> Vec<WriteRecord> {
        self.lock().history.clone()
    }

    /// Number of read attempts on `pin`, failed ones included.
    pub fn reads(&self, pin: &Pin) -> usize {
        self.lock().reads.get(&pin.id).copied().unwrap_or(0)
    }

    /// Make subsequent reads of `pin` fail (or succeed again).
    pub fn fail_reads(&self, pin: &Pin, fail: bool) {
        let mut inner = self.lock();
        if fail {
            inner.failing_reads.insert(pin.id);
        } else {
            inner.failing_reads.remove(&pin.id);
        }
    }

    /// Make subsequent writes to `pin` fail (or succeed again).
    pub fn fail_writes(&self, pin: &Pin, fail: bool) {
        let mut inner = self.lock();
        if fail {
            inner.failing_writes.insert(pin.id);
        } else {
            inner.failing_writes.remove(&pin.id);
        }
    }
}

impl PinIo for MemoryPins {
    fn read(&self, pin: &Pin) -> Result<Level, PinError> {
        let mut inner = self.lock();
        *inner.reads.entry(pin.id).or_default() += 1;
        if inner.failing_reads.contains(&pin.id) {
            return Err(PinError::Simulated { pin: pin.name });
        }
        let line = inner
            .lines
            .get(&pin.id)
            .ok_or(PinError::UnknownPin { pin: pin.name })?;
        Ok(Level::from_electrical(line.high, line.pin.active_low))
    }

    fn write(&self, pin: &Pin, level: Level) -> Result<(), PinError> {
        let mut inner = self.lock();
        if inner.failing_writes.contains(&pin.id) {
            return Err(PinError::Simulated { pin: pin.name });
        }
        let line = inner
            .lines
            .get_mut(&pin.id)
            .ok_or(PinError::UnknownPin { pin: pin.name })?;
        if line.pin.direction == Direction::Input {
            return Err(PinError::WrongDirection {
                pin: pin.name,
                direction: Direction::Input,
            });
        }
        line.high = level.to_electrical(line.pin.active_low);
        inner.history.push(WriteRecord {
            pin: pin.name,
            level,
            at: Instant::now(),
        });
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
