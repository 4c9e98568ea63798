/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! powerseq – host CPU power sequencing towards the BMC
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── config/         – fixed pin map and timings
//! ├── pin/            – PinIo capability, GPIO chardev backend, in-memory double
//! ├── timer/          – mockable sleep abstraction
//! ├── heartbeat/      – boot / operational liveness pulses
//! ├── handshake/      – power-down handshake state machine
//! └── orchestrator/   – startup sequence
//! ```

pub mod config;
pub mod handshake;
pub mod heartbeat;
pub mod orchestrator;
pub mod pin;
pub mod timer;
