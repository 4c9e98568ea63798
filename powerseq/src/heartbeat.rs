/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Heartbeat generator – host liveness broadcast to the BMC.
//!
//! ```text
//! BOOTING ──(boot_toggles)──► TRANSITION ──(transition_toggles)──► OPERATIONAL
//!  boot line toggles           boot + operational toggle together   boot line forced off,
//!  operational held off                                             operational toggled by
//!                                                                   a background HeartbeatTask
//! ```
//!
//! The progression is purely count/time driven; nothing is read back from
//! the BMC.  The generator is the only writer of the two heartbeat lines.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::{Timings, CPU_BOOT_HEARTBEAT, CPU_OPERATIONAL_HEARTBEAT};
use crate::pin::{Level, Pin, PinIo};
use crate::timer::Timer;

/// Where the generator is in its one-way progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatPhase {
    Booting,
    Transition,
    Operational,
}

// ── Generator ─────────────────────────────────────────────────────────────────

pub struct HeartbeatGenerator<T: Timer> {
    pins: Arc<dyn PinIo>,
    timings: Timings,
    timer: T,
    phase: HeartbeatPhase,
}

impl<T: Timer> HeartbeatGenerator<T> {
    pub fn new(pins: Arc<dyn PinIo>, timings: Timings, timer: T) -> Self {
        Self {
            pins,
            timings,
            timer,
            phase: HeartbeatPhase::Booting,
        }
    }

    pub fn phase(&self) -> HeartbeatPhase {
        self.phase
    }

    /// Run BOOTING and TRANSITION to completion, then force the boot
    /// heartbeat off.
    ///
    /// The running level starts asserted and is inverted before each write,
    /// so the first boot pulse drives the line deasserted.  TRANSITION keeps
    /// the same running level and mirrors it onto the operational line.
    pub async fn run_boot_sequence(&mut self) {
        let half_period = self.timings.boot_half_period;
        let mut level = Level::Asserted;

        self.phase = HeartbeatPhase::Booting;
        info!(
            toggles = self.timings.boot_toggles,
            half_period_ms = half_period.as_millis() as u64,
            "Boot heartbeat started"
        );
        for _ in 0..self.timings.boot_toggles {
            level = level.toggled();
            self.pins.drive(&CPU_BOOT_HEARTBEAT, level);
            self.timer.sleep(half_period).await;
        }

        self.phase = HeartbeatPhase::Transition;
        info!(
            toggles = self.timings.transition_toggles,
            "Boot heartbeat transition: operational heartbeat joins"
        );
        for _ in 0..self.timings.transition_toggles {
            level = level.toggled();
            self.pins.drive(&CPU_BOOT_HEARTBEAT, level);
            self.pins.drive(&CPU_OPERATIONAL_HEARTBEAT, level);
            self.timer.sleep(half_period).await;
        }

        self.pins.drive(&CPU_BOOT_HEARTBEAT, Level::Deasserted);
        self.phase = HeartbeatPhase::Operational;
        info!("Boot heartbeat stopped");
    }

    /// The OPERATIONAL toggle loop for the operational heartbeat, ready to
    /// be driven by any runtime.
    pub fn run_operational(
        &self,
        stop: watch::Receiver<bool>,
    ) -> impl Future<Output = u64> + Send + 'static {
        toggle_until_stopped(
            Arc::clone(&self.pins),
            CPU_OPERATIONAL_HEARTBEAT,
            self.timings.operational_half_period,
            self.timer.clone(),
            stop,
        )
    }

    /// Start the OPERATIONAL phase: run [`run_operational`](Self::run_operational)
    /// on its own thread until the process exits (or [`HeartbeatTask::stop`]).
    ///
    /// # Errors
    /// Fails if the thread or its runtime cannot be created.
    pub fn spawn_operational(&self) -> io::Result<HeartbeatTask> {
        HeartbeatTask::launch(
            CPU_OPERATIONAL_HEARTBEAT,
            self.timings.operational_half_period,
            |stop| self.run_operational(stop),
        )
    }
}

// ── Background task ───────────────────────────────────────────────────────────

/// Handle to a background heartbeat toggler.
///
/// Dropping the handle detaches the thread; the line keeps toggling.
pub struct HeartbeatTask {
    pin: Pin,
    half_period: Duration,
    stop: watch::Sender<bool>,
    thread: JoinHandle<u64>,
}

impl HeartbeatTask {
    /// Spawn a named OS thread running a current-thread runtime that toggles
    /// `pin` every `half_period`.
    pub fn spawn<T: Timer>(
        pins: Arc<dyn PinIo>,
        pin: Pin,
        half_period: Duration,
        timer: T,
    ) -> io::Result<Self> {
        Self::launch(pin, half_period, move |stop| {
            toggle_until_stopped(pins, pin, half_period, timer, stop)
        })
    }

    /// Build the toggle future for the stop receiver and drive it on a new
    /// thread.
    fn launch<F>(
        pin: Pin,
        half_period: Duration,
        toggle: impl FnOnce(watch::Receiver<bool>) -> F,
    ) -> io::Result<Self>
    where
        F: Future<Output = u64> + Send + 'static,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let (stop, stop_rx) = watch::channel(false);
        let toggle = toggle(stop_rx);

        let thread = thread::Builder::new()
            .name(format!("heartbeat-{}", pin.id))
            .spawn(move || runtime.block_on(toggle))?;

        info!(
            pin = pin.name,
            half_period_ms = half_period.as_millis() as u64,
            "Heartbeat task started"
        );
        Ok(Self {
            pin,
            half_period,
            stop,
            thread,
        })
    }

    pub fn pin(&self) -> Pin {
        self.pin
    }

    pub fn half_period(&self) -> Duration {
        self.half_period
    }

    pub fn is_running(&self) -> bool {
        !self.thread.is_finished()
    }

    /// Ask the task to stop and wait for it.
    ///
    /// The line is left at whatever level it last held.  Returns the number
    /// of toggles performed.
    pub fn stop(self) -> thread::Result<u64> {
        self.stop.send_replace(true);
        self.thread.join()
    }
}

/// Toggle `pin` every `half_period` until `stop` carries `true`.
///
/// Starts from deasserted, so the first write asserts the line.  A dropped
/// stop sender is not a stop request.
pub async fn toggle_until_stopped<T: Timer>(
    pins: Arc<dyn PinIo>,
    pin: Pin,
    half_period: Duration,
    timer: T,
    mut stop: watch::Receiver<bool>,
) -> u64 {
    let mut level = Level::Deasserted;
    let mut toggles = 0u64;
    let mut stop_open = true;

    loop {
        if *stop.borrow_and_update() {
            break;
        }

        level = level.toggled();
        pins.drive(&pin, level);
        toggles += 1;

        let sleep = timer.sleep(half_period);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                () = &mut sleep => break,
                changed = stop.changed(), if stop_open => {
                    if changed.is_err() {
                        stop_open = false;
                    } else if *stop.borrow() {
                        debug!(pin = pin.name, toggles, "Heartbeat stop requested");
                        return toggles;
                    }
                }
            }
        }
    }

    toggles
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HEARTBEAT_PINS;
    use crate::pin::MemoryPins;
    use crate::timer::{assert_near, TokioTimer};
    use tokio::time::Instant;

    fn bank() -> Arc<MemoryPins> {
        Arc::new(MemoryPins::new(&HEARTBEAT_PINS))
    }

    fn levels(pins: &MemoryPins, pin: &Pin) -> Vec<Level> {
        pins.writes(pin).iter().map(|r| r.level).collect()
    }

    // ── Boot sequence ─────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn boot_line_toggles_exact_count_before_transition() {
        let pins = bank();
        let mut gen = HeartbeatGenerator::new(pins.clone(), Timings::default(), TokioTimer);
        gen.run_boot_sequence().await;

        let first_op = pins.writes(&CPU_OPERATIONAL_HEARTBEAT)[0].at;
        let boot_before: Vec<_> = pins
            .writes(&CPU_BOOT_HEARTBEAT)
            .into_iter()
            .filter(|r| r.at < first_op)
            .collect();
        assert_eq!(boot_before.len(), 120);
    }

    #[tokio::test(start_paused = true)]
    async fn operational_line_untouched_while_booting() {
        let pins = bank();
        let start = Instant::now();
        let mut gen = HeartbeatGenerator::new(pins.clone(), Timings::default(), TokioTimer);
        gen.run_boot_sequence().await;

        let op = pins.writes(&CPU_OPERATIONAL_HEARTBEAT);
        assert_eq!(op.len(), 10, "operational line only toggles in TRANSITION");
        assert_near(op[0].at - start, Duration::from_millis(120 * 700));
    }

    #[tokio::test(start_paused = true)]
    async fn boot_levels_alternate_starting_deasserted() {
        let pins = bank();
        let mut gen = HeartbeatGenerator::new(pins.clone(), Timings::default(), TokioTimer);
        gen.run_boot_sequence().await;

        let boot = levels(&pins, &CPU_BOOT_HEARTBEAT);
        assert_eq!(boot.len(), 120 + 10 + 1);
        assert_eq!(boot[0], Level::Deasserted);
        for pair in boot[..130].windows(2) {
            assert_eq!(pair[1], pair[0].toggled());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transition_mirrors_boot_level_onto_operational_line() {
        let pins = bank();
        let mut gen = HeartbeatGenerator::new(pins.clone(), Timings::default(), TokioTimer);
        gen.run_boot_sequence().await;

        let boot = levels(&pins, &CPU_BOOT_HEARTBEAT);
        let op = levels(&pins, &CPU_OPERATIONAL_HEARTBEAT);
        assert_eq!(&boot[120..130], op.as_slice());
    }

    #[tokio::test(start_paused = true)]
    async fn boot_line_ends_deasserted_in_operational_phase() {
        let pins = bank();
        let start = Instant::now();
        let timings = Timings::default();
        let mut gen = HeartbeatGenerator::new(pins.clone(), timings, TokioTimer);
        assert_eq!(gen.phase(), HeartbeatPhase::Booting);

        gen.run_boot_sequence().await;

        assert_eq!(gen.phase(), HeartbeatPhase::Operational);
        let last = *pins.writes(&CPU_BOOT_HEARTBEAT).last().unwrap();
        assert_eq!(last.level, Level::Deasserted);
        assert_near(last.at - start, timings.boot_sequence_duration());
        assert_eq!(pins.level(&CPU_BOOT_HEARTBEAT), Some(Level::Deasserted));
    }

    #[tokio::test(start_paused = true)]
    async fn boot_sequence_survives_write_failures() {
        let pins = bank();
        pins.fail_writes(&CPU_BOOT_HEARTBEAT, true);
        let mut gen = HeartbeatGenerator::new(pins.clone(), Timings::default(), TokioTimer);
        gen.run_boot_sequence().await;

        assert!(pins.writes(&CPU_BOOT_HEARTBEAT).is_empty());
        assert_eq!(pins.writes(&CPU_OPERATIONAL_HEARTBEAT).len(), 10);
        assert_eq!(gen.phase(), HeartbeatPhase::Operational);
    }

    // ── Operational toggler ───────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn operational_toggle_runs_at_fixed_period_until_stopped() {
        let pins = bank();
        let (stop, stop_rx) = watch::channel(false);
        let start = Instant::now();
        let task = tokio::spawn(toggle_until_stopped(
            pins.clone(),
            CPU_OPERATIONAL_HEARTBEAT,
            Duration::from_millis(600),
            TokioTimer,
            stop_rx,
        ));

        tokio::time::sleep(Duration::from_millis(6_300)).await;
        stop.send_replace(true);
        let toggles = task.await.unwrap();

        let writes = pins.writes(&CPU_OPERATIONAL_HEARTBEAT);
        assert_eq!(toggles, 11);
        assert_eq!(writes.len(), 11);
        assert_eq!(writes[0].level, Level::Asserted);
        for (i, w) in writes.iter().enumerate() {
            assert_near(w.at - start, Duration::from_millis(600) * i as u32);
        }
        assert!(pins.writes(&CPU_BOOT_HEARTBEAT).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_stop_sender_keeps_toggling() {
        let pins = bank();
        let (stop, stop_rx) = watch::channel(false);
        let task = tokio::spawn(toggle_until_stopped(
            pins.clone(),
            CPU_OPERATIONAL_HEARTBEAT,
            Duration::from_millis(600),
            TokioTimer,
            stop_rx,
        ));
        drop(stop);

        tokio::time::sleep(Duration::from_millis(3_100)).await;
        assert!(!task.is_finished());
        assert_eq!(pins.writes(&CPU_OPERATIONAL_HEARTBEAT).len(), 6);
        task.abort();
    }

    #[test]
    fn spawned_task_toggles_on_its_own_thread_and_stops() {
        let pins = bank();
        let task = HeartbeatTask::spawn(
            pins.clone(),
            CPU_OPERATIONAL_HEARTBEAT,
            Duration::from_millis(5),
            TokioTimer,
        )
        .unwrap();
        assert_eq!(task.pin(), CPU_OPERATIONAL_HEARTBEAT);
        assert_eq!(task.half_period(), Duration::from_millis(5));

        std::thread::sleep(Duration::from_millis(60));
        assert!(task.is_running());
        let toggles = task.stop().unwrap();

        let written = levels(&pins, &CPU_OPERATIONAL_HEARTBEAT);
        assert!(toggles >= 2, "expected several toggles, got {toggles}");
        assert_eq!(written.len() as u64, toggles);
        assert_eq!(written[0], Level::Asserted);
        for pair in written.windows(2) {
            assert_eq!(pair[1], pair[0].toggled());
        }

        let stamps: Vec<_> = pins
            .writes(&CPU_OPERATIONAL_HEARTBEAT)
            .iter()
            .map(|w| w.at)
            .collect();
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(5));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn operational_phase_toggles_at_operational_half_period() {
        let pins = bank();
        let timings = Timings::default();
        let gen = HeartbeatGenerator::new(pins.clone(), timings, TokioTimer);
        let (stop, stop_rx) = watch::channel(false);
        let start = Instant::now();

        let task = tokio::spawn(gen.run_operational(stop_rx));
        tokio::time::sleep(Duration::from_millis(3_100)).await;
        stop.send_replace(true);

        // 600 ms half-period: writes at 0.0, 0.6, ... 3.0 s
        assert_eq!(task.await.unwrap(), 6);
        let writes = pins.writes(&CPU_OPERATIONAL_HEARTBEAT);
        assert_eq!(writes.len(), 6);
        for (i, w) in writes.iter().enumerate() {
            assert_near(w.at - start, timings.operational_half_period * i as u32);
        }
        assert!(pins.writes(&CPU_BOOT_HEARTBEAT).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn generator_spawns_operational_task_on_operational_line() {
        let pins = bank();
        let gen = HeartbeatGenerator::new(pins.clone(), Timings::default(), TokioTimer);
        let task = gen.spawn_operational().unwrap();
        assert_eq!(task.pin(), CPU_OPERATIONAL_HEARTBEAT);
        assert_eq!(task.half_period(), Timings::default().operational_half_period);
        task.stop().unwrap();
        assert!(pins.writes(&CPU_BOOT_HEARTBEAT).is_empty());
    }
}
