//! Pedal thread
//!
//! Pedal switches arrive as [`PedalSignal`]s on a crossbeam channel. The
//! runner blocks on the channel until the next signal or the hold deadline,
//! whichever comes first, so the hold timer needs no thread of its own.

use crate::config::PedalConfig;
use crate::effector::{dispatch, Effector};
use crate::error::CortexError;
use crate::gesture::pedal::{HoldTimer, PedalClassifier};
use crate::toggles::{GestureFamily, GestureToggles};
use crate::types::{Action, Clock, MouseButton};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Longest the runner sleeps before re-checking shutdown and toggles
const IDLE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PedalSignal {
    Down,
    Up,
}

/// Deterministic core of the runner: classifier plus the outstanding timer
#[derive(Debug, Clone)]
pub struct PedalDriver {
    classifier: PedalClassifier,
    timer: Option<HoldTimer>,
}

impl PedalDriver {
    pub fn new(config: PedalConfig) -> Self {
        Self {
            classifier: PedalClassifier::new(config),
            timer: None,
        }
    }

    pub fn classifier(&self) -> &PedalClassifier {
        &self.classifier
    }

    pub fn deadline(&self) -> Option<f64> {
        self.timer.map(|t| t.deadline)
    }

    /// Fire the hold timer if it is due
    pub fn on_timeout<E: Effector + ?Sized>(&mut self, now: f64, effector: &mut E) -> Option<Action> {
        let timer = self.timer.filter(|t| now >= t.deadline)?;
        self.timer = None;
        let action = self.classifier.fire(timer.token, now)?;
        dispatch(effector, &action);
        Some(action)
    }

    pub fn handle<E: Effector + ?Sized>(
        &mut self,
        signal: PedalSignal,
        now: f64,
        effector: &mut E,
    ) -> Vec<Action> {
        // A deadline that passed while the signal was in flight still counts
        let mut out: Vec<Action> = self.on_timeout(now, effector).into_iter().collect();
        match signal {
            PedalSignal::Down => {
                if let Some(timer) = self.classifier.press(now) {
                    self.timer = Some(timer);
                }
            }
            PedalSignal::Up => {
                self.timer = None;
                if let Some(action) = self.classifier.release(now) {
                    dispatch(effector, &action);
                    out.push(action);
                }
            }
        }
        out
    }

    /// Drop all pedal state, releasing the button first if a drag is held
    pub fn suspend<E: Effector + ?Sized>(&mut self, effector: &mut E) {
        if self.classifier.is_dragging() {
            log::info!("Pedal disabled mid-drag, releasing button");
            dispatch(effector, &Action::ButtonUp(MouseButton::Left));
        }
        self.timer = None;
        self.classifier.reset();
    }
}

pub struct PedalRunner {
    handle: JoinHandle<()>,
}

impl PedalRunner {
    /// Start the pedal thread. The effector is built on that thread, so it
    /// does not need to be `Send`.
    pub fn spawn<E, F>(
        config: PedalConfig,
        toggles: Arc<GestureToggles>,
        clock: Clock,
        rx: Receiver<PedalSignal>,
        shutdown: Arc<AtomicBool>,
        make_effector: F,
    ) -> Result<Self, CortexError>
    where
        E: Effector + 'static,
        F: FnOnce() -> Result<E, CortexError> + Send + 'static,
    {
        let handle = std::thread::Builder::new()
            .name("pedal".to_string())
            .spawn(move || {
                let mut effector = match make_effector() {
                    Ok(e) => e,
                    Err(e) => {
                        log::error!("Pedal effector unavailable, pedal disabled: {e}");
                        return;
                    }
                };
                let mut driver = PedalDriver::new(config);
                run_loop(&mut driver, &mut effector, &toggles, clock, &rx, &shutdown);
            })
            .map_err(|source| CortexError::Spawn {
                name: "pedal",
                source,
            })?;
        log::info!("Pedal runner started");
        Ok(Self { handle })
    }

    pub fn join(self) {
        if self.handle.join().is_err() {
            log::error!("Pedal thread panicked");
        }
    }
}

fn run_loop<E: Effector>(
    driver: &mut PedalDriver,
    effector: &mut E,
    toggles: &GestureToggles,
    clock: Clock,
    rx: &Receiver<PedalSignal>,
    shutdown: &AtomicBool,
) {
    let mut seen = toggles.snapshot();
    loop {
        if shutdown.load(Ordering::Relaxed) {
            driver.suspend(effector);
            break;
        }
        let snap = toggles.snapshot();
        if !snap.live(GestureFamily::Pedal)
            || snap.disabled_since(&seen, GestureFamily::Pedal)
            || snap.paused_since(&seen)
        {
            driver.suspend(effector);
        }
        seen = snap;

        let now = clock.now();
        let wait = driver
            .deadline()
            .map(|d| Duration::from_secs_f64((d - now).max(0.0)))
            .map_or(IDLE_POLL, |w| w.min(IDLE_POLL));

        match rx.recv_timeout(wait) {
            Ok(signal) => {
                let now = clock.now();
                if toggles.snapshot().live(GestureFamily::Pedal) {
                    driver.handle(signal, now, effector);
                } else {
                    log::debug!("Pedal {:?} ignored while disabled", signal);
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                driver.on_timeout(clock.now(), effector);
            }
            Err(RecvTimeoutError::Disconnected) => {
                driver.suspend(effector);
                log::info!("Pedal channel closed");
                break;
            }
        }
    }
    log::info!("Pedal runner stopped");
}
