//! Foot pedal taps and drags.
//!
//! IDLE -> PRESSED -> {DRAGGING | tap classified} -> IDLE. The hold timer is
//! a value handed back to the caller, who schedules it and calls
//! [`PedalClassifier::fire`] with its token when the deadline passes. Each
//! press issues a fresh token, so a timer that fires after its press was
//! released or superseded is a no-op.

use crate::config::PedalConfig;
use crate::types::{Action, MouseButton, TapKind};
use std::collections::VecDeque;

/// Scheduled hold check for one press
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldTimer {
    pub token: u64,
    pub deadline: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PedalState {
    Idle,
    Pressed { at: f64, timer: HoldTimer },
    Dragging,
}

#[derive(Debug, Clone)]
pub struct PedalClassifier {
    config: PedalConfig,
    state: PedalState,
    /// Release times of recent taps, oldest first
    taps: VecDeque<f64>,
    next_token: u64,
}

impl PedalClassifier {
    pub fn new(config: PedalConfig) -> Self {
        Self {
            config,
            state: PedalState::Idle,
            taps: VecDeque::new(),
            next_token: 0,
        }
    }

    pub fn config(&self) -> &PedalConfig {
        &self.config
    }

    /// New thresholds apply from the next press
    pub fn set_config(&mut self, config: PedalConfig) {
        self.config = config;
    }

    pub fn is_dragging(&self) -> bool {
        self.state == PedalState::Dragging
    }

    pub fn is_pressed(&self) -> bool {
        !matches!(self.state, PedalState::Idle)
    }

    /// Deadline of the outstanding hold timer, if any
    pub fn pending_deadline(&self) -> Option<f64> {
        match self.state {
            PedalState::Pressed { timer, .. } => Some(timer.deadline),
            _ => None,
        }
    }

    /// Pedal went down. Returns the hold timer to schedule; key repeat while
    /// already down returns `None`.
    pub fn press(&mut self, now: f64) -> Option<HoldTimer> {
        if self.state != PedalState::Idle {
            return None;
        }
        self.next_token += 1;
        let timer = HoldTimer {
            token: self.next_token,
            deadline: now + self.config.hold_threshold,
        };
        self.state = PedalState::Pressed { at: now, timer };
        log::debug!("Pedal pressed at {:.3}", now);
        Some(timer)
    }

    /// Hold timer callback. Starts a drag if `token` is still the live timer.
    pub fn fire(&mut self, token: u64, now: f64) -> Option<Action> {
        match self.state {
            PedalState::Pressed { at, timer } if timer.token == token => {
                self.state = PedalState::Dragging;
                log::info!("Pedal held {:.2}s -> DRAG START", now - at);
                Some(Action::ButtonDown(MouseButton::Left))
            }
            _ => {
                log::debug!("Ignoring stale hold timer {}", token);
                None
            }
        }
    }

    /// Fire the hold timer if its deadline has passed
    pub fn poll(&mut self, now: f64) -> Option<Action> {
        match self.state {
            PedalState::Pressed { timer, .. } if now >= timer.deadline => self.fire(timer.token, now),
            _ => None,
        }
    }

    /// Pedal came up. Ends a drag or classifies the tap.
    pub fn release(&mut self, now: f64) -> Option<Action> {
        match std::mem::replace(&mut self.state, PedalState::Idle) {
            PedalState::Idle => None,
            PedalState::Dragging => {
                log::info!("Pedal released -> DRAG END");
                Some(Action::ButtonUp(MouseButton::Left))
            }
            PedalState::Pressed { .. } => {
                let kind = self.classify(now);
                log::info!("Pedal {} tap", kind.as_str());
                Some(kind.action())
            }
        }
    }

    fn classify(&mut self, now: f64) -> TapKind {
        let window = self.config.multi_tap_window;
        while self.taps.front().is_some_and(|&t| now - t > window) {
            self.taps.pop_front();
        }
        let kind = match self.taps.len() {
            0 => TapKind::Single,
            1 => TapKind::Double,
            _ => TapKind::Triple,
        };
        if kind == TapKind::Triple {
            self.taps.clear();
        } else {
            self.taps.push_back(now);
        }
        kind
    }

    /// Back to idle with no history. Callers holding a drag must release the
    /// button themselves; see [`PedalClassifier::is_dragging`].
    pub fn reset(&mut self) {
        self.state = PedalState::Idle;
        self.taps.clear();
    }
}
