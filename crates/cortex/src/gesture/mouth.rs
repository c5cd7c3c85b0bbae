//! Mouth clicks: open-then-close gestures classified by cadence.
//!
//! Opening past the arm ratio arms the gesture; closing below the close
//! ratio completes it. A completed gesture is held back for the double-click
//! window: a second completion inside it becomes a double-click, otherwise
//! the first flushes as a left click when the window expires. Holding the
//! mouth open past the right-click hold fires a right click instead, never
//! inside a cooldown; a hold that reaches it during one waits it out.

use crate::config::MouthConfig;
use crate::smoothing::TrailingWindow;
use crate::types::Action;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Open { since: f64 },
    /// Right click already fired; wait for the mouth to close
    Held,
}

#[derive(Debug, Clone)]
pub struct MouthClicker {
    config: MouthConfig,
    window: TrailingWindow,
    phase: Phase,
    /// Completion time of a gesture waiting to see if a second one follows
    pending_since: Option<f64>,
    cooldown_until: Option<f64>,
}

impl MouthClicker {
    pub fn new(config: MouthConfig) -> Self {
        Self {
            window: TrailingWindow::new(config.window),
            phase: Phase::Idle,
            pending_since: None,
            cooldown_until: None,
            config,
        }
    }

    pub fn config(&self) -> &MouthConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: MouthConfig) {
        self.window.set_capacity(config.window);
        self.config = config;
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.phase, Phase::Open { .. })
    }

    fn in_cooldown(&self, now: f64) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    fn emit(&mut self, action: Action, now: f64) -> Option<Action> {
        self.cooldown_until = Some(now + self.config.cooldown);
        Some(action)
    }

    /// Feed one aperture ratio sample. Emits at most one click.
    pub fn update(&mut self, ratio: Option<f64>, now: f64) -> Option<Action> {
        let level = ratio.map(|r| self.window.push(r));

        // An expired pending gesture flushes before this frame is classified
        let mut emitted = None;
        if let Some(first) = self.pending_since {
            if now - first >= self.config.double_click_window {
                self.pending_since = None;
                log::info!("Mouth -> LEFT CLICK");
                emitted = self.emit(Action::left_click(), now);
            }
        }

        let Some(level) = level else {
            return emitted;
        };

        match self.phase {
            Phase::Idle => {
                if level >= self.config.arm_open_ratio && !self.in_cooldown(now) {
                    log::debug!("Mouth armed at {:.2}", level);
                    self.phase = Phase::Open { since: now };
                }
            }
            Phase::Open { since } => {
                let held_long = now - since >= self.config.right_click_hold;
                if level <= self.config.close_ratio {
                    self.phase = Phase::Idle;
                    if held_long {
                        // The hold outlasted a cooldown and is not a click
                        log::debug!("Mouth hold ended without a right click");
                        return emitted;
                    }
                    match self.pending_since.take() {
                        Some(_) => {
                            log::info!("Mouth -> DOUBLE CLICK");
                            return self.emit(Action::double_click(), now);
                        }
                        None => self.pending_since = Some(now),
                    }
                } else if held_long && emitted.is_none() && !self.in_cooldown(now) {
                    if self.pending_since.take().is_some() {
                        // The earlier gesture goes out first; the right click follows
                        // once its cooldown has passed
                        log::info!("Mouth -> LEFT CLICK");
                        return self.emit(Action::left_click(), now);
                    }
                    self.phase = Phase::Held;
                    log::info!("Mouth hold -> RIGHT CLICK");
                    return self.emit(Action::right_click(), now);
                }
            }
            Phase::Held => {
                if level <= self.config.close_ratio {
                    self.phase = Phase::Idle;
                }
            }
        }

        emitted
    }

    /// Drop arm, hold, pending and cooldown state without emitting
    pub fn reset(&mut self) {
        self.window.clear();
        self.phase = Phase::Idle;
        self.pending_since = None;
        self.cooldown_until = None;
    }
}
