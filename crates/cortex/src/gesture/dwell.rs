//! Dwell click: hold the cursor steady long enough and it left-clicks.
//!
//! A short arming delay filters accidental micro-holds before the dwell timer
//! starts. Drifting outside the radius re-anchors on the current point, and a
//! cooldown after each click keeps a steady gaze from machine-gunning clicks.

use crate::config::DwellConfig;
use crate::types::Action;

#[derive(Debug, Clone)]
pub struct DwellClicker {
    config: DwellConfig,
    /// Anchor the cursor must stay near
    candidate: Option<(f64, f64)>,
    arm_start: f64,
    /// Set once the arming delay has passed
    dwell_start: Option<f64>,
    cooldown_until: Option<f64>,
    progress: f64,
}

impl DwellClicker {
    pub fn new(config: DwellConfig) -> Self {
        Self {
            config,
            candidate: None,
            arm_start: 0.0,
            dwell_start: None,
            cooldown_until: None,
            progress: 0.0,
        }
    }

    pub fn config(&self) -> &DwellConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: DwellConfig) {
        self.config = config;
    }

    /// Dwell progress in 0.0-1.0 for a visual indicator
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn has_candidate(&self) -> bool {
        self.candidate.is_some()
    }

    fn rearm(&mut self, point: (f64, f64), now: f64) {
        self.candidate = Some(point);
        self.arm_start = now;
        self.dwell_start = None;
        self.progress = 0.0;
    }

    /// Feed the current cursor position. Emits at most one left click.
    pub fn update(&mut self, x: f64, y: f64, now: f64) -> Option<Action> {
        if self.cooldown_until.is_some_and(|until| now < until) {
            self.progress = 0.0;
            return None;
        }

        let Some((cx, cy)) = self.candidate else {
            self.rearm((x, y), now);
            return None;
        };

        let (dx, dy) = (x - cx, y - cy);
        let radius = self.config.radius_px;
        if dx * dx + dy * dy > radius * radius {
            log::debug!("Dwell re-anchored at ({:.0}, {:.0})", x, y);
            self.rearm((x, y), now);
            return None;
        }

        let Some(start) = self.dwell_start else {
            if now - self.arm_start >= self.config.arm_delay {
                self.dwell_start = Some(now);
                self.progress = 0.0;
            }
            return None;
        };

        let elapsed = now - start;
        self.progress = (elapsed / self.config.dwell_time).clamp(0.0, 1.0);
        if elapsed < self.config.dwell_time {
            return None;
        }

        log::info!("Dwell -> LEFT CLICK");
        self.cooldown_until = Some(now + self.config.cooldown);
        self.candidate = None;
        self.arm_start = 0.0;
        self.dwell_start = None;
        self.progress = 0.0;
        Some(Action::left_click())
    }

    pub fn reset(&mut self) {
        self.candidate = None;
        self.arm_start = 0.0;
        self.dwell_start = None;
        self.cooldown_until = None;
        self.progress = 0.0;
    }
}
