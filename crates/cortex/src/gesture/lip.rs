//! Lip-driven scroll mode
//!
//! A held pucker toggles scroll mode. While it is on, looking towards the
//! top or bottom of the head range scrolls that way at a fixed cadence.

use crate::config::{LipConfig, PuckerConfig};
use crate::smoothing::{AdaptiveBaseline, RepeatTicker, TrailingWindow};
use crate::types::{Action, ScrollDirection};

const MIN_BASELINE: f64 = 1e-6;

/// Pucker-and-hold on/off switch.
///
/// The pucker ratio is how much narrower the smoothed mouth is than its
/// learned rest width. One continuous hold flips the switch exactly once;
/// the lips must relax before another flip.
#[derive(Debug, Clone)]
pub struct PuckerToggle {
    config: PuckerConfig,
    window: TrailingWindow,
    baseline: AdaptiveBaseline,
    hold_since: Option<f64>,
    /// Set once the current hold has flipped the switch
    latched: bool,
    active: bool,
}

impl PuckerToggle {
    pub fn new(config: PuckerConfig) -> Self {
        Self {
            window: TrailingWindow::new(config.window),
            baseline: AdaptiveBaseline::new(config.baseline_rate, config.baseline_band),
            hold_since: None,
            latched: false,
            active: false,
            config,
        }
    }

    pub fn set_config(&mut self, config: PuckerConfig) {
        self.window.set_capacity(config.window);
        self.baseline.rate = config.baseline_rate;
        self.baseline.band = config.baseline_band;
        self.config = config;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline.value()
    }

    /// Feed mouth width and aperture. Returns true on the frame the switch flips.
    pub fn observe(&mut self, width: Option<f64>, open: Option<f64>, now: f64) -> bool {
        let Some(width) = width else {
            return false;
        };
        let smoothed = self.window.push(width);
        let Some(base) = self.baseline.value() else {
            self.baseline.observe(smoothed);
            return false;
        };

        let ratio = if base > MIN_BASELINE {
            1.0 - smoothed / base
        } else {
            0.0
        };
        let lips_closed = open.is_some_and(|o| o <= self.config.lips_closed_ratio);
        if ratio < self.config.pucker_threshold || !lips_closed {
            self.hold_since = None;
            self.latched = false;
            self.baseline.observe(smoothed);
            return false;
        }

        let since = *self.hold_since.get_or_insert(now);
        if self.latched || now - since < self.config.toggle_hold {
            return false;
        }
        self.latched = true;
        self.active = !self.active;
        true
    }

    /// Turn scroll mode off and forget the hold; the learned width is kept
    pub fn reset(&mut self) {
        self.window.clear();
        self.hold_since = None;
        self.latched = false;
        self.active = false;
    }
}

#[derive(Debug, Clone)]
pub struct LipScroller {
    config: LipConfig,
    toggle: PuckerToggle,
    ticker: RepeatTicker,
    direction: Option<ScrollDirection>,
}

impl LipScroller {
    pub fn new(config: LipConfig) -> Self {
        Self {
            toggle: PuckerToggle::new(config.pucker.clone()),
            ticker: RepeatTicker::new(config.repeat_interval),
            direction: None,
            config,
        }
    }

    pub fn config(&self) -> &LipConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LipConfig) {
        self.toggle.set_config(config.pucker.clone());
        self.ticker.interval = config.repeat_interval;
        self.config = config;
    }

    pub fn is_active(&self) -> bool {
        self.toggle.is_active()
    }

    /// Direction for a normalized gaze height, sticky within the deadband
    fn direction_for(&self, y: f64) -> Option<ScrollDirection> {
        let c = &self.config;
        match self.direction {
            Some(ScrollDirection::Up) if y < c.gaze_up + c.deadband => Some(ScrollDirection::Up),
            Some(ScrollDirection::Down) if y > c.gaze_down - c.deadband => {
                Some(ScrollDirection::Down)
            }
            _ if y <= c.gaze_up => Some(ScrollDirection::Up),
            _ if y >= c.gaze_down => Some(ScrollDirection::Down),
            _ => None,
        }
    }

    /// `gaze_y` is normalized to the head range, 0.0 at the top.
    /// Emits at most one scroll tick.
    pub fn update(
        &mut self,
        width: Option<f64>,
        open: Option<f64>,
        gaze_y: Option<f64>,
        now: f64,
    ) -> Option<Action> {
        if self.toggle.observe(width, open, now) {
            log::info!(
                "Lip scroll mode {}",
                if self.toggle.is_active() { "ON" } else { "OFF" }
            );
            self.direction = None;
            self.ticker.reset();
        }
        if !self.toggle.is_active() {
            return None;
        }

        let y = gaze_y?;
        let direction = self.direction_for(y);
        if direction != self.direction {
            log::debug!("Lip scroll direction {:?} at gaze y {:.2}", direction, y);
            self.direction = direction;
            self.ticker.reset();
        }

        let dir = direction?;
        if !self.ticker.poll(now, true) {
            return None;
        }
        let amount = dir.signed(self.config.scroll_amount);
        log::info!("Lip -> SCROLL {}", amount);
        Some(Action::Scroll(amount))
    }

    pub fn reset(&mut self) {
        self.toggle.reset();
        self.ticker.reset();
        self.direction = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REST_W: f64 = 0.55;
    const PUCKER_W: f64 = 0.40;
    const SHUT: f64 = 0.02;
    const DT: f64 = 0.05;

    fn scroller() -> LipScroller {
        LipScroller::new(LipConfig::default())
    }

    /// Feed `frames` samples from `t`; returns scroll amounts and end time
    fn run(
        s: &mut LipScroller,
        width: f64,
        gaze_y: f64,
        frames: usize,
        mut t: f64,
    ) -> (Vec<i32>, f64) {
        let mut out = Vec::new();
        for _ in 0..frames {
            if let Some(Action::Scroll(n)) = s.update(Some(width), Some(SHUT), Some(gaze_y), t) {
                out.push(n);
            }
            t += DT;
        }
        (out, t)
    }

    /// Rest, then pucker for 1 s, then relax: one toggle
    fn toggle_on(s: &mut LipScroller) -> f64 {
        let (_, t) = run(s, REST_W, 0.5, 10, 0.0);
        let (_, t) = run(s, PUCKER_W, 0.5, 20, t);
        let (_, t) = run(s, REST_W, 0.5, 10, t);
        t
    }

    #[test]
    fn test_long_hold_toggles_exactly_once() {
        let mut toggle = PuckerToggle::new(PuckerConfig::default());
        let mut flips = 0;
        let mut t = 0.0;
        for _ in 0..10 {
            toggle.observe(Some(REST_W), Some(SHUT), t);
            t += DT;
        }
        // 3 s hold, five times the toggle hold
        for _ in 0..60 {
            if toggle.observe(Some(PUCKER_W), Some(SHUT), t) {
                flips += 1;
            }
            t += DT;
        }
        assert_eq!(flips, 1);
        assert!(toggle.is_active());
    }

    #[test]
    fn test_open_mouth_is_not_a_pucker() {
        let mut toggle = PuckerToggle::new(PuckerConfig::default());
        let mut t = 0.0;
        for _ in 0..10 {
            toggle.observe(Some(REST_W), Some(SHUT), t);
            t += DT;
        }
        for _ in 0..40 {
            assert!(!toggle.observe(Some(PUCKER_W), Some(0.3), t));
            t += DT;
        }
    }

    #[test]
    fn test_second_hold_toggles_off() {
        let mut s = scroller();
        let t = toggle_on(&mut s);
        assert!(s.is_active());
        let (_, t) = run(&mut s, PUCKER_W, 0.5, 20, t);
        run(&mut s, REST_W, 0.5, 5, t);
        assert!(!s.is_active());
    }

    #[test]
    fn test_inactive_never_scrolls() {
        let mut s = scroller();
        let (out, _) = run(&mut s, REST_W, 0.1, 40, 0.0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_gaze_selects_direction_at_interval() {
        let mut s = scroller();
        let t = toggle_on(&mut s);
        // Centre: dead zone
        let (out, t) = run(&mut s, REST_W, 0.5, 10, t);
        assert!(out.is_empty());
        // Looking up for 1 s at 0.2 s cadence
        let (out, t) = run(&mut s, REST_W, 0.2, 20, t);
        assert!((4..=6).contains(&out.len()), "got {}", out.len());
        assert!(out.iter().all(|&n| n == 3));
        let (out, _) = run(&mut s, REST_W, 0.8, 10, t);
        assert!(!out.is_empty());
        assert!(out.iter().all(|&n| n == -3));
    }

    #[test]
    fn test_deadband_keeps_direction() {
        let mut s = scroller();
        let t = toggle_on(&mut s);
        let (out, t) = run(&mut s, REST_W, 0.39, 1, t);
        assert_eq!(out, vec![3]);
        // Just past the up threshold but inside the deadband
        let (out, _) = run(&mut s, REST_W, 0.42, 10, t);
        assert!(!out.is_empty());
    }

    #[test]
    fn test_reset_turns_mode_off() {
        let mut s = scroller();
        toggle_on(&mut s);
        s.reset();
        s.reset();
        assert!(!s.is_active());
    }
}
