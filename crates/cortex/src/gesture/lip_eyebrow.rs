//! Pucker toggles scroll mode, a held brow-lower scrolls down.
//!
//! The toggle and the brow tracker run independently; only the active flag
//! of the toggle gates the ticks.

use crate::config::LipEyebrowConfig;
use crate::gesture::eyebrow::BrowSignal;
use crate::gesture::lip::PuckerToggle;
use crate::smoothing::RepeatTicker;
use crate::types::Action;

#[derive(Debug, Clone)]
pub struct LipEyebrowScroller {
    config: LipEyebrowConfig,
    toggle: PuckerToggle,
    brow: BrowSignal,
    ticker: RepeatTicker,
    down_frames: u32,
}

impl LipEyebrowScroller {
    pub fn new(config: LipEyebrowConfig) -> Self {
        Self {
            toggle: PuckerToggle::new(config.pucker.clone()),
            brow: BrowSignal::new(
                config.brow_window,
                config.brow_baseline_rate,
                config.brow_baseline_band,
                config.brow_baseline_relearn_frames,
            ),
            ticker: RepeatTicker::new(config.repeat_interval),
            down_frames: 0,
            config,
        }
    }

    pub fn config(&self) -> &LipEyebrowConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LipEyebrowConfig) {
        self.toggle.set_config(config.pucker.clone());
        self.brow.configure(
            config.brow_window,
            config.brow_baseline_rate,
            config.brow_baseline_band,
            config.brow_baseline_relearn_frames,
        );
        self.ticker.interval = config.repeat_interval;
        self.config = config;
    }

    pub fn is_active(&self) -> bool {
        self.toggle.is_active()
    }

    /// Emits at most one scroll-down tick
    pub fn update(
        &mut self,
        width: Option<f64>,
        open: Option<f64>,
        brow: Option<f64>,
        now: f64,
    ) -> Option<Action> {
        if self.toggle.observe(width, open, now) {
            log::info!(
                "Lip+eyebrow scroll mode {}",
                if self.toggle.is_active() { "ON" } else { "OFF" }
            );
            self.down_frames = 0;
            self.ticker.reset();
        }
        let deviation = brow.and_then(|h| self.brow.observe(h));
        if !self.toggle.is_active() {
            return None;
        }

        match deviation {
            Some(d) if d <= -self.config.brow_down_threshold => self.down_frames += 1,
            Some(_) => self.down_frames = 0,
            None => return None,
        }

        let held = self.down_frames >= self.config.min_consec_frames;
        if !self.ticker.poll(now, held) {
            return None;
        }
        let amount = -self.config.scroll_amount;
        log::info!("Lip+eyebrow -> SCROLL {}", amount);
        Some(Action::Scroll(amount))
    }

    pub fn reset(&mut self) {
        self.toggle.reset();
        self.brow.reset();
        self.ticker.reset();
        self.down_frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REST_W: f64 = 0.55;
    const PUCKER_W: f64 = 0.40;
    const SHUT: f64 = 0.02;
    const BROW: f64 = 0.25;
    const DT: f64 = 0.05;

    fn run(
        s: &mut LipEyebrowScroller,
        width: f64,
        brow: f64,
        frames: usize,
        mut t: f64,
    ) -> (Vec<i32>, f64) {
        let mut out = Vec::new();
        for _ in 0..frames {
            if let Some(Action::Scroll(n)) = s.update(Some(width), Some(SHUT), Some(brow), t) {
                out.push(n);
            }
            t += DT;
        }
        (out, t)
    }

    fn armed() -> (LipEyebrowScroller, f64) {
        armed_with(LipEyebrowConfig::default())
    }

    fn armed_with(config: LipEyebrowConfig) -> (LipEyebrowScroller, f64) {
        let mut s = LipEyebrowScroller::new(config);
        let (_, t) = run(&mut s, REST_W, BROW, 10, 0.0);
        let (_, t) = run(&mut s, PUCKER_W, BROW, 20, t);
        let (out, t) = run(&mut s, REST_W, BROW, 10, t);
        assert!(out.is_empty());
        assert!(s.is_active());
        (s, t)
    }

    #[test]
    fn test_lowered_brow_scrolls_down_while_active() {
        let (mut s, t) = armed();
        let (out, _) = run(&mut s, REST_W, BROW - 0.08, 20, t);
        assert!(!out.is_empty());
        assert!(out.iter().all(|&n| n == -3));
    }

    #[test]
    fn test_brow_ignored_while_inactive() {
        let mut s = LipEyebrowScroller::new(LipEyebrowConfig::default());
        let (_, t) = run(&mut s, REST_W, BROW, 10, 0.0);
        let (out, _) = run(&mut s, REST_W, BROW - 0.08, 40, t);
        assert!(out.is_empty());
    }

    #[test]
    fn test_brief_lower_under_min_frames_is_ignored() {
        let (mut s, t) = armed();
        // One lowered sample only moves the smoothed height a fifth of the way
        let (out, t) = run(&mut s, REST_W, BROW - 0.1, 1, t);
        let (more, _) = run(&mut s, REST_W, BROW, 10, t);
        assert!(out.is_empty() && more.is_empty());
    }

    #[test]
    fn test_scroll_waits_for_min_consecutive_frames() {
        let (mut s, t) = armed_with(LipEyebrowConfig {
            brow_window: 1,
            min_consec_frames: 3,
            ..Default::default()
        });
        let (out, t) = run(&mut s, REST_W, BROW - 0.08, 2, t);
        assert!(out.is_empty());
        let (out, t) = run(&mut s, REST_W, BROW - 0.08, 1, t);
        assert_eq!(out, vec![-3]);

        // Coming back up restarts the count
        let (_, t) = run(&mut s, REST_W, BROW, 1, t);
        let (out, _) = run(&mut s, REST_W, BROW - 0.08, 2, t);
        assert!(out.is_empty());
    }

    #[test]
    fn test_raised_brow_never_scrolls() {
        let (mut s, t) = armed();
        let (out, _) = run(&mut s, REST_W, BROW + 0.1, 40, t);
        assert!(out.is_empty());
    }

    #[test]
    fn test_reset_disarms() {
        let (mut s, t) = armed();
        s.reset();
        s.reset();
        let (out, _) = run(&mut s, REST_W, BROW - 0.08, 20, t);
        assert!(out.is_empty());
        assert!(!s.is_active());
    }
}
