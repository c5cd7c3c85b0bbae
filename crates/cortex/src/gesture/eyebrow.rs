//! Eyebrow scrolling against a self-calibrating rest height

use crate::config::EyebrowConfig;
use crate::smoothing::{AdaptiveBaseline, RepeatTicker, TrailingWindow};
use crate::types::{Action, ScrollDirection};

/// Smoothed brow height measured against an adaptive baseline.
///
/// Reports nothing until the smoothing window has filled. The deviation is
/// taken before the baseline adapts to the sample. Samples outside the band
/// leave the baseline alone until `relearn` of them arrive in a row, so a
/// held raise does not calibrate itself away but a shifted rest height does
/// get picked up.
#[derive(Debug, Clone)]
pub struct BrowSignal {
    window: TrailingWindow,
    baseline: AdaptiveBaseline,
}

impl BrowSignal {
    pub fn new(window: usize, rate: f64, band: f64, relearn: u32) -> Self {
        Self {
            window: TrailingWindow::new(window),
            baseline: AdaptiveBaseline::new(rate, band).with_relearn_after(relearn),
        }
    }

    pub fn configure(&mut self, window: usize, rate: f64, band: f64, relearn: u32) {
        self.window.set_capacity(window);
        self.baseline.rate = rate;
        self.baseline.band = band;
        self.baseline.relearn_after = relearn;
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline.value()
    }

    /// Feed one raw height; returns the signed deviation once warmed up
    pub fn observe(&mut self, height: f64) -> Option<f64> {
        let smoothed = self.window.push(height);
        if !self.window.is_full() || self.baseline.value().is_none() {
            self.baseline.observe(smoothed);
            return None;
        }
        let deviation = self.baseline.deviation(smoothed);
        self.baseline.observe(smoothed);
        deviation
    }

    /// Clear history and the baseline; both re-learn from fresh samples
    pub fn reset(&mut self) {
        self.window.clear();
        self.baseline.reset();
    }
}

#[derive(Debug, Clone)]
pub struct EyebrowScroller {
    config: EyebrowConfig,
    signal: BrowSignal,
    ticker: RepeatTicker,
    direction: Option<ScrollDirection>,
}

impl EyebrowScroller {
    pub fn new(config: EyebrowConfig) -> Self {
        Self {
            signal: BrowSignal::new(
                config.window,
                config.baseline_rate,
                config.baseline_band,
                config.baseline_relearn_frames,
            ),
            ticker: RepeatTicker::new(config.repeat_interval),
            direction: None,
            config,
        }
    }

    pub fn config(&self) -> &EyebrowConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EyebrowConfig) {
        self.signal.configure(
            config.window,
            config.baseline_rate,
            config.baseline_band,
            config.baseline_relearn_frames,
        );
        self.ticker.interval = config.repeat_interval;
        self.config = config;
    }

    pub fn baseline(&self) -> Option<f64> {
        self.signal.baseline()
    }

    /// Feed one brow height sample. Emits at most one scroll tick.
    pub fn update(&mut self, height: Option<f64>, now: f64) -> Option<Action> {
        let Some(deviation) = height.and_then(|h| self.signal.observe(h)) else {
            self.direction = None;
            self.ticker.reset();
            return None;
        };

        let direction = if deviation >= self.config.up_threshold {
            Some(ScrollDirection::Up)
        } else if deviation <= -self.config.down_threshold {
            Some(ScrollDirection::Down)
        } else {
            None
        };

        if direction != self.direction {
            log::debug!("Eyebrow direction {:?} (deviation {:+.3})", direction, deviation);
            self.direction = direction;
            self.ticker.reset();
        }

        let dir = direction?;
        if !self.ticker.poll(now, true) {
            return None;
        }
        let amount = dir.signed(self.config.scroll_amount);
        log::info!("Eyebrow -> SCROLL {}", amount);
        Some(Action::Scroll(amount))
    }

    pub fn reset(&mut self) {
        self.signal.reset();
        self.ticker.reset();
        self.direction = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REST: f64 = 0.25;
    const DT: f64 = 0.05;

    /// Run `frames` samples of `height` from `t`; returns scroll amounts and end time
    fn run(s: &mut EyebrowScroller, height: f64, frames: usize, mut t: f64) -> (Vec<i32>, f64) {
        let mut out = Vec::new();
        for _ in 0..frames {
            if let Some(Action::Scroll(n)) = s.update(Some(height), t) {
                out.push(n);
            }
            t += DT;
        }
        (out, t)
    }

    fn warmed() -> (EyebrowScroller, f64) {
        let mut s = EyebrowScroller::new(EyebrowConfig::default());
        let (out, t) = run(&mut s, REST, 20, 0.0);
        assert!(out.is_empty());
        (s, t)
    }

    #[test]
    fn test_warm_up_reports_nothing() {
        let mut signal = BrowSignal::new(5, 0.02, 0.02, 150);
        for _ in 0..4 {
            assert_eq!(signal.observe(0.3), None);
        }
        let dev = signal.observe(0.3).expect("warmed up");
        assert!(dev.abs() < 1e-9);
    }

    #[test]
    fn test_raise_scrolls_up_at_repeat_interval() {
        let (mut s, t) = warmed();
        // 1 s raised at 20 Hz; the window needs a few frames to cross
        let (out, _) = run(&mut s, REST + 0.08, 20, t);
        assert!(out.iter().all(|&n| n == 3));
        // 0.25 s interval over roughly 0.9 s of deviation
        assert!((3..=5).contains(&out.len()), "got {} ticks", out.len());
    }

    #[test]
    fn test_lower_scrolls_down() {
        let (mut s, t) = warmed();
        let (out, _) = run(&mut s, REST - 0.06, 10, t);
        assert!(!out.is_empty());
        assert!(out.iter().all(|&n| n == -3));
    }

    #[test]
    fn test_dead_zone_emits_nothing() {
        let (mut s, t) = warmed();
        let (out, _) = run(&mut s, REST + 0.015, 40, t);
        assert!(out.is_empty());
    }

    #[test]
    fn test_held_raise_does_not_calibrate_away() {
        let (mut s, t) = warmed();
        let before = s.baseline().unwrap();
        let (out, _) = run(&mut s, REST + 0.1, 100, t);
        assert!((s.baseline().unwrap() - before).abs() < 0.01);
        assert!(out.len() >= 15);
    }

    #[test]
    fn test_shifted_rest_height_stops_scrolling_eventually() {
        let (mut s, t) = warmed();
        // Rest height jumps well past the band and stays there
        let (out, t) = run(&mut s, REST + 0.1, 300, t);
        assert!(!out.is_empty());
        assert!(s.baseline().unwrap() > REST + 0.06);
        let (out, _) = run(&mut s, REST + 0.1, 40, t);
        assert!(out.is_empty());
    }

    #[test]
    fn test_missing_sample_suspends_ticking() {
        let (mut s, t) = warmed();
        let (out, t) = run(&mut s, REST + 0.1, 10, t);
        assert!(!out.is_empty());
        assert_eq!(s.update(None, t), None);
        assert_eq!(s.update(None, t + DT), None);
    }

    #[test]
    fn test_reset_relearns_from_fresh_data() {
        let (mut s, t) = warmed();
        s.reset();
        s.reset();
        assert_eq!(s.baseline(), None);
        // A new rest height after reset is learned, not scrolled on
        let (out, _) = run(&mut s, REST + 0.1, 30, t);
        assert!(out.is_empty());
    }
}
