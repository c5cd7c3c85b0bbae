//! Gaze-to-screen cursor mapping with EMA smoothing

use crate::config::{CursorConfig, ScreenConfig};
use crate::smoothing::Ema;
use crate::types::Point2;

/// Clamp a raw gaze point into the head-range window and rescale it to 0.0-1.0
pub fn normalize_gaze(gaze: Point2, range: (f64, f64)) -> Point2 {
    let (lo, hi) = range;
    let span = hi - lo;
    let axis = |v: f64| {
        if span <= 0.0 || !v.is_finite() {
            return 0.5;
        }
        (v.clamp(lo, hi) - lo) / span
    };
    Point2::new(axis(gaze.x), axis(gaze.y))
}

/// Maps a gaze point to screen pixels and low-pass filters the result
#[derive(Debug, Clone)]
pub struct CursorMapper {
    config: CursorConfig,
    width: f64,
    height: f64,
    x: Ema,
    y: Ema,
}

impl CursorMapper {
    pub fn new(config: CursorConfig, screen: &ScreenConfig) -> Self {
        Self {
            x: Ema::new(config.alpha),
            y: Ema::new(config.alpha),
            width: f64::from(screen.width.max(1)),
            height: f64::from(screen.height.max(1)),
            config,
        }
    }

    pub fn config(&self) -> &CursorConfig {
        &self.config
    }

    /// Swap parameters; the filter keeps its current position
    pub fn set_config(&mut self, config: CursorConfig) {
        self.x.alpha = config.alpha;
        self.y.alpha = config.alpha;
        self.config = config;
    }

    pub fn set_screen(&mut self, screen: &ScreenConfig) {
        self.width = f64::from(screen.width.max(1));
        self.height = f64::from(screen.height.max(1));
    }

    /// Unsmoothed pixel target for a gaze point
    pub fn target(&self, gaze: Point2) -> (f64, f64) {
        let norm = normalize_gaze(gaze, self.config.head_range);
        let gain = self.config.gain.clamp(0.1, 2.0);
        let tx = (norm.x * self.width * gain).clamp(0.0, self.width - 1.0);
        let ty = (norm.y * self.height * gain).clamp(0.0, self.height - 1.0);
        (tx, ty)
    }

    /// Feed one gaze sample and return the smoothed pixel position
    pub fn update(&mut self, gaze: Point2) -> (i32, i32) {
        let (tx, ty) = self.target(gaze);
        let sx = self.x.update(tx);
        let sy = self.y.update(ty);
        (sx as i32, sy as i32)
    }

    pub fn position(&self) -> Option<(i32, i32)> {
        Some((self.x.value()? as i32, self.y.value()? as i32))
    }

    /// Forget the filter so the next sample lands exactly
    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> CursorMapper {
        CursorMapper::new(CursorConfig::default(), &ScreenConfig::default())
    }

    #[test]
    fn test_head_range_rescale() {
        let n = normalize_gaze(Point2::new(0.5, 0.375), (0.375, 0.625));
        assert!((n.x - 0.5).abs() < 1e-12);
        assert_eq!(n.y, 0.0);
        let n = normalize_gaze(Point2::new(0.9, 0.1), (0.375, 0.625));
        assert_eq!((n.x, n.y), (1.0, 0.0));
    }

    #[test]
    fn test_target_clamped_to_screen() {
        let mut m = mapper();
        m.set_config(CursorConfig {
            gain: 2.0,
            ..Default::default()
        });
        let (x, y) = m.target(Point2::new(0.6, 0.6));
        assert_eq!(x, 1919.0);
        assert_eq!(y, 1079.0);
    }

    #[test]
    fn test_first_sample_initializes_exactly() {
        let mut m = mapper();
        assert_eq!(m.update(Point2::new(0.5, 0.5)), (960, 540));
    }

    #[test]
    fn test_converges_without_overshoot() {
        let mut m = mapper();
        m.update(Point2::new(0.375, 0.375));
        let target = m.target(Point2::new(0.6, 0.55));
        let mut prev = (0.0f64, 0.0f64);
        for _ in 0..200 {
            m.update(Point2::new(0.6, 0.55));
            let x = m.x.value().unwrap();
            let y = m.y.value().unwrap();
            assert!(x >= prev.0 && y >= prev.1, "must move monotonically");
            assert!(x <= target.0 && y <= target.1, "must never overshoot");
            prev = (x, y);
        }
        assert!((prev.0 - target.0).abs() < 1.0);
        assert!((prev.1 - target.1).abs() < 1.0);
    }

    #[test]
    fn test_reset_prevents_jump_from_stale_state() {
        let mut m = mapper();
        m.update(Point2::new(0.375, 0.375));
        m.reset();
        assert_eq!(m.position(), None);
        let (x, y) = m.update(Point2::new(0.625, 0.625));
        assert_eq!((x, y), (1919, 1079));
    }
}
