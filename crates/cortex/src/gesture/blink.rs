//! Blink clicks from the eye aspect ratio.
//!
//! Each eye keeps a short trailing mean of its EAR. Frames below the eye's
//! threshold are counted; the click fires on the rising edge when the eye
//! reopens, so a closed eye cannot repeat clicks.
//!
//! Both eyes reopening on the same frame is read as a natural blink and
//! emits nothing. Classifying each eye on its own would produce a left and a
//! right click for every ordinary blink; only a wink (one eye) clicks here.

use crate::config::BlinkConfig;
use crate::smoothing::TrailingWindow;
use crate::types::Action;

#[derive(Debug, Clone)]
struct EyeChannel {
    window: TrailingWindow,
    closed_frames: u32,
    last_click: Option<f64>,
}

impl EyeChannel {
    fn new(window: usize) -> Self {
        Self {
            window: TrailingWindow::new(window),
            closed_frames: 0,
            last_click: None,
        }
    }

    /// Returns true on a qualifying reopen
    fn observe(&mut self, ear: f64, threshold: f64, cfg: &BlinkConfig, now: f64) -> bool {
        let avg = self.window.push(ear);
        if avg < threshold {
            self.closed_frames += 1;
            return false;
        }
        let closed_long_enough = self.closed_frames >= cfg.min_consec_frames;
        self.closed_frames = 0;
        closed_long_enough && self.last_click.map_or(true, |t| now - t >= cfg.cooldown)
    }

    fn reset(&mut self) {
        self.window.clear();
        self.closed_frames = 0;
        self.last_click = None;
    }
}

#[derive(Debug, Clone)]
pub struct BlinkDetector {
    config: BlinkConfig,
    left: EyeChannel,
    right: EyeChannel,
}

impl BlinkDetector {
    pub fn new(config: BlinkConfig) -> Self {
        Self {
            left: EyeChannel::new(config.window),
            right: EyeChannel::new(config.window),
            config,
        }
    }

    pub fn config(&self) -> &BlinkConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: BlinkConfig) {
        self.left.window.set_capacity(config.window);
        self.right.window.set_capacity(config.window);
        self.config = config;
    }

    /// Feed one frame of EAR values; a missing eye is no evidence for it
    pub fn update(&mut self, ear_left: Option<f64>, ear_right: Option<f64>, now: f64) -> Option<Action> {
        let cfg = &self.config;
        let left = ear_left.is_some_and(|ear| self.left.observe(ear, cfg.threshold_left, cfg, now));
        let right = ear_right.is_some_and(|ear| self.right.observe(ear, cfg.threshold_right, cfg, now));

        match (left, right) {
            (true, false) => {
                self.left.last_click = Some(now);
                log::info!("Left blink -> LEFT CLICK");
                Some(Action::left_click())
            }
            (false, true) => {
                self.right.last_click = Some(now);
                log::info!("Right blink -> RIGHT CLICK");
                Some(Action::right_click())
            }
            (true, true) => {
                log::debug!("Both eyes reopened together, treating as a natural blink");
                None
            }
            (false, false) => None,
        }
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}
