//! Engine configuration
//!
//! Every threshold and time window is runtime-tunable. Out-of-range values are
//! clamped by [`EngineConfig::sanitized`] rather than rejected.

use crate::error::CortexError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: u32,
    pub height: u32,
    /// Ask the effector for the real display size at startup
    pub auto_detect: bool,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            auto_detect: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    /// Movement gain applied after rescaling, 0.1-2.0
    pub gain: f64,
    /// EMA weight of each new target, 0.05-0.95
    pub alpha: f64,
    /// Normalized gaze window mapped onto the full screen
    pub head_range: (f64, f64),
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            gain: 1.0,
            alpha: 0.25,
            head_range: (0.375, 0.625),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DwellConfig {
    /// How far the cursor may drift while holding (pixels)
    pub radius_px: f64,
    /// Steady time before dwell starts counting (seconds)
    pub arm_delay: f64,
    /// Steady time required to click (seconds)
    pub dwell_time: f64,
    pub cooldown: f64,
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            radius_px: 45.0,
            arm_delay: 0.15,
            dwell_time: 1.2,
            cooldown: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    pub threshold_left: f64,
    pub threshold_right: f64,
    pub window: usize,
    pub min_consec_frames: u32,
    pub cooldown: f64,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            threshold_left: 0.22,
            threshold_right: 0.22,
            window: 5,
            min_consec_frames: 2,
            cooldown: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MouthConfig {
    /// Aperture ratio that arms the gesture
    pub arm_open_ratio: f64,
    /// Aperture ratio that completes it; kept below `arm_open_ratio`
    pub close_ratio: f64,
    pub cooldown: f64,
    /// Second open/close completing within this window makes a double-click
    pub double_click_window: f64,
    /// Holding open this long yields a right-click
    pub right_click_hold: f64,
    pub window: usize,
}

impl Default for MouthConfig {
    fn default() -> Self {
        Self {
            arm_open_ratio: 0.35,
            close_ratio: 0.20,
            cooldown: 0.4,
            double_click_window: 0.5,
            right_click_hold: 1.0,
            window: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyebrowConfig {
    pub up_threshold: f64,
    pub down_threshold: f64,
    pub scroll_amount: i32,
    pub repeat_interval: f64,
    pub window: usize,
    pub baseline_rate: f64,
    pub baseline_band: f64,
    /// Consecutive out-of-band frames after which the rest height re-learns
    pub baseline_relearn_frames: u32,
}

impl Default for EyebrowConfig {
    fn default() -> Self {
        Self {
            up_threshold: 0.04,
            down_threshold: 0.03,
            scroll_amount: 3,
            repeat_interval: 0.25,
            window: 5,
            baseline_rate: 0.02,
            baseline_band: 0.02,
            baseline_relearn_frames: 150,
        }
    }
}

/// Pucker-and-hold toggle shared by both lip scroll modes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuckerConfig {
    /// Relative mouth narrowing against the learned baseline
    pub pucker_threshold: f64,
    /// Mouth aperture at or below which the lips count as closed
    pub lips_closed_ratio: f64,
    pub toggle_hold: f64,
    pub window: usize,
    pub baseline_rate: f64,
    pub baseline_band: f64,
}

impl Default for PuckerConfig {
    fn default() -> Self {
        Self {
            pucker_threshold: 0.12,
            lips_closed_ratio: 0.08,
            toggle_hold: 0.6,
            window: 5,
            baseline_rate: 0.02,
            baseline_band: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LipConfig {
    #[serde(flatten)]
    pub pucker: PuckerConfig,
    pub scroll_amount: i32,
    pub repeat_interval: f64,
    /// Normalized gaze y (0 is the top) at or below which scrolling goes up
    pub gaze_up: f64,
    /// Normalized gaze y at or above which scrolling goes down
    pub gaze_down: f64,
    /// Hysteresis around both gaze thresholds
    pub deadband: f64,
}

impl Default for LipConfig {
    fn default() -> Self {
        Self {
            pucker: PuckerConfig::default(),
            scroll_amount: 3,
            repeat_interval: 0.2,
            gaze_up: 0.40,
            gaze_down: 0.60,
            deadband: 0.03,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LipEyebrowConfig {
    #[serde(flatten)]
    pub pucker: PuckerConfig,
    pub brow_down_threshold: f64,
    pub min_consec_frames: u32,
    pub brow_window: usize,
    pub brow_baseline_rate: f64,
    pub brow_baseline_band: f64,
    pub brow_baseline_relearn_frames: u32,
    pub scroll_amount: i32,
    pub repeat_interval: f64,
}

impl Default for LipEyebrowConfig {
    fn default() -> Self {
        Self {
            pucker: PuckerConfig::default(),
            brow_down_threshold: 0.03,
            min_consec_frames: 3,
            brow_window: 5,
            brow_baseline_rate: 0.02,
            brow_baseline_band: 0.02,
            brow_baseline_relearn_frames: 150,
            scroll_amount: 3,
            repeat_interval: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PedalConfig {
    /// Press longer than this becomes a drag
    pub hold_threshold: f64,
    pub multi_tap_window: f64,
}

impl Default for PedalConfig {
    fn default() -> Self {
        Self {
            hold_threshold: 0.35,
            multi_tap_window: 0.45,
        }
    }
}

/// Gesture families enabled at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModesConfig {
    pub dwell: bool,
    pub blink: bool,
    pub mouth: bool,
    pub eyebrow_scroll: bool,
    pub lip_scroll: bool,
    pub lip_eyebrow_scroll: bool,
    pub pedal: bool,
}

impl Default for ModesConfig {
    fn default() -> Self {
        Self {
            dwell: true,
            blink: false,
            mouth: false,
            eyebrow_scroll: false,
            lip_scroll: false,
            lip_eyebrow_scroll: false,
            pedal: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub frame_interval_ms: u64,
    /// Drive dwell clicking from the physical pointer when no face is visible
    pub mouse_fallback: bool,
    pub udp_addr: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            mouse_fallback: true,
            udp_addr: "127.0.0.1:5055".to_string(),
        }
    }
}

/// Complete configuration for the engine and the pedal thread
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub screen: ScreenConfig,
    pub cursor: CursorConfig,
    pub dwell: DwellConfig,
    pub blink: BlinkConfig,
    pub mouth: MouthConfig,
    pub eyebrow: EyebrowConfig,
    pub lip: LipConfig,
    pub lip_eyebrow: LipEyebrowConfig,
    pub pedal: PedalConfig,
    pub modes: ModesConfig,
    pub runtime: RuntimeConfig,
}

impl EngineConfig {
    /// Load a TOML file; missing keys fall back to defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CortexError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CortexError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| CortexError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let config: EngineConfig = toml::from_str(content)?;
        Ok(config.sanitized())
    }

    /// Clamp every value into its documented range
    pub fn sanitized(mut self) -> Self {
        let s = &mut self.screen;
        s.width = s.width.max(1);
        s.height = s.height.max(1);

        let c = &mut self.cursor;
        c.gain = clamp(c.gain, 0.1, 2.0);
        c.alpha = clamp(c.alpha, 0.05, 0.95);
        let lo = clamp(c.head_range.0, 0.0, 0.49);
        let hi = clamp(c.head_range.1, lo + 0.01, 1.0);
        c.head_range = (lo, hi);

        let d = &mut self.dwell;
        d.radius_px = clamp(d.radius_px, 5.0, 400.0);
        d.arm_delay = clamp(d.arm_delay, 0.0, 2.0);
        d.dwell_time = clamp(d.dwell_time, 0.2, 10.0);
        d.cooldown = clamp(d.cooldown, 0.0, 10.0);

        let b = &mut self.blink;
        b.threshold_left = clamp(b.threshold_left, 0.1, 0.5);
        b.threshold_right = clamp(b.threshold_right, 0.1, 0.5);
        b.window = b.window.clamp(1, 30);
        b.min_consec_frames = b.min_consec_frames.clamp(1, 30);
        b.cooldown = clamp(b.cooldown, 0.0, 5.0);

        let m = &mut self.mouth;
        m.arm_open_ratio = clamp(m.arm_open_ratio, 0.05, 1.5);
        m.close_ratio = clamp(m.close_ratio, 0.01, m.arm_open_ratio * 0.95);
        m.cooldown = clamp(m.cooldown, 0.0, 5.0);
        m.double_click_window = clamp(m.double_click_window, 0.05, 2.0);
        m.right_click_hold = clamp(m.right_click_hold, 0.2, 5.0);
        m.window = m.window.clamp(1, 30);

        let e = &mut self.eyebrow;
        e.up_threshold = clamp(e.up_threshold, 0.005, 0.5);
        e.down_threshold = clamp(e.down_threshold, 0.005, 0.5);
        e.scroll_amount = e.scroll_amount.clamp(1, 50);
        e.repeat_interval = clamp(e.repeat_interval, 0.02, 5.0);
        e.window = e.window.clamp(1, 30);
        e.baseline_rate = clamp(e.baseline_rate, 0.0, 1.0);
        e.baseline_band = clamp(e.baseline_band, 0.0, 1.0);
        e.baseline_relearn_frames = e.baseline_relearn_frames.clamp(1, 10_000);

        let l = &mut self.lip;
        sanitize_pucker(&mut l.pucker);
        l.scroll_amount = l.scroll_amount.clamp(1, 50);
        l.repeat_interval = clamp(l.repeat_interval, 0.02, 5.0);
        l.gaze_up = clamp(l.gaze_up, 0.0, 0.5);
        l.gaze_down = clamp(l.gaze_down, 0.5, 1.0);
        l.deadband = clamp(l.deadband, 0.0, 0.2);

        let le = &mut self.lip_eyebrow;
        sanitize_pucker(&mut le.pucker);
        le.brow_down_threshold = clamp(le.brow_down_threshold, 0.005, 0.5);
        le.min_consec_frames = le.min_consec_frames.clamp(1, 60);
        le.brow_window = le.brow_window.clamp(1, 30);
        le.brow_baseline_rate = clamp(le.brow_baseline_rate, 0.0, 1.0);
        le.brow_baseline_band = clamp(le.brow_baseline_band, 0.0, 1.0);
        le.brow_baseline_relearn_frames = le.brow_baseline_relearn_frames.clamp(1, 10_000);
        le.scroll_amount = le.scroll_amount.clamp(1, 50);
        le.repeat_interval = clamp(le.repeat_interval, 0.02, 5.0);

        let p = &mut self.pedal;
        p.hold_threshold = clamp(p.hold_threshold, 0.05, 5.0);
        p.multi_tap_window = clamp(p.multi_tap_window, 0.05, 5.0);

        self.runtime.frame_interval_ms = self.runtime.frame_interval_ms.min(1000);
        self
    }
}

fn sanitize_pucker(p: &mut PuckerConfig) {
    p.pucker_threshold = clamp(p.pucker_threshold, 0.01, 0.9);
    p.lips_closed_ratio = clamp(p.lips_closed_ratio, 0.0, 1.0);
    p.toggle_hold = clamp(p.toggle_hold, 0.05, 5.0);
    p.window = p.window.clamp(1, 30);
    p.baseline_rate = clamp(p.baseline_rate, 0.0, 1.0);
    p.baseline_band = clamp(p.baseline_band, 0.0, 1.0);
}

/// Clamp that also maps NaN to the lower bound
fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    if v.is_nan() {
        return lo;
    }
    v.clamp(lo, hi)
}
