//! Engine driver
//!
//! Owns every frame-driven classifier and runs the enabled ones in a fixed
//! order for each frame: cursor and dwell, then blink, mouth and the scroll
//! modes. Whatever they emit is handed to the effector straight away.

use crate::config::EngineConfig;
use crate::effector::{dispatch, Effector};
use crate::error::CortexError;
use crate::gesture::{
    normalize_gaze, BlinkDetector, CursorMapper, DwellClicker, EyebrowScroller,
    LipEyebrowScroller, LipScroller, MouthClicker,
};
use crate::landmarks;
use crate::source::{LandmarkSource, SourceEvent};
use crate::toggles::{GestureFamily, GestureToggles, ToggleSnapshot};
use crate::types::{Action, LandmarkFrame};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Dwell progress is logged at most this often
const PROGRESS_LOG_INTERVAL: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub frames: u64,
    /// Frames with no usable face, including gaps reported by the source
    pub faceless_frames: u64,
    /// Discrete actions emitted (clicks, scrolls, button changes)
    pub actions: u64,
    pub effector_failures: u64,
    pub resets: u64,
}

pub struct Engine<E: Effector> {
    config: EngineConfig,
    toggles: Arc<GestureToggles>,
    /// Flags as of the previous step
    seen: ToggleSnapshot,
    effector: E,
    cursor: CursorMapper,
    dwell: DwellClicker,
    blink: BlinkDetector,
    mouth: MouthClicker,
    eyebrow: EyebrowScroller,
    lip: LipScroller,
    lip_eyebrow: LipEyebrowScroller,
    last_source: Option<u32>,
    last_progress_log: f64,
    stats: EngineStats,
}

impl<E: Effector> Engine<E> {
    pub fn new(config: EngineConfig, toggles: Arc<GestureToggles>, effector: E) -> Self {
        let config = config.sanitized();
        Self {
            seen: toggles.snapshot(),
            toggles,
            effector,
            cursor: CursorMapper::new(config.cursor.clone(), &config.screen),
            dwell: DwellClicker::new(config.dwell.clone()),
            blink: BlinkDetector::new(config.blink.clone()),
            mouth: MouthClicker::new(config.mouth.clone()),
            eyebrow: EyebrowScroller::new(config.eyebrow.clone()),
            lip: LipScroller::new(config.lip.clone()),
            lip_eyebrow: LipEyebrowScroller::new(config.lip_eyebrow.clone()),
            last_source: None,
            last_progress_log: f64::NEG_INFINITY,
            stats: EngineStats::default(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Swap parameters without touching classifier state; a gesture in
    /// flight finishes under whichever values it sees next.
    pub fn apply_config(&mut self, config: EngineConfig) {
        let config = config.sanitized();
        self.cursor.set_config(config.cursor.clone());
        self.cursor.set_screen(&config.screen);
        self.dwell.set_config(config.dwell.clone());
        self.blink.set_config(config.blink.clone());
        self.mouth.set_config(config.mouth.clone());
        self.eyebrow.set_config(config.eyebrow.clone());
        self.lip.set_config(config.lip.clone());
        self.lip_eyebrow.set_config(config.lip_eyebrow.clone());
        self.config = config;
        log::info!("Engine configuration updated");
    }

    pub fn toggles(&self) -> &Arc<GestureToggles> {
        &self.toggles
    }

    pub fn effector(&self) -> &E {
        &self.effector
    }

    pub fn effector_mut(&mut self) -> &mut E {
        &mut self.effector
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn dwell_progress(&self) -> f64 {
        self.dwell.progress()
    }

    pub fn lip_scroll_active(&self) -> bool {
        self.lip.is_active()
    }

    pub fn lip_eyebrow_scroll_active(&self) -> bool {
        self.lip_eyebrow.is_active()
    }

    /// Pause tracking and drop every in-flight gesture now
    pub fn pause(&mut self) {
        self.toggles.set_tracking(false);
        self.reset_all();
        self.seen = self.toggles.snapshot();
    }

    pub fn resume(&mut self) {
        self.toggles.set_tracking(true);
        self.seen = self.toggles.snapshot();
    }

    /// Hard reset after a camera change
    pub fn source_changed(&mut self, source: u32) {
        log::info!("Landmark source changed to {source}, resetting all classifiers");
        self.last_source = Some(source);
        self.reset_all();
    }

    pub fn reset_all(&mut self) {
        self.cursor.reset();
        self.dwell.reset();
        self.blink.reset();
        self.mouth.reset();
        self.eyebrow.reset();
        self.lip.reset();
        self.lip_eyebrow.reset();
        self.last_progress_log = f64::NEG_INFINITY;
        self.stats.resets += 1;
    }

    fn reset_family(&mut self, family: GestureFamily) {
        log::debug!("Resetting {}", family.as_str());
        match family {
            GestureFamily::Dwell => self.dwell.reset(),
            GestureFamily::Blink => self.blink.reset(),
            GestureFamily::Mouth => self.mouth.reset(),
            GestureFamily::Eyebrow => self.eyebrow.reset(),
            GestureFamily::Lip => self.lip.reset(),
            GestureFamily::LipEyebrow => self.lip_eyebrow.reset(),
            // Owned by the pedal runner
            GestureFamily::Pedal => {}
        }
    }

    /// Pick up flag changes made since the last step. A family switched off
    /// and back on between two steps is still reset.
    fn reconcile(&mut self) -> ToggleSnapshot {
        let now = self.toggles.snapshot();
        if now.paused_since(&self.seen) {
            self.reset_all();
        } else {
            for family in GestureFamily::ALL {
                if now.disabled_since(&self.seen, family) {
                    self.reset_family(family);
                }
            }
        }
        self.seen = now;
        now
    }

    /// Run one frame through every enabled classifier.
    ///
    /// `frame` is `None` when the source had no face. Returns everything that
    /// was handed to the effector, cursor moves included.
    pub fn step(&mut self, frame: Option<&LandmarkFrame>, now: f64) -> Vec<Action> {
        let snap = self.reconcile();
        self.stats.frames += 1;
        if !snap.tracking {
            return Vec::new();
        }

        if let Some(f) = frame {
            match self.last_source {
                Some(prev) if prev != f.source => self.source_changed(f.source),
                None => self.last_source = Some(f.source),
                _ => {}
            }
        }

        let features = frame.map(landmarks::extract).unwrap_or_default();
        let mut actions = Vec::new();

        match features.gaze {
            Some(gaze) => {
                let (x, y) = self.cursor.update(gaze);
                actions.push(Action::MoveCursor { x, y });
                if snap.live(GestureFamily::Dwell) {
                    actions.extend(self.dwell.update(f64::from(x), f64::from(y), now));
                }
            }
            None => {
                self.stats.faceless_frames += 1;
                if self.config.runtime.mouse_fallback && snap.live(GestureFamily::Dwell) {
                    if let Some((x, y)) = self.effector.cursor_position() {
                        actions.extend(self.dwell.update(f64::from(x), f64::from(y), now));
                    }
                }
            }
        }

        if snap.live(GestureFamily::Blink) {
            actions.extend(self.blink.update(features.ear_left, features.ear_right, now));
        }
        if snap.live(GestureFamily::Mouth) {
            actions.extend(self.mouth.update(features.mouth_open, now));
        }
        if snap.live(GestureFamily::Eyebrow) {
            actions.extend(self.eyebrow.update(features.brow_height, now));
        }
        if snap.live(GestureFamily::Lip) {
            let gaze_y = features
                .gaze
                .map(|g| normalize_gaze(g, self.cursor.config().head_range).y);
            actions.extend(self.lip.update(
                features.mouth_width,
                features.mouth_open,
                gaze_y,
                now,
            ));
        }
        if snap.live(GestureFamily::LipEyebrow) {
            actions.extend(self.lip_eyebrow.update(
                features.mouth_width,
                features.mouth_open,
                features.brow_height,
                now,
            ));
        }

        for action in &actions {
            if !dispatch(&mut self.effector, action) {
                self.stats.effector_failures += 1;
            } else if action.is_discrete() {
                self.stats.actions += 1;
            }
        }

        if self.dwell.has_candidate()
            && self.dwell.progress() > 0.0
            && now - self.last_progress_log >= PROGRESS_LOG_INTERVAL
        {
            log::debug!("Dwell progress {:.0}%", self.dwell.progress() * 100.0);
            self.last_progress_log = now;
        }

        actions
    }

    /// Pull events from `source` until it closes or `shutdown` is set
    pub async fn run<S>(&mut self, source: &mut S, shutdown: &AtomicBool) -> Result<(), CortexError>
    where
        S: LandmarkSource + ?Sized,
    {
        let interval = Duration::from_millis(self.config.runtime.frame_interval_ms);
        log::info!(
            "Engine loop started ({} ms frame interval)",
            self.config.runtime.frame_interval_ms
        );

        while !shutdown.load(Ordering::Relaxed) {
            match source.next_event().await? {
                SourceEvent::Frame(frame) => {
                    self.step(Some(&frame), frame.timestamp);
                }
                SourceEvent::NoFace { timestamp } => {
                    self.step(None, timestamp);
                }
                SourceEvent::Switched { source } => self.source_changed(source),
                SourceEvent::Pending => {}
                SourceEvent::Closed => {
                    log::info!("Landmark source closed");
                    break;
                }
            }
            if !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
        }

        log::info!("Engine stopped: {:?}", self.stats);
        Ok(())
    }
}
