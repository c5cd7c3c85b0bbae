//! Enable flags shared between the engine, the pedal thread and the binary.
//!
//! Flags are relaxed atomics, so a reader may see a change one frame late.
//! The owner of each classifier reconciles on its next step and resets
//! whatever turned off.

use crate::config::ModesConfig;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureFamily {
    Dwell,
    Blink,
    Mouth,
    Eyebrow,
    Lip,
    LipEyebrow,
    Pedal,
}

impl GestureFamily {
    pub const ALL: [GestureFamily; 7] = [
        GestureFamily::Dwell,
        GestureFamily::Blink,
        GestureFamily::Mouth,
        GestureFamily::Eyebrow,
        GestureFamily::Lip,
        GestureFamily::LipEyebrow,
        GestureFamily::Pedal,
    ];

    /// Families that may not be enabled together with this one
    pub fn conflicts(self) -> &'static [GestureFamily] {
        use GestureFamily::*;
        match self {
            Blink => &[Mouth],
            Mouth => &[Blink],
            Eyebrow => &[Lip, LipEyebrow],
            Lip => &[Eyebrow, LipEyebrow],
            LipEyebrow => &[Eyebrow, Lip],
            Dwell | Pedal => &[],
        }
    }

    /// Accepts the config names plus the short forms `eyebrow`, `lip` and `lip_eyebrow`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dwell" => Some(Self::Dwell),
            "blink" => Some(Self::Blink),
            "mouth" => Some(Self::Mouth),
            "eyebrow" | "eyebrow_scroll" => Some(Self::Eyebrow),
            "lip" | "lip_scroll" => Some(Self::Lip),
            "lip_eyebrow" | "lip_eyebrow_scroll" => Some(Self::LipEyebrow),
            "pedal" => Some(Self::Pedal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dwell => "dwell",
            Self::Blink => "blink",
            Self::Mouth => "mouth",
            Self::Eyebrow => "eyebrow_scroll",
            Self::Lip => "lip_scroll",
            Self::LipEyebrow => "lip_eyebrow_scroll",
            Self::Pedal => "pedal",
        }
    }
}

/// Point-in-time copy of every flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleSnapshot {
    pub tracking: bool,
    flags: [bool; 7],
    /// Bumped every time a family goes from on to off
    disables: [u64; 7],
    pauses: u64,
}

impl ToggleSnapshot {
    pub fn enabled(&self, family: GestureFamily) -> bool {
        self.flags[family as usize]
    }

    /// Enabled and tracking not paused
    pub fn live(&self, family: GestureFamily) -> bool {
        self.tracking && self.enabled(family)
    }

    /// Whether `family` was switched off at any point after `earlier`
    pub fn disabled_since(&self, earlier: &ToggleSnapshot, family: GestureFamily) -> bool {
        self.disables[family as usize] != earlier.disables[family as usize]
    }

    /// Whether tracking was paused at any point after `earlier`
    pub fn paused_since(&self, earlier: &ToggleSnapshot) -> bool {
        self.pauses != earlier.pauses
    }
}

#[derive(Debug)]
pub struct GestureToggles {
    tracking: AtomicBool,
    flags: [AtomicBool; 7],
    disables: [AtomicU64; 7],
    pauses: AtomicU64,
}

impl GestureToggles {
    pub fn from_config(modes: &ModesConfig) -> Self {
        let toggles = Self {
            tracking: AtomicBool::new(true),
            flags: Default::default(),
            disables: Default::default(),
            pauses: AtomicU64::new(0),
        };
        // Apply in a fixed order so conflicting config resolves predictably
        let requested = [
            (GestureFamily::Dwell, modes.dwell),
            (GestureFamily::Blink, modes.blink),
            (GestureFamily::Mouth, modes.mouth),
            (GestureFamily::Eyebrow, modes.eyebrow_scroll),
            (GestureFamily::Lip, modes.lip_scroll),
            (GestureFamily::LipEyebrow, modes.lip_eyebrow_scroll),
            (GestureFamily::Pedal, modes.pedal),
        ];
        for (family, on) in requested {
            if on {
                toggles.set_enabled(family, true);
            }
        }
        toggles
    }

    pub fn is_enabled(&self, family: GestureFamily) -> bool {
        self.flags[family as usize].load(Ordering::Relaxed)
    }

    fn turn_off(&self, family: GestureFamily) -> bool {
        let was_on = self.flags[family as usize].swap(false, Ordering::Relaxed);
        if was_on {
            self.disables[family as usize].fetch_add(1, Ordering::Relaxed);
        }
        was_on
    }

    /// Enable or disable a family. Enabling turns its conflicts off.
    pub fn set_enabled(&self, family: GestureFamily, on: bool) {
        if !on {
            if self.turn_off(family) {
                log::info!("{} disabled", family.as_str());
            }
            return;
        }
        for &other in family.conflicts() {
            if self.turn_off(other) {
                log::info!("{} disabled in favour of {}", other.as_str(), family.as_str());
            }
        }
        if !self.flags[family as usize].swap(true, Ordering::Relaxed) {
            log::info!("{} enabled", family.as_str());
        }
    }

    pub fn toggle(&self, family: GestureFamily) -> bool {
        let on = !self.is_enabled(family);
        self.set_enabled(family, on);
        on
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.load(Ordering::Relaxed)
    }

    pub fn set_tracking(&self, on: bool) {
        let was_on = self.tracking.swap(on, Ordering::Relaxed);
        if was_on && !on {
            self.pauses.fetch_add(1, Ordering::Relaxed);
        }
        if was_on != on {
            log::info!("Tracking {}", if on { "resumed" } else { "paused" });
        }
    }

    pub fn snapshot(&self) -> ToggleSnapshot {
        let mut flags = [false; 7];
        let mut disables = [0; 7];
        for family in GestureFamily::ALL {
            flags[family as usize] = self.is_enabled(family);
            disables[family as usize] = self.disables[family as usize].load(Ordering::Relaxed);
        }
        ToggleSnapshot {
            tracking: self.is_tracking(),
            flags,
            disables,
            pauses: self.pauses.load(Ordering::Relaxed),
        }
    }
}

impl Default for GestureToggles {
    fn default() -> Self {
        Self::from_config(&ModesConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_dwell_and_pedal() {
        let t = GestureToggles::default();
        let snap = t.snapshot();
        assert!(snap.live(GestureFamily::Dwell));
        assert!(snap.live(GestureFamily::Pedal));
        assert!(!snap.enabled(GestureFamily::Blink));
    }

    #[test]
    fn test_only_one_scroll_mode_at_a_time() {
        let t = GestureToggles::default();
        t.set_enabled(GestureFamily::Lip, true);
        t.set_enabled(GestureFamily::LipEyebrow, true);
        assert!(!t.is_enabled(GestureFamily::Lip));
        assert!(t.is_enabled(GestureFamily::LipEyebrow));
        t.set_enabled(GestureFamily::Eyebrow, true);
        assert!(!t.is_enabled(GestureFamily::LipEyebrow));
    }

    #[test]
    fn test_blink_and_mouth_exclusive() {
        let t = GestureToggles::default();
        t.set_enabled(GestureFamily::Blink, true);
        assert!(t.toggle(GestureFamily::Mouth));
        assert!(!t.is_enabled(GestureFamily::Blink));
        // Disabling never re-enables the other side
        t.set_enabled(GestureFamily::Mouth, false);
        assert!(!t.is_enabled(GestureFamily::Blink));
    }

    #[test]
    fn test_conflicting_config_resolves_to_last() {
        let modes = ModesConfig {
            blink: true,
            mouth: true,
            eyebrow_scroll: true,
            lip_scroll: true,
            ..Default::default()
        };
        let t = GestureToggles::from_config(&modes);
        assert!(t.is_enabled(GestureFamily::Mouth));
        assert!(!t.is_enabled(GestureFamily::Blink));
        assert!(t.is_enabled(GestureFamily::Lip));
        assert!(!t.is_enabled(GestureFamily::Eyebrow));
    }

    #[test]
    fn test_quick_off_on_is_still_seen() {
        let t = GestureToggles::default();
        let before = t.snapshot();
        t.set_enabled(GestureFamily::Dwell, false);
        t.set_enabled(GestureFamily::Dwell, true);
        let after = t.snapshot();
        assert!(after.live(GestureFamily::Dwell));
        assert!(after.disabled_since(&before, GestureFamily::Dwell));
        assert!(!after.disabled_since(&before, GestureFamily::Pedal));
    }

    #[test]
    fn test_pause_masks_live_flags() {
        let t = GestureToggles::default();
        let before = t.snapshot();
        t.set_tracking(false);
        let snap = t.snapshot();
        assert!(snap.enabled(GestureFamily::Dwell));
        assert!(!snap.live(GestureFamily::Dwell));
        assert!(snap.paused_since(&before));
        // Resuming is not another pause
        t.set_tracking(true);
        assert!(!t.snapshot().paused_since(&snap));
    }
}
