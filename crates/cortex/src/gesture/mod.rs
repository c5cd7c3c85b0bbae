//! Gesture classifiers
//!
//! Every classifier owns its state, takes explicit timestamps and returns at
//! most one [`Action`](crate::types::Action) per update. `reset()` drops all
//! transient state without emitting and is idempotent.

pub mod blink;
pub mod cursor;
pub mod dwell;
pub mod eyebrow;
pub mod lip;
pub mod lip_eyebrow;
pub mod mouth;
pub mod pedal;

pub use blink::BlinkDetector;
pub use cursor::{normalize_gaze, CursorMapper};
pub use dwell::DwellClicker;
pub use eyebrow::{BrowSignal, EyebrowScroller};
pub use lip::{LipScroller, PuckerToggle};
pub use lip_eyebrow::LipEyebrowScroller;
pub use mouth::MouthClicker;
pub use pedal::{HoldTimer, PedalClassifier};
