//! # EyeOS Cortex
//!
//! Hands-free input engine. Face landmarks from an external tracker drive the
//! cursor, dwell clicks, blink and mouth clicks and three scroll modes; a foot
//! pedal adds taps and drags. Every gesture ends up as an [`Action`] handed to
//! an [`Effector`] that injects it into the OS.
//!
//! The frame loop lives in [`Engine`]; pedal input runs on its own thread via
//! [`PedalRunner`]. The two only share the [`GestureToggles`] flags and the OS
//! input layer.

pub mod config;
pub mod effector;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod landmarks;
pub mod pedal_runner;
pub mod smoothing;
pub mod source;
pub mod toggles;
pub mod types;

pub use config::EngineConfig;
pub use effector::{dispatch, Effector, LogEffector, RecordingEffector, SharedEffector};
pub use engine::{Engine, EngineStats};
pub use error::CortexError;
pub use pedal_runner::{PedalDriver, PedalRunner, PedalSignal};
pub use source::{LandmarkSource, ScriptedSource, SourceEvent, UdpSource};
pub use toggles::{GestureFamily, GestureToggles};
pub use types::*;

#[cfg(feature = "input")]
pub use effector::EnigoEffector;
