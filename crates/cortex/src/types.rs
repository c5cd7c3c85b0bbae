//! Core data types for the Cortex engine

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A landmark in normalized image space (0.0-1.0 on both axes)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: &Point2) -> Point2 {
        Point2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// One camera frame worth of face landmarks.
///
/// Produced by the external landmark extractor and never mutated once handed
/// to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Fixed-index face mesh points
    pub points: Vec<Point2>,
    /// Monotonic timestamp in seconds
    pub timestamp: f64,
    /// Camera the frame came from. A change forces a full engine reset.
    #[serde(default)]
    pub source: u32,
}

/// Scalar signals derived from a single frame.
///
/// `None` means "no evidence this frame" for that signal.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FaceFeatures {
    /// Midpoint of both iris centres, raw normalized image space
    pub gaze: Option<Point2>,
    /// Eye aspect ratio, left eye
    pub ear_left: Option<f64>,
    /// Eye aspect ratio, right eye
    pub ear_right: Option<f64>,
    /// Inner-lip gap over mouth width
    pub mouth_open: Option<f64>,
    /// Mouth width over eye span; drops when the lips pucker
    pub mouth_width: Option<f64>,
    /// Brow-to-lid distance over eye span
    pub brow_height: Option<f64>,
}

/// Mouse buttons the effector understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
        }
    }
}

/// Scroll direction selected by a scroll classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    /// Signed scroll amount; positive scrolls up
    pub fn signed(self, amount: i32) -> i32 {
        match self {
            Self::Up => amount,
            Self::Down => -amount,
        }
    }
}

/// A discrete input action handed to the effector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    MoveCursor { x: i32, y: i32 },
    Click { button: MouseButton, count: u8 },
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
    /// Positive scrolls up, negative scrolls down
    Scroll(i32),
}

impl Action {
    pub const fn left_click() -> Self {
        Action::Click {
            button: MouseButton::Left,
            count: 1,
        }
    }

    pub const fn right_click() -> Self {
        Action::Click {
            button: MouseButton::Right,
            count: 1,
        }
    }

    pub const fn double_click() -> Self {
        Action::Click {
            button: MouseButton::Left,
            count: 2,
        }
    }

    /// Whether this is a discrete gesture result rather than cursor motion
    pub fn is_discrete(&self) -> bool {
        !matches!(self, Action::MoveCursor { .. })
    }
}

/// Tap count classified from pedal releases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TapKind {
    Single,
    Double,
    Triple,
}

impl TapKind {
    pub fn action(self) -> Action {
        match self {
            Self::Single => Action::left_click(),
            Self::Double => Action::right_click(),
            Self::Triple => Action::double_click(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Double => "double",
            Self::Triple => "triple",
        }
    }
}

/// Monotonic seconds since the clock was created.
///
/// Copies share the same origin, so the UDP listener, the engine and the
/// pedal thread agree on time.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
