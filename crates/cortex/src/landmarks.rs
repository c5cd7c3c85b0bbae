//! Face-mesh feature extraction
//!
//! Turns a raw landmark frame into the handful of scalar signals the gesture
//! classifiers consume. Indices follow the refined 478-point face mesh.
//! Anything that cannot be computed (short frame, zero-length denominator)
//! comes back as `None` instead of a NaN.

use crate::types::{FaceFeatures, LandmarkFrame, Point2};

/// p1..p6 for the left eye aspect ratio
pub const LEFT_EYE: [usize; 6] = [33, 160, 158, 133, 153, 144];
/// p1..p6 for the right eye aspect ratio
pub const RIGHT_EYE: [usize; 6] = [362, 385, 387, 263, 373, 380];

pub const LEFT_IRIS: usize = 473;
pub const RIGHT_IRIS: usize = 468;

pub const UPPER_INNER_LIP: usize = 13;
pub const LOWER_INNER_LIP: usize = 14;
pub const MOUTH_LEFT: usize = 61;
pub const MOUTH_RIGHT: usize = 291;

pub const LEFT_BROW: usize = 105;
pub const RIGHT_BROW: usize = 334;
pub const LEFT_UPPER_LID: usize = 159;
pub const RIGHT_UPPER_LID: usize = 386;

/// Outer eye corners; their distance is the face scale
pub const LEFT_EYE_OUTER: usize = 33;
pub const RIGHT_EYE_OUTER: usize = 263;

/// Points in a refined face mesh
pub const MESH_POINTS: usize = 478;

const MIN_SPAN: f64 = 1e-6;

/// Extract every feature the engine uses from one frame
pub fn extract(frame: &LandmarkFrame) -> FaceFeatures {
    let pts = frame.points.as_slice();
    FaceFeatures {
        gaze: gaze(pts),
        ear_left: eye_aspect_ratio(pts, &LEFT_EYE),
        ear_right: eye_aspect_ratio(pts, &RIGHT_EYE),
        mouth_open: mouth_open_ratio(pts),
        mouth_width: mouth_width_ratio(pts),
        brow_height: brow_height(pts),
    }
}

fn point(pts: &[Point2], idx: usize) -> Option<Point2> {
    pts.get(idx).copied()
}

fn dist(pts: &[Point2], a: usize, b: usize) -> Option<f64> {
    Some(point(pts, a)?.distance(&point(pts, b)?))
}

fn ratio(num: f64, den: f64) -> Option<f64> {
    if den <= MIN_SPAN || !num.is_finite() || !den.is_finite() {
        return None;
    }
    Some(num / den)
}

/// Mean of the two vertical lid distances over the horizontal eye width
pub fn eye_aspect_ratio(pts: &[Point2], idx: &[usize; 6]) -> Option<f64> {
    let [p1, p2, p3, p4, p5, p6] = *idx;
    let v1 = dist(pts, p2, p6)?;
    let v2 = dist(pts, p3, p5)?;
    let h = dist(pts, p1, p4)?;
    ratio(v1 + v2, 2.0 * h)
}

pub fn gaze(pts: &[Point2]) -> Option<Point2> {
    let left = point(pts, LEFT_IRIS)?;
    let right = point(pts, RIGHT_IRIS)?;
    Some(left.midpoint(&right))
}

fn eye_span(pts: &[Point2]) -> Option<f64> {
    dist(pts, LEFT_EYE_OUTER, RIGHT_EYE_OUTER)
}

pub fn mouth_open_ratio(pts: &[Point2]) -> Option<f64> {
    let gap = dist(pts, UPPER_INNER_LIP, LOWER_INNER_LIP)?;
    let width = dist(pts, MOUTH_LEFT, MOUTH_RIGHT)?;
    ratio(gap, width)
}

pub fn mouth_width_ratio(pts: &[Point2]) -> Option<f64> {
    let width = dist(pts, MOUTH_LEFT, MOUTH_RIGHT)?;
    ratio(width, eye_span(pts)?)
}

pub fn brow_height(pts: &[Point2]) -> Option<f64> {
    let left = dist(pts, LEFT_BROW, LEFT_UPPER_LID)?;
    let right = dist(pts, RIGHT_BROW, RIGHT_UPPER_LID)?;
    ratio((left + right) / 2.0, eye_span(pts)?)
}

/// Builds a landmark frame whose extracted features equal the requested values.
///
/// Used by the scripted replay demo, benchmarks and tests; it only places the
/// points the extractor reads and parks the rest at the image centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticFace {
    pub gaze: Point2,
    pub ear_left: f64,
    pub ear_right: f64,
    pub mouth_open: f64,
    pub mouth_width: f64,
    pub brow_height: f64,
}

impl Default for SyntheticFace {
    fn default() -> Self {
        Self {
            gaze: Point2::new(0.5, 0.5),
            ear_left: 0.30,
            ear_right: 0.30,
            mouth_open: 0.05,
            mouth_width: 0.55,
            brow_height: 0.25,
        }
    }
}

impl SyntheticFace {
    const SPAN: f64 = 0.2;
    const EYE_Y: f64 = 0.4;
    const EYE_W: f64 = 0.06;
    const LID_Y: f64 = 0.39;
    const MOUTH_Y: f64 = 0.7;

    pub fn to_frame(&self, timestamp: f64) -> LandmarkFrame {
        let mut pts = vec![Point2::new(0.5, 0.5); MESH_POINTS];
        let mut set = |idx: usize, x: f64, y: f64| pts[idx] = Point2::new(x, y);

        // Eye corners define the span: 33 at 0.4, 263 at 0.6
        let y = Self::EYE_Y;
        let hl = self.ear_left * Self::EYE_W / 2.0;
        set(33, 0.40, y);
        set(133, 0.46, y);
        set(160, 0.42, y - hl);
        set(144, 0.42, y + hl);
        set(158, 0.44, y - hl);
        set(153, 0.44, y + hl);

        let hr = self.ear_right * Self::EYE_W / 2.0;
        set(362, 0.54, y);
        set(263, 0.60, y);
        set(385, 0.56, y - hr);
        set(380, 0.56, y + hr);
        set(387, 0.58, y - hr);
        set(373, 0.58, y + hr);

        let brow_dy = self.brow_height * Self::SPAN;
        set(LEFT_UPPER_LID, 0.43, Self::LID_Y);
        set(RIGHT_UPPER_LID, 0.57, Self::LID_Y);
        set(LEFT_BROW, 0.43, Self::LID_Y - brow_dy);
        set(RIGHT_BROW, 0.57, Self::LID_Y - brow_dy);

        set(LEFT_IRIS, self.gaze.x, self.gaze.y);
        set(RIGHT_IRIS, self.gaze.x, self.gaze.y);

        let half_w = self.mouth_width * Self::SPAN / 2.0;
        set(MOUTH_LEFT, 0.5 - half_w, Self::MOUTH_Y);
        set(MOUTH_RIGHT, 0.5 + half_w, Self::MOUTH_Y);
        let half_gap = self.mouth_open * half_w;
        set(UPPER_INNER_LIP, 0.5, Self::MOUTH_Y - half_gap);
        set(LOWER_INNER_LIP, 0.5, Self::MOUTH_Y + half_gap);

        LandmarkFrame {
            points: pts,
            timestamp,
            source: 0,
        }
    }
}
