//! Face observation types and facial-structure measurements
//!
//! Input boundary of the proctoring pipeline: one `RawFaceObservation` per
//! detected face per frame, supplied by the external gaze detector. The
//! `FacialStructure` derived here feeds gaze calibration and detection.

use serde::{Deserialize, Serialize};

/// Minimum landmarks needed to locate both eyes and the nose
pub const MIN_LANDMARKS: usize = 5;

/// A 2-D point in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    /// Midpoint between this point and another
    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// One detected face in one frame, as returned by the external detector.
///
/// Landmarks follow the detector's conventional order: left eye, right eye,
/// nose tip, then two mouth points. Yaw and pitch are in radians with 0 =
/// facing the camera (positive yaw = right, positive pitch = down).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFaceObservation {
    /// Face center (pixels)
    pub center: Point,
    /// Face bounding-box width (pixels)
    pub width: f64,
    /// Face bounding-box height (pixels)
    pub height: f64,
    /// Ordered landmark points
    pub landmarks: Vec<Point>,
    /// Raw head yaw (radians)
    pub yaw: f64,
    /// Raw head pitch (radians)
    pub pitch: f64,
}

/// Facial-geometry measurements derived from one observation.
///
/// Recomputed every frame; only its aggregate statistics are retained, by
/// the calibration accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FacialStructure {
    pub face_width: f64,
    pub face_height: f64,
    /// Distance between the two eye landmarks (pixels)
    pub eye_distance: f64,
    /// Midpoint of the two eye landmarks
    pub eye_center: Point,
    pub left_eye: Point,
    pub right_eye: Point,
    pub nose_tip: Point,
}

impl FacialStructure {
    /// Derive measurements from a detected face.
    ///
    /// Returns `None` when fewer than [`MIN_LANDMARKS`] landmarks are
    /// present; the frame is then treated as "no detection" upstream.
    pub fn from_observation(face: &RawFaceObservation) -> Option<Self> {
        if face.landmarks.len() < MIN_LANDMARKS {
            return None;
        }

        let left_eye = face.landmarks[0];
        let right_eye = face.landmarks[1];
        let nose_tip = face.landmarks[2];

        Some(Self {
            face_width: face.width,
            face_height: face.height,
            eye_distance: left_eye.distance(&right_eye),
            eye_center: left_eye.midpoint(&right_eye),
            left_eye,
            right_eye,
            nose_tip,
        })
    }
}
