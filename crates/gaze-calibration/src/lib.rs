//! Per-session gaze calibration
//!
//! Raw head-pose angles are not directly comparable to a fixed "looking at
//! screen" zero: camera angle, face shape, and seating position all shift
//! the effective neutral pose. The calibrator learns a subject-specific
//! baseline over a short adaptation window, then converts raw angles into
//! baseline-relative, confidence-scored gaze. The baseline is frozen once
//! established so sustained looking-away behavior cannot corrupt it.

pub mod calibrator;
pub mod projection;
pub mod smoothing;

pub use calibrator::{
    CalibratedGaze, CalibratorConfig, EyeBaseline, FaceBaseline, GazeCalibrator, HeadPoseBaseline,
};
pub use projection::{project_gaze, Quadrant};
pub use smoothing::{GazeSmoothing, SmoothedGaze};
