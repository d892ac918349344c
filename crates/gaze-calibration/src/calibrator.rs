//! Baseline learning and calibrated-gaze prediction

use std::f64::consts::PI;

use face_geometry::{FacialStructure, RawFaceObservation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Calibrated yaw is clamped to this magnitude (radians)
pub const MAX_CALIBRATED_YAW: f64 = PI / 2.0;

/// Calibrated pitch is clamped to this magnitude (radians)
pub const MAX_CALIBRATED_PITCH: f64 = PI / 3.0;

/// Calibrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibratorConfig {
    /// Frames to accumulate before the baseline is established
    pub adaptation_frames: usize,

    /// Combined face width+height deviation (pixels) at which the size
    /// consistency score reaches zero
    pub size_tolerance_px: f64,

    /// Eye-distance deviation (pixels) at which the eye consistency score
    /// reaches zero
    pub eye_tolerance_px: f64,
}

impl Default for CalibratorConfig {
    fn default() -> Self {
        Self {
            adaptation_frames: 30,
            size_tolerance_px: 200.0,
            eye_tolerance_px: 50.0,
        }
    }
}

/// Mean/std of face dimensions over the adaptation window
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FaceBaseline {
    pub width: f64,
    pub height: f64,
    pub width_std: f64,
    pub height_std: f64,
}

/// Mean/std of eye distance over the adaptation window
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EyeBaseline {
    pub distance: f64,
    pub distance_std: f64,
}

/// The subject's neutral head pose over the adaptation window
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HeadPoseBaseline {
    pub yaw: f64,
    pub pitch: f64,
    pub yaw_std: f64,
    pub pitch_std: f64,
}

/// Baseline-relative gaze for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibratedGaze {
    /// Calibrated yaw (radians), clamped to ±π/2
    pub yaw: f64,
    /// Calibrated pitch (radians), clamped to ±π/3
    pub pitch: f64,
    pub raw_yaw: f64,
    pub raw_pitch: f64,
    /// Prediction confidence in [0, 1]
    pub confidence: f64,
}

/// Samples accumulated during (and after) the adaptation window.
///
/// Appending continues after calibration but baselines are never recomputed;
/// the baseline is frozen at the adaptation-window boundary.
#[derive(Debug, Default)]
struct CalibrationSamples {
    face_dimensions: Vec<(f64, f64)>,
    eye_distances: Vec<f64>,
    head_poses: Vec<(f64, f64)>,
}

/// Per-session gaze calibrator.
///
/// Two states, Uncalibrated and Calibrated, transitioning exactly once when
/// the adaptation window fills.
pub struct GazeCalibrator {
    config: CalibratorConfig,
    samples: CalibrationSamples,
    frame_count: usize,
    face_baseline: Option<FaceBaseline>,
    eye_baseline: Option<EyeBaseline>,
    head_pose_baseline: Option<HeadPoseBaseline>,
}

impl GazeCalibrator {
    /// Create a calibrator with the given configuration
    pub fn new(config: CalibratorConfig) -> Self {
        Self {
            config,
            samples: CalibrationSamples::default(),
            frame_count: 0,
            face_baseline: None,
            eye_baseline: None,
            head_pose_baseline: None,
        }
    }

    /// Accumulate one frame of baseline measurements.
    ///
    /// No-op when `structure` is absent. Returns true only on the frame the
    /// adaptation window fills and the baseline is established.
    pub fn update_baseline(
        &mut self,
        observation: &RawFaceObservation,
        structure: Option<&FacialStructure>,
    ) -> bool {
        let Some(structure) = structure else {
            return false;
        };

        self.samples
            .face_dimensions
            .push((structure.face_width, structure.face_height));
        self.samples.eye_distances.push(structure.eye_distance);
        self.samples
            .head_poses
            .push((observation.yaw, observation.pitch));
        self.frame_count += 1;

        if self.frame_count == self.config.adaptation_frames {
            self.establish_baseline();
            return true;
        }
        false
    }

    fn establish_baseline(&mut self) {
        let widths: Vec<f64> = self.samples.face_dimensions.iter().map(|d| d.0).collect();
        let heights: Vec<f64> = self.samples.face_dimensions.iter().map(|d| d.1).collect();
        let (width, width_std) = mean_std(&widths);
        let (height, height_std) = mean_std(&heights);
        self.face_baseline = Some(FaceBaseline {
            width,
            height,
            width_std,
            height_std,
        });

        let (distance, distance_std) = mean_std(&self.samples.eye_distances);
        self.eye_baseline = Some(EyeBaseline {
            distance,
            distance_std,
        });

        let yaws: Vec<f64> = self.samples.head_poses.iter().map(|p| p.0).collect();
        let pitches: Vec<f64> = self.samples.head_poses.iter().map(|p| p.1).collect();
        let (yaw, yaw_std) = mean_std(&yaws);
        let (pitch, pitch_std) = mean_std(&pitches);
        self.head_pose_baseline = Some(HeadPoseBaseline {
            yaw,
            pitch,
            yaw_std,
            pitch_std,
        });

        info!(
            frames = self.frame_count,
            neutral_yaw = yaw,
            neutral_pitch = pitch,
            "gaze baseline established"
        );
    }

    /// True iff all three baselines are populated
    pub fn is_calibrated(&self) -> bool {
        self.face_baseline.is_some()
            && self.eye_baseline.is_some()
            && self.head_pose_baseline.is_some()
    }

    /// Predict baseline-relative gaze for one frame.
    ///
    /// `None` until the adaptation window completes. Head-pose offsets are
    /// scaled by the face-size ratio so that a subject leaning toward or
    /// away from the camera keeps comparable angles.
    pub fn predict(
        &self,
        observation: &RawFaceObservation,
        structure: &FacialStructure,
    ) -> Option<CalibratedGaze> {
        if !self.is_calibrated() {
            return None;
        }
        let face = self.face_baseline.as_ref()?;
        let pose = self.head_pose_baseline.as_ref()?;

        let head_yaw_offset = observation.yaw - pose.yaw;
        let head_pitch_offset = observation.pitch - pose.pitch;

        let face_scale_x = structure.face_width / face.width;
        let face_scale_y = structure.face_height / face.height;

        let yaw = (head_yaw_offset * face_scale_x).clamp(-MAX_CALIBRATED_YAW, MAX_CALIBRATED_YAW);
        let pitch =
            (head_pitch_offset * face_scale_y).clamp(-MAX_CALIBRATED_PITCH, MAX_CALIBRATED_PITCH);

        let confidence = self.confidence(structure);
        debug!(yaw, pitch, confidence, "calibrated gaze predicted");

        Some(CalibratedGaze {
            yaw,
            pitch,
            raw_yaw: observation.yaw,
            raw_pitch: observation.pitch,
            confidence,
        })
    }

    /// Consistency of the current frame's measurements with the baseline:
    /// the mean of face-size and eye-distance consistency, each in [0, 1].
    fn confidence(&self, structure: &FacialStructure) -> f64 {
        let (Some(face), Some(eye)) = (self.face_baseline.as_ref(), self.eye_baseline.as_ref())
        else {
            return 0.0;
        };

        let width_diff = (structure.face_width - face.width).abs();
        let height_diff = (structure.face_height - face.height).abs();
        let size_consistency =
            1.0 - f64::min(1.0, (width_diff + height_diff) / self.config.size_tolerance_px);

        let eye_diff = (structure.eye_distance - eye.distance).abs();
        let eye_consistency = 1.0 - f64::min(1.0, eye_diff / self.config.eye_tolerance_px);

        (size_consistency + eye_consistency) / 2.0
    }

    /// Frames accumulated so far (keeps counting after calibration)
    pub fn samples_collected(&self) -> usize {
        self.frame_count
    }

    pub fn face_baseline(&self) -> Option<&FaceBaseline> {
        self.face_baseline.as_ref()
    }

    pub fn eye_baseline(&self) -> Option<&EyeBaseline> {
        self.eye_baseline.as_ref()
    }

    pub fn head_pose_baseline(&self) -> Option<&HeadPoseBaseline> {
        self.head_pose_baseline.as_ref()
    }
}

impl Default for GazeCalibrator {
    fn default() -> Self {
        Self::new(CalibratorConfig::default())
    }
}

/// Mean and population standard deviation
fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use face_geometry::Point;

    fn observation(yaw: f64, pitch: f64, width: f64, height: f64) -> RawFaceObservation {
        let cx = 320.0;
        let cy = 240.0;
        RawFaceObservation {
            center: Point::new(cx, cy),
            width,
            height,
            landmarks: vec![
                Point::new(cx - width * 0.2, cy - 20.0),
                Point::new(cx + width * 0.2, cy - 20.0),
                Point::new(cx, cy + 30.0),
                Point::new(cx - 20.0, cy + 50.0),
                Point::new(cx + 20.0, cy + 50.0),
            ],
            yaw,
            pitch,
        }
    }

    fn feed_neutral(calibrator: &mut GazeCalibrator, frames: usize) {
        for _ in 0..frames {
            let obs = observation(0.1, -0.05, 150.0, 200.0);
            let structure = FacialStructure::from_observation(&obs).unwrap();
            calibrator.update_baseline(&obs, Some(&structure));
        }
    }

    #[test]
    fn test_calibration_completes_exactly_at_threshold() {
        let mut calibrator = GazeCalibrator::default();
        let obs = observation(0.1, -0.05, 150.0, 200.0);
        let structure = FacialStructure::from_observation(&obs).unwrap();

        for frame in 1..=29 {
            let established = calibrator.update_baseline(&obs, Some(&structure));
            assert!(!established, "established early at frame {frame}");
            assert!(!calibrator.is_calibrated());
            assert!(calibrator.predict(&obs, &structure).is_none());
        }

        assert!(calibrator.update_baseline(&obs, Some(&structure)));
        assert!(calibrator.is_calibrated());

        // Later frames keep accumulating but never re-establish
        assert!(!calibrator.update_baseline(&obs, Some(&structure)));
        assert_eq!(calibrator.samples_collected(), 31);
        assert!(calibrator.is_calibrated());
    }

    #[test]
    fn test_absent_structure_is_noop() {
        let mut calibrator = GazeCalibrator::default();
        let obs = observation(0.0, 0.0, 150.0, 200.0);
        assert!(!calibrator.update_baseline(&obs, None));
        assert_eq!(calibrator.samples_collected(), 0);
    }

    #[test]
    fn test_neutral_pose_maps_to_zero() {
        let mut calibrator = GazeCalibrator::default();
        feed_neutral(&mut calibrator, 30);

        let obs = observation(0.1, -0.05, 150.0, 200.0);
        let structure = FacialStructure::from_observation(&obs).unwrap();
        let gaze = calibrator.predict(&obs, &structure).unwrap();

        assert!(gaze.yaw.abs() < 1e-9);
        assert!(gaze.pitch.abs() < 1e-9);
        assert_eq!(gaze.raw_yaw, 0.1);
        assert!((gaze.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_extreme_angles_are_clamped() {
        let mut calibrator = GazeCalibrator::default();
        feed_neutral(&mut calibrator, 30);

        let obs = observation(5.0, -4.0, 150.0, 200.0);
        let structure = FacialStructure::from_observation(&obs).unwrap();
        let gaze = calibrator.predict(&obs, &structure).unwrap();

        assert!((gaze.yaw - MAX_CALIBRATED_YAW).abs() < 1e-9);
        assert!((gaze.pitch + MAX_CALIBRATED_PITCH).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_degrades_with_size_deviation() {
        let mut calibrator = GazeCalibrator::default();
        feed_neutral(&mut calibrator, 30);

        // 50 px combined size deviation: size consistency 0.75
        let obs = observation(0.1, -0.05, 180.0, 220.0);
        let structure = FacialStructure::from_observation(&obs).unwrap();
        let gaze = calibrator.predict(&obs, &structure).unwrap();
        assert!(gaze.confidence < 1.0);
        assert!(gaze.confidence > 0.0);

        // Wildly different face: both consistency terms floor at zero
        let obs = observation(0.1, -0.05, 600.0, 800.0);
        let structure = FacialStructure::from_observation(&obs).unwrap();
        let gaze = calibrator.predict(&obs, &structure).unwrap();
        assert_eq!(gaze.confidence, 0.0);
    }

    #[test]
    fn test_mean_std_population() {
        let (mean, std) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((mean - 5.0).abs() < 1e-9);
        assert!((std - 2.0).abs() < 1e-9);
    }
}
