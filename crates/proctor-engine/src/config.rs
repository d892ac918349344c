//! Detection thresholds and sensitivity presets

use serde::{Deserialize, Serialize};

/// Detection sensitivity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    /// High-stakes exams
    Strict,
    /// Interviews
    #[default]
    Moderate,
    /// Casual monitoring
    Lenient,
}

/// Thresholds for the cheating-suspicion engine.
///
/// Immutable per detector instance: switching modes constructs a fresh value
/// and swaps it in, so no two sessions ever share mutable configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Away time before the soft warning level (seconds)
    pub suspicious_gaze_threshold: f64,

    /// Away time before a cheating alert fires (seconds)
    pub cheating_gaze_threshold: f64,

    /// Minimum interval between fired alerts (seconds)
    pub alert_cooldown: f64,

    /// Pitch beyond which the subject is looking down, e.g. at notes (radians)
    pub downward_gaze_angle: f64,

    /// |yaw| beyond which the subject is looking aside, e.g. at another
    /// screen (radians)
    pub side_gaze_angle: f64,

    /// Head-movement magnitude counted as a significant turn (radians)
    pub head_movement_threshold: f64,

    /// Downward looks tolerated before the pattern alert
    pub max_downward_looks: u32,

    /// Side looks tolerated before the pattern alert
    pub max_side_looks: u32,

    /// Head turns tolerated before the pattern alert
    pub max_head_turns: u32,

    /// Suspicion score ceiling
    pub max_suspicion_score: f64,

    /// Score beyond which a high-suspicion alert fires
    pub high_suspicion_threshold: f64,

    /// Base score increase per away frame
    pub looking_away_penalty: f64,

    /// Extra increase when looking down
    pub downward_look_penalty: f64,

    /// Extra increase when looking far to the side
    pub side_look_penalty: f64,

    /// Increase for rapid head movement
    pub head_movement_penalty: f64,

    /// Delta multiplier once the away duration passes the suspicious
    /// threshold
    pub duration_multiplier: f64,

    /// Score decrease per attentive frame (negative)
    pub recovery_rate: f64,

    /// Gaze confidence below which a frame is ignored entirely
    pub min_confidence: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            suspicious_gaze_threshold: 3.0,
            cheating_gaze_threshold: 5.0,
            alert_cooldown: 10.0,
            downward_gaze_angle: 0.3,
            side_gaze_angle: 0.5,
            head_movement_threshold: 0.4,
            max_downward_looks: 10,
            max_side_looks: 8,
            max_head_turns: 15,
            max_suspicion_score: 100.0,
            high_suspicion_threshold: 70.0,
            looking_away_penalty: 0.5,
            downward_look_penalty: 1.0,
            side_look_penalty: 1.5,
            head_movement_penalty: 2.0,
            duration_multiplier: 2.0,
            recovery_rate: -0.2,
            min_confidence: 0.3,
        }
    }
}

impl DetectionConfig {
    /// Strict thresholds for high-stakes exams
    pub fn strict() -> Self {
        Self {
            suspicious_gaze_threshold: 2.0,
            cheating_gaze_threshold: 3.0,
            max_downward_looks: 5,
            max_side_looks: 4,
            high_suspicion_threshold: 50.0,
            ..Default::default()
        }
    }

    /// Moderate thresholds for interviews (the default)
    pub fn moderate() -> Self {
        Self::default()
    }

    /// Lenient thresholds for casual monitoring
    pub fn lenient() -> Self {
        Self {
            suspicious_gaze_threshold: 5.0,
            cheating_gaze_threshold: 8.0,
            max_downward_looks: 15,
            max_side_looks: 12,
            high_suspicion_threshold: 80.0,
            ..Default::default()
        }
    }

    /// Construct the preset for a named mode
    pub fn for_mode(mode: DetectionMode) -> Self {
        match mode {
            DetectionMode::Strict => Self::strict(),
            DetectionMode::Moderate => Self::moderate(),
            DetectionMode::Lenient => Self::lenient(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_tightens_thresholds() {
        let strict = DetectionConfig::strict();
        let moderate = DetectionConfig::moderate();

        assert!(strict.cheating_gaze_threshold < moderate.cheating_gaze_threshold);
        assert!(strict.max_downward_looks < moderate.max_downward_looks);
        assert!(strict.high_suspicion_threshold < moderate.high_suspicion_threshold);
        // Angle thresholds and penalties stay at the defaults
        assert_eq!(strict.downward_gaze_angle, moderate.downward_gaze_angle);
        assert_eq!(strict.looking_away_penalty, moderate.looking_away_penalty);
    }

    #[test]
    fn test_lenient_loosens_thresholds() {
        let lenient = DetectionConfig::lenient();
        let moderate = DetectionConfig::moderate();

        assert!(lenient.cheating_gaze_threshold > moderate.cheating_gaze_threshold);
        assert!(lenient.max_side_looks > moderate.max_side_looks);
        assert!(lenient.high_suspicion_threshold > moderate.high_suspicion_threshold);
    }

    #[test]
    fn test_for_mode_matches_presets() {
        assert_eq!(
            DetectionConfig::for_mode(DetectionMode::Moderate),
            DetectionConfig::default()
        );
        assert_eq!(
            DetectionConfig::for_mode(DetectionMode::Strict),
            DetectionConfig::strict()
        );
        assert_eq!(
            DetectionConfig::for_mode(DetectionMode::Lenient),
            DetectionConfig::lenient()
        );
    }
}
