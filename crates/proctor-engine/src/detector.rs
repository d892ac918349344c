//! The session-scoped cheating-suspicion state machine

use std::collections::VecDeque;

use face_geometry::FacialStructure;
use gaze_calibration::CalibratedGaze;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::alerts::{AlertReason, CheatingAlert, PatternCounters};
use crate::config::{DetectionConfig, DetectionMode};
use crate::summary::{BehaviorReport, SessionSummary};

/// Recent head poses retained for velocity computation
const POSE_HISTORY_CAPACITY: usize = 50;

/// Recent off-screen flags retained
const OFF_SCREEN_HISTORY_CAPACITY: usize = 100;

/// Discrete alert level reported on every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    #[default]
    NoAlert,
    /// Soft warning: away longer than the suspicious threshold
    SuspiciousBehavior,
    CheatingDetected,
    /// Inside the post-alert cooldown window while an alert is still active
    OngoingAlert,
}

/// How a frame was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStatus {
    Analyzed,
    /// No calibrated gaze or facial structure this frame
    NoDetection,
    /// Confidence below the analysis gate; detector state untouched
    LowConfidence,
}

/// Per-frame detection output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub timestamp: f64,
    pub status: FrameStatus,
    pub alert_level: AlertLevel,
    pub is_looking_away: bool,
    pub suspicion_score: f64,
    pub total_alerts: usize,
    /// Length of the current away interval (seconds), 0 while attentive
    pub looking_away_duration: f64,
    /// Cumulative time spent in completed away intervals (seconds)
    pub total_away_time: f64,
    pub head_movement_velocity: f64,
    pub yaw: f64,
    pub pitch: f64,
    pub confidence: f64,
}

/// Session-scoped suspicion state machine.
///
/// Consumes calibrated gaze plus a caller-supplied timestamp each frame and
/// reports a discrete alert level. Timestamps must be strictly increasing;
/// the away-duration and cooldown logic assumes monotonic time. One
/// instance per session, fed from a single thread.
pub struct CheatingDetector {
    config: DetectionConfig,
    session_start: Option<f64>,
    last_timestamp: f64,
    looking_away_start: Option<f64>,
    total_looking_away_time: f64,
    pose_history: VecDeque<(f64, f64)>,
    off_screen_history: VecDeque<bool>,
    alert_active: bool,
    last_alert_time: Option<f64>,
    suspicion_score: f64,
    patterns: PatternCounters,
    alerts: Vec<CheatingAlert>,
}

impl CheatingDetector {
    /// Create a detector with the given thresholds
    pub fn new(config: DetectionConfig) -> Self {
        info!(?config, "creating cheating detector");
        Self {
            config,
            session_start: None,
            last_timestamp: 0.0,
            looking_away_start: None,
            total_looking_away_time: 0.0,
            pose_history: VecDeque::with_capacity(POSE_HISTORY_CAPACITY),
            off_screen_history: VecDeque::with_capacity(OFF_SCREEN_HISTORY_CAPACITY),
            alert_active: false,
            last_alert_time: None,
            suspicion_score: 0.0,
            patterns: PatternCounters::default(),
            alerts: Vec::new(),
        }
    }

    /// Create a detector from a named sensitivity preset
    pub fn with_mode(mode: DetectionMode) -> Self {
        Self::new(DetectionConfig::for_mode(mode))
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Replace the thresholds with a named preset.
    ///
    /// Only this instance changes; the old config value is dropped whole.
    pub fn set_detection_mode(&mut self, mode: DetectionMode) {
        self.config = DetectionConfig::for_mode(mode);
        info!(?mode, "detection mode set");
    }

    /// Analyze one frame of gaze behavior.
    ///
    /// Frames without a detection, and frames below the confidence gate,
    /// leave the score, timers, and counters untouched.
    pub fn analyze_gaze_behavior(
        &mut self,
        gaze: Option<&CalibratedGaze>,
        structure: Option<&FacialStructure>,
        timestamp: f64,
    ) -> DetectionResult {
        self.session_start.get_or_insert(timestamp);
        self.last_timestamp = timestamp;

        let gaze = match (gaze, structure) {
            (Some(gaze), Some(_)) => gaze,
            _ => return self.skipped_result(FrameStatus::NoDetection, timestamp),
        };

        if gaze.confidence < self.config.min_confidence {
            debug!(
                confidence = gaze.confidence,
                "frame below confidence gate, skipped"
            );
            return self.skipped_result(FrameStatus::LowConfidence, timestamp);
        }

        let yaw = gaze.yaw;
        let pitch = gaze.pitch;

        let is_looking_away =
            pitch > self.config.downward_gaze_angle || yaw.abs() > self.config.side_gaze_angle;

        let looking_away_duration = if is_looking_away {
            let start = *self.looking_away_start.get_or_insert(timestamp);
            timestamp - start
        } else {
            if let Some(start) = self.looking_away_start.take() {
                self.total_looking_away_time += timestamp - start;
            }
            0.0
        };

        let head_movement_velocity = self.record_head_movement(yaw, pitch);

        if self.off_screen_history.len() >= OFF_SCREEN_HISTORY_CAPACITY {
            self.off_screen_history.pop_front();
        }
        self.off_screen_history.push_back(is_looking_away);

        self.update_patterns(yaw, pitch);

        let delta = self.suspicion_delta(
            is_looking_away,
            looking_away_duration,
            head_movement_velocity,
            yaw,
            pitch,
        );
        self.suspicion_score =
            (self.suspicion_score + delta).clamp(0.0, self.config.max_suspicion_score);

        let alert_level = self.determine_alert_level(looking_away_duration, timestamp);

        DetectionResult {
            timestamp,
            status: FrameStatus::Analyzed,
            alert_level,
            is_looking_away,
            suspicion_score: self.suspicion_score,
            total_alerts: self.alerts.len(),
            looking_away_duration,
            total_away_time: self.total_looking_away_time,
            head_movement_velocity,
            yaw,
            pitch,
            confidence: gaze.confidence,
        }
    }

    /// Velocity in (yaw, pitch) space against the previous retained pose
    fn record_head_movement(&mut self, yaw: f64, pitch: f64) -> f64 {
        let velocity = match self.pose_history.back() {
            Some(&(prev_yaw, prev_pitch)) => {
                ((yaw - prev_yaw).powi(2) + (pitch - prev_pitch).powi(2)).sqrt()
            }
            None => 0.0,
        };

        if self.pose_history.len() >= POSE_HISTORY_CAPACITY {
            self.pose_history.pop_front();
        }
        self.pose_history.push_back((yaw, pitch));
        velocity
    }

    fn update_patterns(&mut self, yaw: f64, pitch: f64) {
        if pitch > self.config.downward_gaze_angle {
            self.patterns.downward_looks += 1;
        }
        if yaw.abs() > self.config.side_gaze_angle {
            self.patterns.side_looks += 1;
        }
        if yaw.abs() > self.config.head_movement_threshold {
            self.patterns.head_turns += 1;
        }
    }

    fn suspicion_delta(
        &self,
        is_looking_away: bool,
        looking_away_duration: f64,
        head_velocity: f64,
        yaw: f64,
        pitch: f64,
    ) -> f64 {
        let mut delta = if is_looking_away {
            let mut d = self.config.looking_away_penalty;
            if pitch > self.config.downward_gaze_angle {
                d += self.config.downward_look_penalty;
            }
            // Stricter bound than the away check: only far side looks
            if yaw.abs() > self.config.side_gaze_angle * 1.5 {
                d += self.config.side_look_penalty;
            }
            d
        } else {
            self.config.recovery_rate
        };

        // Applied regardless of the away branch: a fast head turn while
        // facing the screen still raises the score
        if head_velocity > self.config.head_movement_threshold {
            delta += self.config.head_movement_penalty;
        }

        if looking_away_duration > self.config.suspicious_gaze_threshold {
            delta *= self.config.duration_multiplier;
        }

        delta
    }

    /// Alert precedence: cooldown, then score, then duration, then patterns
    fn determine_alert_level(&mut self, looking_away_duration: f64, now: f64) -> AlertLevel {
        if let Some(last) = self.last_alert_time {
            if now - last < self.config.alert_cooldown {
                debug!("alert suppressed: in cooldown period");
                return if self.alert_active {
                    AlertLevel::OngoingAlert
                } else {
                    AlertLevel::NoAlert
                };
            }
        }

        if self.suspicion_score > self.config.high_suspicion_threshold {
            self.fire_alert(AlertReason::HighSuspicion, now);
            return AlertLevel::CheatingDetected;
        }

        if looking_away_duration > self.config.cheating_gaze_threshold {
            self.fire_alert(AlertReason::ProlongedDistraction, now);
            return AlertLevel::CheatingDetected;
        } else if looking_away_duration > self.config.suspicious_gaze_threshold {
            return AlertLevel::SuspiciousBehavior;
        }

        if self.patterns.downward_looks > self.config.max_downward_looks
            || self.patterns.side_looks > self.config.max_side_looks
            || self.patterns.head_turns > self.config.max_head_turns
        {
            self.fire_alert(AlertReason::RepetitivePatterns, now);
            return AlertLevel::CheatingDetected;
        }

        self.alert_active = false;
        AlertLevel::NoAlert
    }

    fn fire_alert(&mut self, reason: AlertReason, now: f64) {
        self.last_alert_time = Some(now);
        self.alert_active = true;

        warn!(
            ?reason,
            score = self.suspicion_score,
            away_time = self.total_looking_away_time,
            "cheating alert fired"
        );

        self.alerts.push(CheatingAlert {
            timestamp: now,
            reason,
            suspicion_score: self.suspicion_score,
            total_away_time: self.total_looking_away_time,
            patterns: self.patterns,
            message: reason.message().to_string(),
            severity: reason.severity(),
        });
    }

    fn skipped_result(&self, status: FrameStatus, timestamp: f64) -> DetectionResult {
        DetectionResult {
            timestamp,
            status,
            alert_level: AlertLevel::NoAlert,
            is_looking_away: false,
            suspicion_score: self.suspicion_score,
            total_alerts: self.alerts.len(),
            looking_away_duration: 0.0,
            total_away_time: self.total_looking_away_time,
            head_movement_velocity: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            confidence: 0.0,
        }
    }

    /// Summary of the session so far.
    ///
    /// A pure read: repeated calls without intervening `analyze` calls
    /// return identical content.
    pub fn get_session_summary(&self) -> SessionSummary {
        let session_duration = match self.session_start {
            Some(start) => self.last_timestamp - start,
            None => 0.0,
        };
        let away_time_percentage = if session_duration > 0.0 {
            self.total_looking_away_time / session_duration * 100.0
        } else {
            0.0
        };

        SessionSummary {
            session_duration,
            total_alerts: self.alerts.len(),
            total_looking_away_time: self.total_looking_away_time,
            away_time_percentage,
            final_suspicion_score: self.suspicion_score,
            repeated_patterns: self.patterns,
            alerts: self.alerts.clone(),
            behavior_analysis: BehaviorReport::from_counters(&self.patterns),
        }
    }

    /// Decay every pattern counter by one, floored at zero.
    ///
    /// Intended to be invoked periodically (e.g. once per minute) by the
    /// caller.
    pub fn reset_patterns(&mut self) {
        self.patterns.decay();
    }

    pub fn suspicion_score(&self) -> f64 {
        self.suspicion_score
    }

    pub fn patterns(&self) -> &PatternCounters {
        &self.patterns
    }

    pub fn alerts(&self) -> &[CheatingAlert] {
        &self.alerts
    }

    pub fn is_alert_active(&self) -> bool {
        self.alert_active
    }
}
