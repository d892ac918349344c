//! Per-session pipeline: structure analysis → calibration → detection
//!
//! Owns one calibrator + smoother + detector (+ optional telemetry sink) and
//! feeds them frame by frame. The caller supplies timestamps in strictly
//! increasing order; calibration state and detector state never outlive the
//! session.

use std::path::PathBuf;

use chrono::Utc;
use face_geometry::{FacialStructure, RawFaceObservation};
use gaze_calibration::{
    project_gaze, CalibratorConfig, GazeCalibrator, GazeSmoothing, Quadrant,
};
use serde::Serialize;
use telemetry::{GazeTraceRecord, GazeTraceWriter, TelemetryError, TimeSeriesAnalyzer};
use thiserror::Error;
use tracing::info;

use crate::config::DetectionConfig;
use crate::detector::{AlertLevel, CheatingDetector, DetectionResult, FrameStatus};
use crate::summary::SessionSummary;

/// Session-level errors.
///
/// Per-frame "nothing to report" conditions are not errors; they surface as
/// [`FrameStatus`] on the result.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("non-monotonic frame timestamp: {current} after {previous}")]
    NonMonotonicTimestamp { previous: f64, current: f64 },

    #[error("telemetry sink failed: {0}")]
    Telemetry(#[from] TelemetryError),
}

/// Session pipeline configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub detection: DetectionConfig,
    pub calibration: CalibratorConfig,
    /// Frame dimensions (pixels), used for gaze projection
    pub frame_width: f64,
    pub frame_height: f64,
    /// Keep a FrameAnalysis snapshot every Nth frame
    pub analysis_sample_interval: u64,
    /// Directory for the gaze trace sink; `None` disables telemetry
    pub trace_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            calibration: CalibratorConfig::default(),
            frame_width: 1280.0,
            frame_height: 720.0,
            analysis_sample_interval: 30,
            trace_dir: None,
        }
    }
}

/// Snapshot of one analyzed frame kept in the session report
#[derive(Debug, Clone, Serialize)]
pub struct FrameAnalysis {
    pub frame_number: u64,
    pub timestamp: f64,
    pub alert_level: AlertLevel,
    pub suspicion_score: f64,
    pub is_looking_away: bool,
    pub yaw: f64,
    pub pitch: f64,
    pub confidence: f64,
}

/// A frame flagged at or above the suspicious level
#[derive(Debug, Clone, Serialize)]
pub struct CheatingEvent {
    pub timestamp: f64,
    pub frame_number: u64,
    pub alert_level: AlertLevel,
    pub suspicion_score: f64,
}

/// End-of-job aggregate, serialized by the caller into the report format of
/// its choice
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub frames_processed: u64,
    /// Frames flagged SUSPICIOUS_BEHAVIOR or above
    pub cheating_events: Vec<CheatingEvent>,
    /// Periodic frame snapshots
    pub frame_analysis: Vec<FrameAnalysis>,
    pub summary: SessionSummary,
}

/// One monitored session end to end
pub struct ProctorSession {
    config: SessionConfig,
    calibrator: GazeCalibrator,
    smoother: GazeSmoothing,
    detector: CheatingDetector,
    analyzer: TimeSeriesAnalyzer,
    trace: Option<GazeTraceWriter>,
    frame_analysis: Vec<FrameAnalysis>,
    cheating_events: Vec<CheatingEvent>,
    frames_processed: u64,
    last_timestamp: Option<f64>,
}

impl ProctorSession {
    /// Create a session; opens the trace sink when a directory is configured
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let trace = match &config.trace_dir {
            Some(dir) => Some(GazeTraceWriter::create(dir, Utc::now())?),
            None => None,
        };

        Ok(Self {
            calibrator: GazeCalibrator::new(config.calibration.clone()),
            smoother: GazeSmoothing::default(),
            detector: CheatingDetector::new(config.detection.clone()),
            analyzer: TimeSeriesAnalyzer::new(),
            trace,
            frame_analysis: Vec::new(),
            cheating_events: Vec::new(),
            frames_processed: 0,
            last_timestamp: None,
            config,
        })
    }

    /// Process one frame's observations, in timestamp order.
    ///
    /// Returns one detection result per observation. During the adaptation
    /// window results carry `FrameStatus::NoDetection`; detection proper
    /// starts once calibration completes.
    pub fn process_frame(
        &mut self,
        observations: &[RawFaceObservation],
        frame_number: u64,
        timestamp: f64,
    ) -> Result<Vec<DetectionResult>, SessionError> {
        if let Some(previous) = self.last_timestamp {
            if timestamp < previous {
                return Err(SessionError::NonMonotonicTimestamp {
                    previous,
                    current: timestamp,
                });
            }
        }
        self.last_timestamp = Some(timestamp);
        self.frames_processed += 1;

        let mut results = Vec::with_capacity(observations.len());
        for observation in observations {
            let structure = FacialStructure::from_observation(observation);

            if self
                .calibrator
                .update_baseline(observation, structure.as_ref())
            {
                info!(frame_number, "gaze calibration established");
            }

            let calibrated = structure
                .as_ref()
                .and_then(|s| self.calibrator.predict(observation, s));

            let result =
                self.detector
                    .analyze_gaze_behavior(calibrated.as_ref(), structure.as_ref(), timestamp);

            if result.status == FrameStatus::Analyzed {
                self.record_snapshots(&result, frame_number);
            }

            self.record_telemetry(observation, &result, frame_number, timestamp)?;
            results.push(result);
        }

        Ok(results)
    }

    fn record_snapshots(&mut self, result: &DetectionResult, frame_number: u64) {
        if frame_number % self.config.analysis_sample_interval == 0 {
            self.frame_analysis.push(FrameAnalysis {
                frame_number,
                timestamp: result.timestamp,
                alert_level: result.alert_level,
                suspicion_score: result.suspicion_score,
                is_looking_away: result.is_looking_away,
                yaw: result.yaw,
                pitch: result.pitch,
                confidence: result.confidence,
            });
        }

        if matches!(
            result.alert_level,
            AlertLevel::SuspiciousBehavior | AlertLevel::CheatingDetected
        ) {
            self.cheating_events.push(CheatingEvent {
                timestamp: result.timestamp,
                frame_number,
                alert_level: result.alert_level,
                suspicion_score: result.suspicion_score,
            });
        }
    }

    fn record_telemetry(
        &mut self,
        observation: &RawFaceObservation,
        result: &DetectionResult,
        frame_number: u64,
        timestamp: f64,
    ) -> Result<(), SessionError> {
        let velocity = self.analyzer.head_velocity(observation.yaw, observation.pitch);
        let stability = self.analyzer.stability_score();

        let mut record = GazeTraceRecord {
            timestamp,
            frame_id: frame_number,
            raw_yaw: observation.yaw,
            raw_pitch: observation.pitch,
            face_x: observation.center.x,
            face_y: observation.center.y,
            face_width: observation.width,
            face_height: observation.height,
            quadrant: "unknown".into(),
            head_movement_velocity: velocity,
            gaze_stability_score: stability,
            ..Default::default()
        };

        if result.status == FrameStatus::Analyzed {
            record.calibrated_yaw = result.yaw;
            record.calibrated_pitch = result.pitch;
            record.confidence = result.confidence;

            let point = project_gaze(
                result.yaw,
                result.pitch,
                observation.center,
                self.config.frame_width / 2.0,
            );
            record.gaze_point_x = point.x;
            record.gaze_point_y = point.y;
            record.quadrant =
                Quadrant::of(point, self.config.frame_width, self.config.frame_height)
                    .label()
                    .to_string();

            self.smoother.add_gaze(result.yaw, result.pitch, point);
            if let Some(smoothed) = self.smoother.smoothed() {
                record.smoothed_yaw = smoothed.yaw;
                record.smoothed_pitch = smoothed.pitch;
            }
        }

        self.analyzer.push(record.clone());
        if let Some(trace) = self.trace.as_mut() {
            trace.write(&record)?;
        }
        Ok(())
    }

    /// Finish the session: flush telemetry and assemble the report
    pub fn finish(mut self) -> Result<SessionReport, SessionError> {
        let summary = self.detector.get_session_summary();

        if let Some(trace) = self.trace.take() {
            let path = trace.close()?;
            info!(path = %path.display(), "session telemetry flushed");
        }

        info!(
            frames = self.frames_processed,
            alerts = summary.total_alerts,
            final_score = summary.final_suspicion_score,
            "session finished"
        );

        Ok(SessionReport {
            frames_processed: self.frames_processed,
            cheating_events: self.cheating_events,
            frame_analysis: self.frame_analysis,
            summary,
        })
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrator.is_calibrated()
    }

    pub fn detector(&self) -> &CheatingDetector {
        &self.detector
    }

    /// Mutable detector access, e.g. for periodic `reset_patterns` or a
    /// mid-session mode switch
    pub fn detector_mut(&mut self) -> &mut CheatingDetector {
        &mut self.detector
    }

    /// Rolling gaze statistics over the trailing window
    pub fn window_analysis(&self, window_seconds: f64) -> Option<telemetry::WindowAnalysis> {
        let now = self.last_timestamp?;
        self.analyzer.window_analysis(now, window_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use face_geometry::Point;

    fn observation(yaw: f64, pitch: f64) -> RawFaceObservation {
        let cx = 640.0;
        let cy = 360.0;
        RawFaceObservation {
            center: Point::new(cx, cy),
            width: 150.0,
            height: 200.0,
            landmarks: vec![
                Point::new(cx - 30.0, cy - 20.0),
                Point::new(cx + 30.0, cy - 20.0),
                Point::new(cx, cy + 30.0),
                Point::new(cx - 20.0, cy + 50.0),
                Point::new(cx + 20.0, cy + 50.0),
            ],
            yaw,
            pitch,
        }
    }

    const FPS: f64 = 30.0;

    fn run_frames(
        session: &mut ProctorSession,
        start_frame: u64,
        count: u64,
        yaw: f64,
        pitch: f64,
    ) {
        for frame in start_frame..start_frame + count {
            let t = frame as f64 / FPS;
            session
                .process_frame(&[observation(yaw, pitch)], frame, t)
                .unwrap();
        }
    }

    #[test]
    fn test_rejects_non_monotonic_timestamps() {
        let mut session = ProctorSession::new(SessionConfig::default()).unwrap();
        session
            .process_frame(&[observation(0.0, 0.0)], 0, 1.0)
            .unwrap();

        let err = session
            .process_frame(&[observation(0.0, 0.0)], 1, 0.5)
            .unwrap_err();
        assert!(matches!(err, SessionError::NonMonotonicTimestamp { .. }));
    }

    #[test]
    fn test_detection_starts_after_calibration() {
        let mut session = ProctorSession::new(SessionConfig::default()).unwrap();

        // Adaptation window: no calibrated gaze yet
        for frame in 0..29u64 {
            let results = session
                .process_frame(&[observation(0.0, 0.0)], frame, frame as f64 / FPS)
                .unwrap();
            assert_eq!(results[0].status, FrameStatus::NoDetection);
        }
        assert!(!session.is_calibrated());

        let results = session
            .process_frame(&[observation(0.0, 0.0)], 29, 29.0 / FPS)
            .unwrap();
        assert!(session.is_calibrated());
        assert_eq!(results[0].status, FrameStatus::Analyzed);
    }

    #[test]
    fn test_end_to_end_session_report() {
        let mut session = ProctorSession::new(SessionConfig::default()).unwrap();

        // Calibrate attentive, then a long look down, then recover
        run_frames(&mut session, 0, 60, 0.0, 0.0);
        run_frames(&mut session, 60, 240, 0.0, 0.5);
        run_frames(&mut session, 300, 60, 0.0, 0.2);

        let report = session.finish().unwrap();
        assert_eq!(report.frames_processed, 360);
        assert!(!report.cheating_events.is_empty());
        assert!(report.summary.total_alerts >= 1);
        // At 30 fps the score outruns the duration timer
        assert_eq!(
            report.summary.alerts[0].reason,
            crate::alerts::AlertReason::HighSuspicion
        );
        assert!(report.summary.total_looking_away_time > 7.0);
        // Snapshots land on analyzed multiples of 30; frame 0 predates
        // calibration
        assert_eq!(report.frame_analysis.len(), 11);
    }

    #[test]
    fn test_clean_session_has_empty_event_log() {
        let mut session = ProctorSession::new(SessionConfig::default()).unwrap();
        run_frames(&mut session, 0, 300, 0.0, 0.0);

        let report = session.finish().unwrap();
        assert!(report.cheating_events.is_empty());
        assert!(report.summary.alerts.is_empty());
        assert_eq!(report.summary.total_looking_away_time, 0.0);
        assert_eq!(report.summary.final_suspicion_score, 0.0);
    }

    #[test]
    fn test_telemetry_trace_is_written() {
        let dir = std::env::temp_dir().join(format!("proctor-session-{}", std::process::id()));
        let config = SessionConfig {
            trace_dir: Some(dir.clone()),
            ..Default::default()
        };
        let mut session = ProctorSession::new(config).unwrap();
        run_frames(&mut session, 0, 40, 0.0, 0.0);
        session.finish().unwrap();

        let entries: Vec<_> = std::fs::read_dir(&dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let path = entries[0].as_ref().unwrap().path();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 40);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_window_analysis_after_warmup() {
        let mut session = ProctorSession::new(SessionConfig::default()).unwrap();
        run_frames(&mut session, 0, 90, 0.0, 0.0);

        let analysis = session.window_analysis(10.0).unwrap();
        assert!(analysis.data_points >= 10);
        assert!(analysis.avg_confidence > 0.0);
    }
}
