//! Cheating-suspicion engine for remote exam proctoring
//!
//! Consumes per-frame head-pose estimates for a single monitored subject
//! and decides whether gaze behavior is consistent with attentiveness:
//! - Per-session gaze calibration (neutral pose + facial-geometry baseline)
//! - Stateful suspicion scoring with duration timers and pattern counters
//! - Discrete alert levels with cooldown and an auditable session summary

pub mod alerts;
pub mod config;
pub mod detector;
pub mod session;
pub mod summary;

pub use alerts::{AlertReason, CheatingAlert, PatternCounters, PatternKind, Severity};
pub use config::{DetectionConfig, DetectionMode};
pub use detector::{AlertLevel, CheatingDetector, DetectionResult, FrameStatus};
pub use session::{
    CheatingEvent, FrameAnalysis, ProctorSession, SessionConfig, SessionError, SessionReport,
};
pub use summary::{BehaviorFinding, BehaviorReport, SessionSummary};
