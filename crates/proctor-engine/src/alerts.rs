//! Alert taxonomy and the static reason/behavior catalogs

use serde::{Deserialize, Serialize};

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Why an alert fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertReason {
    ProlongedDistraction,
    HighSuspicion,
    RepetitivePatterns,
    RapidHeadMovement,
}

impl AlertReason {
    /// Operator-facing message
    pub fn message(&self) -> &'static str {
        match self {
            AlertReason::ProlongedDistraction => {
                "Candidate looking away from screen for extended period"
            }
            AlertReason::HighSuspicion => "High suspicion score reached",
            AlertReason::RepetitivePatterns => {
                "Repetitive suspicious movement patterns detected"
            }
            AlertReason::RapidHeadMovement => "Unusual head movement patterns",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AlertReason::ProlongedDistraction | AlertReason::HighSuspicion => Severity::High,
            AlertReason::RepetitivePatterns | AlertReason::RapidHeadMovement => Severity::Medium,
        }
    }

    /// Longer explanation for reports
    pub fn description(&self) -> &'static str {
        match self {
            AlertReason::ProlongedDistraction => {
                "May indicate reading notes or consulting external resources"
            }
            AlertReason::HighSuspicion => "Multiple suspicious behaviors detected",
            AlertReason::RepetitivePatterns => {
                "Consistent looking away patterns may indicate systematic cheating"
            }
            AlertReason::RapidHeadMovement => {
                "Rapid or repetitive head movements may indicate communication with others"
            }
        }
    }
}

/// Away-behavior categories tracked by the pattern counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    DownwardLooks,
    SideLooks,
    HeadTurns,
}

impl PatternKind {
    pub const ALL: [PatternKind; 3] = [
        PatternKind::DownwardLooks,
        PatternKind::SideLooks,
        PatternKind::HeadTurns,
    ];

    /// Report description of the behavior
    pub fn description(&self) -> &'static str {
        match self {
            PatternKind::DownwardLooks => {
                "Looking down (potentially reading notes or using phone)"
            }
            PatternKind::SideLooks => {
                "Looking to the side (potentially viewing other screens or people)"
            }
            PatternKind::HeadTurns => {
                "Frequent head turning (potentially communicating with others)"
            }
        }
    }
}

/// Cumulative away-behavior counts.
///
/// Not exclusive categories: one frame can increment several counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternCounters {
    pub downward_looks: u32,
    pub side_looks: u32,
    pub head_turns: u32,
}

impl PatternCounters {
    pub fn get(&self, kind: PatternKind) -> u32 {
        match kind {
            PatternKind::DownwardLooks => self.downward_looks,
            PatternKind::SideLooks => self.side_looks,
            PatternKind::HeadTurns => self.head_turns,
        }
    }

    /// Decay every counter by one, floored at zero.
    ///
    /// Invoked periodically so stale history stops feeding the
    /// pattern-based alert branch.
    pub fn decay(&mut self) {
        self.downward_looks = self.downward_looks.saturating_sub(1);
        self.side_looks = self.side_looks.saturating_sub(1);
        self.head_turns = self.head_turns.saturating_sub(1);
    }
}

/// Immutable record of one fired alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheatingAlert {
    /// Frame timestamp at fire time (seconds)
    pub timestamp: f64,
    pub reason: AlertReason,
    /// Suspicion score when the alert fired
    pub suspicion_score: f64,
    /// Cumulative away time when the alert fired (seconds)
    pub total_away_time: f64,
    /// Pattern-counter snapshot at fire time
    pub patterns: PatternCounters,
    pub message: String,
    pub severity: Severity,
}
