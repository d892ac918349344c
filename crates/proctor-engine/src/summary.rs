//! End-of-session reporting

use serde::{Deserialize, Serialize};

use crate::alerts::{CheatingAlert, PatternCounters, PatternKind, Severity};

/// One entry in the behavior breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorFinding {
    pub pattern: PatternKind,
    pub count: u32,
    pub description: String,
    pub severity: Severity,
}

/// Behavior breakdown derived from the pattern counters: one finding per
/// counter with activity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorReport {
    pub findings: Vec<BehaviorFinding>,
}

impl BehaviorReport {
    pub fn from_counters(counters: &PatternCounters) -> Self {
        let findings = PatternKind::ALL
            .iter()
            .filter_map(|&kind| {
                let count = counters.get(kind);
                if count == 0 {
                    return None;
                }
                Some(BehaviorFinding {
                    pattern: kind,
                    count,
                    description: kind.description().to_string(),
                    severity: severity_for_count(count),
                })
            })
            .collect();
        Self { findings }
    }
}

/// HIGH above 10 occurrences, MEDIUM above 5, LOW otherwise
fn severity_for_count(count: u32) -> Severity {
    if count > 10 {
        Severity::High
    } else if count > 5 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Auditable end-of-session summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Seconds between the first and last analyzed timestamps
    pub session_duration: f64,
    pub total_alerts: usize,
    pub total_looking_away_time: f64,
    /// Away time as a percentage of session duration
    pub away_time_percentage: f64,
    pub final_suspicion_score: f64,
    pub repeated_patterns: PatternCounters,
    /// Every fired alert, in order
    pub alerts: Vec<CheatingAlert>,
    pub behavior_analysis: BehaviorReport,
}
