//! Rolling time-series analysis over the gaze trace stream

use std::collections::VecDeque;

use serde::Serialize;

use crate::GazeTraceRecord;

/// Trace records retained for rolling analysis
pub const HISTORY_CAPACITY: usize = 1000;

/// Samples used for the stability score
const STABILITY_WINDOW: usize = 10;

/// Minimum samples inside the window before an aggregate is produced
const MIN_WINDOW_SAMPLES: usize = 10;

/// Aggregate gaze statistics over a trailing time window
#[derive(Debug, Clone, Serialize)]
pub struct WindowAnalysis {
    pub window_seconds: f64,
    pub data_points: usize,
    pub avg_yaw: f64,
    pub avg_pitch: f64,
    pub yaw_std: f64,
    pub pitch_std: f64,
    pub avg_confidence: f64,
    pub gaze_range_yaw: f64,
    pub gaze_range_pitch: f64,
    pub stability_score: f64,
}

/// Rolling statistics over the recent trace stream.
///
/// Holds the last [`HISTORY_CAPACITY`] records; all queries are O(window).
pub struct TimeSeriesAnalyzer {
    history: VecDeque<GazeTraceRecord>,
}

impl TimeSeriesAnalyzer {
    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Head-movement velocity of a new raw pose relative to the newest
    /// retained sample. Zero with an empty history. Call before `push`.
    pub fn head_velocity(&self, raw_yaw: f64, raw_pitch: f64) -> f64 {
        match self.history.back() {
            Some(prev) => {
                ((raw_yaw - prev.raw_yaw).powi(2) + (raw_pitch - prev.raw_pitch).powi(2)).sqrt()
            }
            None => 0.0,
        }
    }

    /// Gaze stability over the last [`STABILITY_WINDOW`] samples:
    /// `1/(1+std)` averaged across calibrated yaw and pitch. 1.0 until the
    /// window fills.
    pub fn stability_score(&self) -> f64 {
        if self.history.len() < STABILITY_WINDOW {
            return 1.0;
        }

        let recent: Vec<&GazeTraceRecord> = self
            .history
            .iter()
            .rev()
            .take(STABILITY_WINDOW)
            .collect();
        let yaws: Vec<f64> = recent.iter().map(|r| r.calibrated_yaw).collect();
        let pitches: Vec<f64> = recent.iter().map(|r| r.calibrated_pitch).collect();

        let yaw_stability = 1.0 / (1.0 + std_dev(&yaws));
        let pitch_stability = 1.0 / (1.0 + std_dev(&pitches));
        (yaw_stability + pitch_stability) / 2.0
    }

    /// Retain one record, evicting the oldest at capacity
    pub fn push(&mut self, record: GazeTraceRecord) {
        if self.history.len() >= HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }

    /// Aggregate statistics over records newer than `now - window_seconds`.
    ///
    /// `None` when fewer than [`MIN_WINDOW_SAMPLES`] records fall inside the
    /// window.
    pub fn window_analysis(&self, now: f64, window_seconds: f64) -> Option<WindowAnalysis> {
        let cutoff = now - window_seconds;
        let recent: Vec<&GazeTraceRecord> = self
            .history
            .iter()
            .filter(|r| r.timestamp > cutoff)
            .collect();
        if recent.len() < MIN_WINDOW_SAMPLES {
            return None;
        }

        let yaws: Vec<f64> = recent.iter().map(|r| r.calibrated_yaw).collect();
        let pitches: Vec<f64> = recent.iter().map(|r| r.calibrated_pitch).collect();
        let confidences: Vec<f64> = recent.iter().map(|r| r.confidence).collect();
        let stabilities: Vec<f64> = recent.iter().map(|r| r.gaze_stability_score).collect();

        Some(WindowAnalysis {
            window_seconds,
            data_points: recent.len(),
            avg_yaw: mean(&yaws),
            avg_pitch: mean(&pitches),
            yaw_std: std_dev(&yaws),
            pitch_std: std_dev(&pitches),
            avg_confidence: mean(&confidences),
            gaze_range_yaw: range(&yaws),
            gaze_range_pitch: range(&pitches),
            stability_score: mean(&stabilities),
        })
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl Default for TimeSeriesAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

fn range(values: &[f64]) -> f64 {
    let min = values.iter().cloned().fold(f64::MAX, f64::min);
    let max = values.iter().cloned().fold(f64::MIN, f64::max);
    max - min
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timestamp: f64, yaw: f64, pitch: f64) -> GazeTraceRecord {
        GazeTraceRecord {
            timestamp,
            raw_yaw: yaw,
            raw_pitch: pitch,
            calibrated_yaw: yaw,
            calibrated_pitch: pitch,
            confidence: 0.9,
            gaze_stability_score: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_head_velocity() {
        let mut analyzer = TimeSeriesAnalyzer::new();
        assert_eq!(analyzer.head_velocity(0.5, 0.5), 0.0);

        analyzer.push(record(0.0, 0.0, 0.0));
        assert!((analyzer.head_velocity(0.3, 0.4) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_stability_is_one_for_steady_gaze() {
        let mut analyzer = TimeSeriesAnalyzer::new();
        for i in 0..STABILITY_WINDOW {
            analyzer.push(record(i as f64, 0.1, 0.1));
        }
        assert!((analyzer.stability_score() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_stability_drops_with_jitter() {
        let mut analyzer = TimeSeriesAnalyzer::new();
        for i in 0..STABILITY_WINDOW {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            analyzer.push(record(i as f64, sign * 0.5, sign * 0.5));
        }
        assert!(analyzer.stability_score() < 0.7);
    }

    #[test]
    fn test_window_analysis_needs_enough_samples() {
        let mut analyzer = TimeSeriesAnalyzer::new();
        for i in 0..5 {
            analyzer.push(record(i as f64, 0.1, 0.2));
        }
        assert!(analyzer.window_analysis(5.0, 30.0).is_none());

        for i in 5..20 {
            analyzer.push(record(i as f64, 0.1, 0.2));
        }
        let analysis = analyzer.window_analysis(20.0, 30.0).unwrap();
        assert_eq!(analysis.data_points, 20);
        assert!((analysis.avg_yaw - 0.1).abs() < 1e-9);
        assert!((analysis.gaze_range_pitch).abs() < 1e-9);
    }

    #[test]
    fn test_window_excludes_stale_records() {
        let mut analyzer = TimeSeriesAnalyzer::new();
        for i in 0..40 {
            analyzer.push(record(i as f64, 0.0, 0.0));
        }
        let analysis = analyzer.window_analysis(39.0, 10.0).unwrap();
        // Only timestamps > 29.0 qualify
        assert_eq!(analysis.data_points, 10);
    }

    #[test]
    fn test_history_capacity_bounded() {
        let mut analyzer = TimeSeriesAnalyzer::new();
        for i in 0..(HISTORY_CAPACITY + 100) {
            analyzer.push(record(i as f64, 0.0, 0.0));
        }
        assert_eq!(analyzer.len(), HISTORY_CAPACITY);
    }
}
