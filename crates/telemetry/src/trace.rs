//! Buffered JSON-lines gaze trace sink

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Telemetry errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("trace I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("trace serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One frame of gaze telemetry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GazeTraceRecord {
    /// Frame timestamp (seconds from session start)
    pub timestamp: f64,
    pub frame_id: u64,
    pub raw_yaw: f64,
    pub raw_pitch: f64,
    pub calibrated_yaw: f64,
    pub calibrated_pitch: f64,
    pub confidence: f64,
    pub face_x: f64,
    pub face_y: f64,
    pub face_width: f64,
    pub face_height: f64,
    pub gaze_point_x: f64,
    pub gaze_point_y: f64,
    /// Screen quadrant label, "unknown" before calibration
    pub quadrant: String,
    pub smoothed_yaw: f64,
    pub smoothed_pitch: f64,
    pub head_movement_velocity: f64,
    pub gaze_stability_score: f64,
}

/// Buffered writer producing one JSON record per line.
///
/// Records stay in the write buffer until [`GazeTraceWriter::close`] runs;
/// a session that never closes its trace may lose the tail.
pub struct GazeTraceWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    records_written: u64,
}

impl GazeTraceWriter {
    /// Create a trace file inside `dir`, named from the session start time
    pub fn create(
        dir: impl AsRef<Path>,
        session_start: DateTime<Utc>,
    ) -> Result<Self, TelemetryError> {
        std::fs::create_dir_all(dir.as_ref())?;
        let name = format!(
            "gaze_trace_{}.jsonl",
            session_start.format("%Y%m%d_%H%M%S")
        );
        let path = dir.as_ref().join(name);
        let writer = BufWriter::new(File::create(&path)?);

        info!(path = %path.display(), "gaze trace opened");
        Ok(Self {
            writer,
            path,
            records_written: 0,
        })
    }

    /// Append one record
    pub fn write(&mut self, record: &GazeTraceRecord) -> Result<(), TelemetryError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.records_written += 1;
        Ok(())
    }

    /// Flush buffered records and return the trace path
    pub fn close(mut self) -> Result<PathBuf, TelemetryError> {
        self.writer.flush()?;
        info!(records = self.records_written, path = %self.path.display(), "gaze trace closed");
        Ok(self.path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}

impl Drop for GazeTraceWriter {
    fn drop(&mut self) {
        // Best effort for sessions that never reach close()
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn temp_trace_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("gaze-trace-{}-{}", tag, std::process::id()))
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = temp_trace_dir("roundtrip");
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap();
        let mut writer = GazeTraceWriter::create(&dir, start).unwrap();

        let record = GazeTraceRecord {
            timestamp: 1.5,
            frame_id: 45,
            raw_yaw: 0.2,
            calibrated_yaw: 0.1,
            confidence: 0.9,
            quadrant: "top_left".into(),
            ..Default::default()
        };
        writer.write(&record).unwrap();
        assert_eq!(writer.records_written(), 1);

        let path = writer.close().unwrap();
        assert!(path.to_string_lossy().contains("gaze_trace_20250301_103000"));

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: GazeTraceRecord = serde_json::from_str(contents.trim()).unwrap();
        assert_eq!(parsed, record);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_one_line_per_record() {
        let dir = temp_trace_dir("lines");
        let mut writer = GazeTraceWriter::create(&dir, Utc::now()).unwrap();
        for frame_id in 0..5 {
            writer
                .write(&GazeTraceRecord {
                    frame_id,
                    ..Default::default()
                })
                .unwrap();
        }
        let path = writer.close().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 5);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
