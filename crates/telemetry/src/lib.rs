//! Session telemetry
//!
//! Optional per-frame trace stream for offline analysis and model training.
//! Pure observer: nothing here feeds back into detection.

pub mod analyzer;
pub mod trace;

pub use analyzer::{TimeSeriesAnalyzer, WindowAnalysis};
pub use trace::{GazeTraceRecord, GazeTraceWriter, TelemetryError};
