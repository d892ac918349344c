//! Frame-to-frame gaze smoothing

use std::collections::VecDeque;

use face_geometry::Point;

/// Default smoothing window (frames)
pub const DEFAULT_SMOOTHING_WINDOW: usize = 7;

/// Smoothed gaze sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedGaze {
    pub yaw: f64,
    pub pitch: f64,
    pub gaze_point: Point,
}

/// Weighted moving average over a short window of gaze samples.
///
/// Weights rise linearly from 0.5 (oldest) to 1.0 (newest), so the output
/// tracks the current pose while damping single-frame jitter.
pub struct GazeSmoothing {
    window: usize,
    yaw_history: VecDeque<f64>,
    pitch_history: VecDeque<f64>,
    point_history: VecDeque<Point>,
}

impl GazeSmoothing {
    /// Create a smoother with the given window size (frames)
    pub fn new(window: usize) -> Self {
        Self {
            window,
            yaw_history: VecDeque::with_capacity(window),
            pitch_history: VecDeque::with_capacity(window),
            point_history: VecDeque::with_capacity(window),
        }
    }

    /// Add one gaze sample, evicting the oldest when the window is full
    pub fn add_gaze(&mut self, yaw: f64, pitch: f64, gaze_point: Point) {
        if self.yaw_history.len() >= self.window {
            self.yaw_history.pop_front();
            self.pitch_history.pop_front();
            self.point_history.pop_front();
        }
        self.yaw_history.push_back(yaw);
        self.pitch_history.push_back(pitch);
        self.point_history.push_back(gaze_point);
    }

    /// Current smoothed gaze, or `None` before any sample arrives
    pub fn smoothed(&self) -> Option<SmoothedGaze> {
        if self.yaw_history.is_empty() {
            return None;
        }

        let weights = linear_weights(self.yaw_history.len());

        let mut yaw = 0.0;
        let mut pitch = 0.0;
        let mut px = 0.0;
        let mut py = 0.0;
        for (i, &w) in weights.iter().enumerate() {
            yaw += w * self.yaw_history[i];
            pitch += w * self.pitch_history[i];
            px += w * self.point_history[i].x;
            py += w * self.point_history[i].y;
        }

        Some(SmoothedGaze {
            yaw,
            pitch,
            gaze_point: Point::new(px, py),
        })
    }

    /// Samples currently in the window
    pub fn len(&self) -> usize {
        self.yaw_history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.yaw_history.is_empty()
    }
}

impl Default for GazeSmoothing {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_WINDOW)
    }
}

/// Normalized weights rising linearly from 0.5 to 1.0
fn linear_weights(n: usize) -> Vec<f64> {
    let raw: Vec<f64> = if n == 1 {
        vec![1.0]
    } else {
        (0..n)
            .map(|i| 0.5 + 0.5 * i as f64 / (n - 1) as f64)
            .collect()
    };
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}
