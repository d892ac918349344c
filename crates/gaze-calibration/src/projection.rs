//! Screen-plane gaze projection
//!
//! Pure geometry: projects head-pose angles to a point on the frame plane
//! and buckets it into a screen quadrant. Consumed by telemetry and by
//! whatever renders overlays downstream; detection logic never reads it.

use face_geometry::Point;
use serde::{Deserialize, Serialize};

/// Screen quadrant containing a projected gaze point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    /// Quadrant of a point within a frame of the given dimensions
    pub fn of(point: Point, frame_width: f64, frame_height: f64) -> Self {
        let left = point.x < frame_width / 2.0;
        let top = point.y < frame_height / 2.0;
        match (top, left) {
            (true, true) => Quadrant::TopLeft,
            (true, false) => Quadrant::TopRight,
            (false, true) => Quadrant::BottomLeft,
            (false, false) => Quadrant::BottomRight,
        }
    }

    /// Stable lowercase label, as written to telemetry records
    pub fn label(&self) -> &'static str {
        match self {
            Quadrant::TopLeft => "top_left",
            Quadrant::TopRight => "top_right",
            Quadrant::BottomLeft => "bottom_left",
            Quadrant::BottomRight => "bottom_right",
        }
    }
}

/// Project (yaw, pitch) onto the frame plane from the face center.
///
/// `reach` is the projection distance in pixels (conventionally half the
/// frame width). Looking left (negative yaw) moves the point left; looking
/// down (positive pitch) moves it down.
pub fn project_gaze(yaw: f64, pitch: f64, face_center: Point, reach: f64) -> Point {
    let dx = -reach * yaw.sin() * pitch.cos();
    let dy = -reach * pitch.sin();
    Point::new(face_center.x + dx, face_center.y + dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_gaze_stays_at_center() {
        let center = Point::new(640.0, 360.0);
        let point = project_gaze(0.0, 0.0, center, 640.0);
        assert_eq!(point, center);
    }

    #[test]
    fn test_projection_direction() {
        let center = Point::new(640.0, 360.0);

        // Positive yaw (head turned right) projects left of center
        let point = project_gaze(0.5, 0.0, center, 640.0);
        assert!(point.x < center.x);
        assert_eq!(point.y, center.y);

        // Positive pitch (head down) projects above center in pixel space
        let point = project_gaze(0.0, 0.4, center, 640.0);
        assert!(point.y < center.y);
    }

    #[test]
    fn test_quadrant_bucketing() {
        assert_eq!(
            Quadrant::of(Point::new(100.0, 100.0), 1280.0, 720.0),
            Quadrant::TopLeft
        );
        assert_eq!(
            Quadrant::of(Point::new(1000.0, 100.0), 1280.0, 720.0),
            Quadrant::TopRight
        );
        assert_eq!(
            Quadrant::of(Point::new(100.0, 500.0), 1280.0, 720.0),
            Quadrant::BottomLeft
        );
        assert_eq!(
            Quadrant::of(Point::new(1000.0, 500.0), 1280.0, 720.0),
            Quadrant::BottomRight
        );
    }
}
