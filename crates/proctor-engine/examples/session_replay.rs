//! Replays a synthetic exam session through the full pipeline and prints
//! the end-of-session summary as JSON.

use face_geometry::{Point, RawFaceObservation};
use proctor_engine::{AlertLevel, ProctorSession, SessionConfig};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const FPS: f64 = 30.0;
const SESSION_SECONDS: f64 = 60.0;

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

/// Scripted subject behavior: attentive, one long look down, a few side
/// glances near the end
fn pose_at(t: f64) -> (f64, f64) {
    if (20.0..26.0).contains(&t) {
        (0.05, 0.45)
    } else if (40.0..41.0).contains(&t) || (43.0..44.0).contains(&t) {
        (0.7, 0.0)
    } else {
        (0.02, 0.01)
    }
}

fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("subscriber installed once");

    info!("replaying {SESSION_SECONDS}s synthetic session at {FPS} fps");

    let mut session = ProctorSession::new(SessionConfig::default()).expect("no trace sink configured");

    let total_frames = (SESSION_SECONDS * FPS) as u64;
    for frame in 0..total_frames {
        let t = frame as f64 / FPS;
        let (yaw, pitch) = pose_at(t);
        let results = session
            .process_frame(&[observation(yaw, pitch)], frame, t)
            .expect("timestamps are monotonic");

        for result in results {
            if result.alert_level == AlertLevel::CheatingDetected {
                info!(
                    t,
                    score = result.suspicion_score,
                    away = result.looking_away_duration,
                    "cheating detected"
                );
            }
        }

        // Decay stale pattern counts periodically
        if frame > 0 && frame % (30 * FPS as u64) == 0 {
            session.detector_mut().reset_patterns();
        }
    }

    let report = session.finish().expect("session report");
    println!(
        "{}",
        serde_json::to_string_pretty(&report.summary).expect("summary serializes")
    );
}
