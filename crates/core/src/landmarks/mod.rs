//! Pose landmark input types.
//!
//! Frames arrive from an external pose estimator using the 33-point
//! MediaPipe body numbering. Only a handful of indices are consulted by the
//! exercise rules; the constants below name them.

use serde::{Deserialize, Serialize};

/// Number of body points delivered per frame.
pub const LANDMARK_COUNT: usize = 33;

pub const NOSE: usize = 0;
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_KNEE: usize = 25;
pub const RIGHT_KNEE: usize = 26;
pub const LEFT_ANKLE: usize = 27;
pub const RIGHT_ANKLE: usize = 28;
pub const LEFT_FOOT_INDEX: usize = 31;
pub const RIGHT_FOOT_INDEX: usize = 32;

/// A 2D point in normalised image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One tracked body point as produced by the pose estimator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Estimator confidence in `[0, 1]`. Recordings that omit it are taken
    /// as fully visible.
    #[serde(default = "full_visibility")]
    pub visibility: f32,
}

fn full_visibility() -> f32 {
    1.0
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, visibility }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// All landmarks observed for one video frame.
///
/// The landmark id is its position in `landmarks`. Raw frames are never
/// mutated by the engine; smoothing derives its own copies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoseFrame {
    /// Capture time in milliseconds on the host's monotonic clock.
    pub timestamp_ms: u64,
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
}

impl PoseFrame {
    pub fn new(timestamp_ms: u64, landmarks: Vec<Landmark>) -> Self {
        Self {
            timestamp_ms,
            landmarks,
        }
    }

    /// A frame where the estimator found nobody.
    pub fn empty(timestamp_ms: u64) -> Self {
        Self::new(timestamp_ms, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn landmark(&self, id: usize) -> Option<&Landmark> {
        self.landmarks.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_frames_without_visibility() {
        let json = r#"{"timestamp_ms":40,"landmarks":[{"x":0.5,"y":0.25}]}"#;
        let frame: PoseFrame = serde_json::from_str(json).unwrap();

        assert_eq!(frame.timestamp_ms, 40);
        let nose = frame.landmark(NOSE).unwrap();
        assert_eq!(nose.point(), Point::new(0.5, 0.25));
        assert_eq!(nose.visibility, 1.0);
        assert!(frame.landmark(LEFT_SHOULDER).is_none());
    }
}
