use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::landmarks::{Point, PoseFrame};

/// Smoothed positions keyed by landmark id.
///
/// Ids whose raw landmark was below the visibility threshold are absent for
/// that frame; rules touching them cannot be evaluated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SmoothedLandmarks {
    points: BTreeMap<usize, Point>,
}

impl SmoothedLandmarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: usize) -> Option<Point> {
        self.points.get(&id).copied()
    }

    pub fn insert(&mut self, id: usize, point: Point) {
        self.points.insert(id, point);
    }

    pub fn contains(&self, id: usize) -> bool {
        self.points.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<(usize, Point)> for SmoothedLandmarks {
    fn from_iter<I: IntoIterator<Item = (usize, Point)>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

/// One exponential-moving-average step over a whole frame.
///
/// Visible landmarks with a previous entry blend as
/// `alpha * previous + (1 - alpha) * current`; first observations pass
/// through unchanged. The returned map is the state for the next frame.
pub fn smooth_landmarks(
    frame: &PoseFrame,
    previous: &SmoothedLandmarks,
    alpha: f32,
    visibility_threshold: f32,
) -> SmoothedLandmarks {
    frame
        .landmarks
        .iter()
        .enumerate()
        .filter(|(_, landmark)| landmark.visibility > visibility_threshold)
        .map(|(id, landmark)| {
            let point = match previous.get(id) {
                Some(prev) => Point::new(
                    alpha * prev.x + (1.0 - alpha) * landmark.x,
                    alpha * prev.y + (1.0 - alpha) * landmark.y,
                ),
                None => landmark.point(),
            };
            (id, point)
        })
        .collect()
}

/// Owns the smoothing history for one exercise session.
#[derive(Debug, Clone)]
pub struct LandmarkSmoother {
    alpha: f32,
    visibility_threshold: f32,
    previous: SmoothedLandmarks,
}

impl LandmarkSmoother {
    pub fn new(alpha: f32, visibility_threshold: f32) -> Self {
        Self {
            alpha,
            visibility_threshold,
            previous: SmoothedLandmarks::new(),
        }
    }

    /// Smooths `frame` against the stored history and replaces the history
    /// with the result.
    pub fn smooth(&mut self, frame: &PoseFrame) -> SmoothedLandmarks {
        let smoothed = smooth_landmarks(frame, &self.previous, self.alpha, self.visibility_threshold);
        self.previous = smoothed.clone();
        smoothed
    }

    pub fn history(&self) -> &SmoothedLandmarks {
        &self.previous
    }

    /// Forgets all history; the next frame is treated as a first observation.
    pub fn reset(&mut self) {
        self.previous = SmoothedLandmarks::new();
    }
}

impl Default for LandmarkSmoother {
    fn default() -> Self {
        Self::new(0.5, 0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Landmark;

    fn frame_with(points: &[(f32, f32, f32)]) -> PoseFrame {
        let landmarks = points
            .iter()
            .map(|&(x, y, visibility)| Landmark::new(x, y, visibility))
            .collect();
        PoseFrame::new(0, landmarks)
    }

    #[test]
    fn first_observation_passes_through() {
        let mut smoother = LandmarkSmoother::default();
        let smoothed = smoother.smooth(&frame_with(&[(0.4, 0.6, 0.9)]));
        assert_eq!(smoothed.get(0), Some(Point::new(0.4, 0.6)));
    }

    #[test]
    fn blends_with_previous_position() {
        let mut smoother = LandmarkSmoother::default();
        smoother.smooth(&frame_with(&[(0.0, 0.0, 0.9)]));
        let smoothed = smoother.smooth(&frame_with(&[(1.0, 0.5, 0.9)]));
        assert_eq!(smoothed.get(0), Some(Point::new(0.5, 0.25)));
    }

    #[test]
    fn drops_low_visibility_landmarks() {
        let mut smoother = LandmarkSmoother::default();
        let smoothed = smoother.smooth(&frame_with(&[(0.1, 0.1, 0.3), (0.2, 0.2, 0.31)]));

        assert!(!smoothed.contains(0));
        assert!(smoothed.contains(1));
        assert_eq!(smoothed.len(), 1);
    }

    #[test]
    fn dropped_landmark_restarts_from_raw() {
        let mut smoother = LandmarkSmoother::default();
        smoother.smooth(&frame_with(&[(0.0, 0.0, 0.9)]));
        smoother.smooth(&frame_with(&[(0.5, 0.5, 0.1)]));
        let smoothed = smoother.smooth(&frame_with(&[(0.8, 0.8, 0.9)]));
        assert_eq!(smoothed.get(0), Some(Point::new(0.8, 0.8)));
    }

    #[test]
    fn converges_on_constant_input() {
        let mut smoother = LandmarkSmoother::default();
        smoother.smooth(&frame_with(&[(0.9, 0.1, 1.0)]));

        let mut last = Point::default();
        for _ in 0..20 {
            last = smoother.smooth(&frame_with(&[(0.3, 0.7, 1.0)])).get(0).unwrap();
        }

        assert!((last.x - 0.3).abs() < 1e-5);
        assert!((last.y - 0.7).abs() < 1e-5);
    }

    #[test]
    fn reset_clears_history() {
        let mut smoother = LandmarkSmoother::default();
        smoother.smooth(&frame_with(&[(0.3, 0.3, 1.0)]));
        smoother.reset();
        assert!(smoother.history().is_empty());
    }
}
