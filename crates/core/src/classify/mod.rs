use serde::Serialize;

use crate::geometry::joint_angle;
use crate::profile::{AngleRule, ExerciseKind, ExerciseProfile};
use crate::smoothing::SmoothedLandmarks;

/// Angles consumed by the curl phase detector for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseReading {
    pub primary_angle: f32,
    pub stability_angle: f32,
}

/// Result of running an exercise's rule table over one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Classification {
    pub mistakes: Vec<&'static str>,
    /// Rules skipped because one of their landmarks was not visible.
    pub unevaluated: usize,
    pub phase: Option<PhaseReading>,
}

impl Classification {
    /// True when every rule was evaluated and none fired.
    pub fn is_clean(&self) -> bool {
        self.mistakes.is_empty() && self.unevaluated == 0
    }

    /// True when nothing was found wrong but some rule could not be judged.
    pub fn is_inconclusive(&self) -> bool {
        self.mistakes.is_empty() && self.unevaluated > 0
    }
}

/// Measures the angle described by `joints`, or `None` when any of the three
/// landmarks is missing from the smoothed frame.
pub fn measure(smoothed: &SmoothedLandmarks, joints: [usize; 3]) -> Option<f32> {
    let [a, b, c] = joints;
    Some(joint_angle(smoothed.get(a)?, smoothed.get(b)?, smoothed.get(c)?))
}

fn evaluate(rule: &AngleRule, smoothed: &SmoothedLandmarks) -> Option<Option<&'static str>> {
    measure(smoothed, rule.joints).map(|angle| rule.first_violation(angle))
}

/// Applies `profile`'s rules to the smoothed landmarks.
pub fn classify_profile(smoothed: &SmoothedLandmarks, profile: &ExerciseProfile) -> Classification {
    let mut classification = Classification::default();

    for rule in profile.rules {
        match evaluate(rule, smoothed) {
            Some(Some(mistake)) => classification.mistakes.push(mistake),
            Some(None) => {}
            None => classification.unevaluated += 1,
        }
    }

    if let Some(detector) = &profile.phase {
        match (
            measure(smoothed, detector.primary),
            measure(smoothed, detector.stability),
        ) {
            (Some(primary_angle), Some(stability_angle)) => {
                classification.phase = Some(PhaseReading {
                    primary_angle,
                    stability_angle,
                });
            }
            _ => classification.unevaluated += 1,
        }
    }

    classification
}

/// Convenience wrapper that looks up the profile for `exercise`.
pub fn classify(smoothed: &SmoothedLandmarks, exercise: ExerciseKind) -> Classification {
    classify_profile(smoothed, exercise.profile())
}
