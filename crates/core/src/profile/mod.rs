//! Static exercise profiles.
//!
//! Each supported exercise maps to a list of joint-angle rules plus an
//! optional curl phase detector. Adding an exercise means adding a table
//! entry here; the classifier and trackers stay untouched.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::landmarks::{
    LEFT_ANKLE, LEFT_ELBOW, LEFT_HIP, LEFT_KNEE, LEFT_SHOULDER, LEFT_WRIST, RIGHT_ELBOW,
    RIGHT_SHOULDER, RIGHT_WRIST,
};
use crate::FormCoachError;

/// The exercises the engine knows how to analyse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Pushups,
    Squats,
    PullUps,
    Curls,
    Plank,
    JumpingJacks,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 6] = [
        ExerciseKind::Pushups,
        ExerciseKind::Squats,
        ExerciseKind::PullUps,
        ExerciseKind::Curls,
        ExerciseKind::Plank,
        ExerciseKind::JumpingJacks,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            ExerciseKind::Pushups => "Pushups",
            ExerciseKind::Squats => "Squats",
            ExerciseKind::PullUps => "Pull-ups",
            ExerciseKind::Curls => "Curls",
            ExerciseKind::Plank => "Plank",
            ExerciseKind::JumpingJacks => "Jumping Jacks",
        }
    }

    /// Static profile for this exercise.
    pub fn profile(self) -> &'static ExerciseProfile {
        match self {
            ExerciseKind::Pushups => &PUSHUPS,
            ExerciseKind::Squats => &SQUATS,
            ExerciseKind::PullUps => &PULL_UPS,
            ExerciseKind::Curls => &CURLS,
            ExerciseKind::Plank => &PLANK,
            ExerciseKind::JumpingJacks => &JUMPING_JACKS,
        }
    }
}

impl Default for ExerciseKind {
    fn default() -> Self {
        Self::Pushups
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ExerciseKind {
    type Err = FormCoachError;

    /// Accepts display names and snake_case identifiers, ignoring case,
    /// spaces, dashes and underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "pushups" | "pushup" => Ok(ExerciseKind::Pushups),
            "squats" | "squat" => Ok(ExerciseKind::Squats),
            "pullups" | "pullup" => Ok(ExerciseKind::PullUps),
            "curls" | "curl" => Ok(ExerciseKind::Curls),
            "plank" => Ok(ExerciseKind::Plank),
            "jumpingjacks" | "jumpingjack" => Ok(ExerciseKind::JumpingJacks),
            _ => Err(FormCoachError::UnknownExercise(s.to_string())),
        }
    }
}

/// Which tracker consumes the classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    /// Streak-gated, debounced repetition counting.
    Repetitions,
    /// Isometric hold timing.
    Hold,
}

/// Comparison applied to a measured angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", content = "degrees", rename_all = "snake_case")]
pub enum Bound {
    Below(f32),
    Above(f32),
    AtLeast(f32),
}

impl Bound {
    pub fn violated_by(self, angle: f32) -> bool {
        match self {
            Bound::Below(limit) => angle < limit,
            Bound::Above(limit) => angle > limit,
            Bound::AtLeast(limit) => angle >= limit,
        }
    }
}

/// A bound and the mistake reported when the angle falls on its wrong side.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Threshold {
    pub bound: Bound,
    pub mistake: &'static str,
}

const fn below(limit: f32, mistake: &'static str) -> Threshold {
    Threshold {
        bound: Bound::Below(limit),
        mistake,
    }
}

const fn above(limit: f32, mistake: &'static str) -> Threshold {
    Threshold {
        bound: Bound::Above(limit),
        mistake,
    }
}

const fn at_least(limit: f32, mistake: &'static str) -> Threshold {
    Threshold {
        bound: Bound::AtLeast(limit),
        mistake,
    }
}

/// One measured joint angle and its thresholds.
///
/// Thresholds are checked in order and at most one fires per frame, so a
/// lower and an upper bound on the same angle never report together.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AngleRule {
    pub name: &'static str,
    /// Landmark ids `[a, vertex, c]`.
    pub joints: [usize; 3],
    pub thresholds: &'static [Threshold],
}

impl AngleRule {
    pub fn first_violation(&self, angle: f32) -> Option<&'static str> {
        self.thresholds
            .iter()
            .find(|threshold| threshold.bound.violated_by(angle))
            .map(|threshold| threshold.mistake)
    }
}

/// Two-phase detector used by curl-type exercises.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PhaseDetector {
    /// Working arm `[shoulder, elbow, wrist]`.
    pub primary: [usize; 3],
    /// Opposite arm, used as the upper-arm stability measure.
    pub stability: [usize; 3],
    pub extended_above: f32,
    pub curled_below: f32,
    pub stable_below: f32,
    pub extend_mistake: &'static str,
    pub curl_mistake: &'static str,
}

/// Immutable per-exercise rule set.
#[derive(Debug, Serialize)]
pub struct ExerciseProfile {
    pub kind: ExerciseKind,
    pub tracking: TrackingMode,
    pub rules: &'static [AngleRule],
    pub phase: Option<PhaseDetector>,
}

pub const KEEP_UPPER_ARM_STILL: &str = "Keep your upper arm still against your body";

static SQUATS: ExerciseProfile = ExerciseProfile {
    kind: ExerciseKind::Squats,
    tracking: TrackingMode::Repetitions,
    rules: &[
        AngleRule {
            name: "knee",
            joints: [LEFT_HIP, LEFT_KNEE, LEFT_ANKLE],
            thresholds: &[
                below(50.0, "Knees too far forward"),
                above(130.0, "Knees not bent enough"),
            ],
        },
        AngleRule {
            name: "back",
            joints: [LEFT_SHOULDER, LEFT_HIP, LEFT_ANKLE],
            thresholds: &[below(140.0, "Keep your back straight")],
        },
    ],
    phase: None,
};

static PUSHUPS: ExerciseProfile = ExerciseProfile {
    kind: ExerciseKind::Pushups,
    tracking: TrackingMode::Repetitions,
    rules: &[
        AngleRule {
            name: "elbow",
            joints: [LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST],
            thresholds: &[
                below(60.0, "Elbows too wide"),
                above(120.0, "Elbows too narrow"),
            ],
        },
        AngleRule {
            name: "hip",
            joints: [LEFT_SHOULDER, LEFT_HIP, LEFT_KNEE],
            thresholds: &[below(140.0, "Keep your hips up")],
        },
    ],
    phase: None,
};

static PLANK: ExerciseProfile = ExerciseProfile {
    kind: ExerciseKind::Plank,
    tracking: TrackingMode::Hold,
    rules: &[AngleRule {
        name: "torso",
        joints: [LEFT_SHOULDER, LEFT_HIP, LEFT_KNEE],
        // Angles never exceed 180, so the upper bound is inert.
        thresholds: &[below(160.0, "Hips too high"), above(190.0, "Hips too low")],
    }],
    phase: None,
};

static CURLS: ExerciseProfile = ExerciseProfile {
    kind: ExerciseKind::Curls,
    tracking: TrackingMode::Repetitions,
    rules: &[AngleRule {
        name: "upper_arm",
        joints: [RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST],
        thresholds: &[at_least(25.0, KEEP_UPPER_ARM_STILL)],
    }],
    phase: Some(PhaseDetector {
        primary: [LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST],
        stability: [RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST],
        extended_above: 150.0,
        curled_below: 50.0,
        stable_below: 25.0,
        extend_mistake: "Extend your arm fully at the bottom",
        curl_mistake: "Curl the weight closer to your shoulder",
    }),
};

static JUMPING_JACKS: ExerciseProfile = ExerciseProfile {
    kind: ExerciseKind::JumpingJacks,
    tracking: TrackingMode::Repetitions,
    rules: &[
        AngleRule {
            name: "arm",
            joints: [LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST],
            thresholds: &[below(30.0, "Raise your arms higher")],
        },
        AngleRule {
            name: "leg",
            joints: [LEFT_HIP, LEFT_KNEE, LEFT_ANKLE],
            thresholds: &[below(30.0, "Spread your legs wider")],
        },
    ],
    phase: None,
};

static PULL_UPS: ExerciseProfile = ExerciseProfile {
    kind: ExerciseKind::PullUps,
    tracking: TrackingMode::Repetitions,
    rules: &[],
    phase: None,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_display_and_snake_case_names() {
        assert_eq!("Jumping Jacks".parse::<ExerciseKind>().unwrap(), ExerciseKind::JumpingJacks);
        assert_eq!("pull_ups".parse::<ExerciseKind>().unwrap(), ExerciseKind::PullUps);
        assert_eq!("Pull-ups".parse::<ExerciseKind>().unwrap(), ExerciseKind::PullUps);
        assert_eq!("SQUATS".parse::<ExerciseKind>().unwrap(), ExerciseKind::Squats);
    }

    #[test]
    fn rejects_unknown_exercises() {
        let err = "deadlift".parse::<ExerciseKind>().unwrap_err();
        assert!(format!("{err}").contains("deadlift"));
    }

    #[test]
    fn every_kind_has_a_matching_profile() {
        for kind in ExerciseKind::ALL {
            assert_eq!(kind.profile().kind, kind);
        }
    }

    #[test]
    fn only_plank_tracks_a_hold() {
        for kind in ExerciseKind::ALL {
            let hold = kind.profile().tracking == TrackingMode::Hold;
            assert_eq!(hold, kind == ExerciseKind::Plank);
        }
        assert!(ExerciseKind::Curls.profile().phase.is_some());
    }

    #[test]
    fn lower_bound_wins_over_upper_bound() {
        let knee = &SQUATS.rules[0];
        assert_eq!(knee.first_violation(40.0), Some("Knees too far forward"));
        assert_eq!(knee.first_violation(140.0), Some("Knees not bent enough"));
        assert_eq!(knee.first_violation(90.0), None);
    }

    #[test]
    fn at_least_bound_includes_limit() {
        assert!(Bound::AtLeast(25.0).violated_by(25.0));
        assert!(!Bound::Below(25.0).violated_by(25.0));
    }
}
