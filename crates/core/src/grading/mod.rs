//! Difficulty-graded threshold counter.
//!
//! A lighter alternative to the streak-gated pipeline. It reads raw
//! landmarks, counts a repetition each time the working joint swings from
//! one threshold to the other, and scales its tolerances with the athlete's
//! level.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::joint_angle;
use crate::landmarks::{
    Point, PoseFrame, LEFT_ANKLE, LEFT_ELBOW, LEFT_FOOT_INDEX, LEFT_HIP, LEFT_KNEE,
    LEFT_SHOULDER, LEFT_WRIST, NOSE,
};
use crate::{ExerciseKind, FormCoachError};

/// Knee may drift this far past the toes before it is flagged.
const KNEE_OVER_TOE: f32 = 0.1;
/// Maximum horizontal elbow drift for curls and plank elbow placement.
const ELBOW_DRIFT: f32 = 0.15;
/// Nose height that counts as chin over the bar.
const CHIN_OVER_BAR: f32 = 0.15;
/// Landmarks at or below this confidence are treated as missing.
const DEFAULT_VISIBILITY_THRESHOLD: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn thresholds(self) -> Thresholds {
        match self {
            Difficulty::Beginner => Thresholds {
                alignment_tolerance: 25.0,
                pushup_top: 150.0,
                pushup_bottom: 100.0,
                squat_depth: 100.0,
                squat_top: 160.0,
                curl_top: 150.0,
                curl_bottom: 70.0,
                pullup_arms: 150.0,
                plank_alignment: 25.0,
            },
            Difficulty::Intermediate => Thresholds {
                alignment_tolerance: 20.0,
                pushup_top: 155.0,
                pushup_bottom: 95.0,
                squat_depth: 95.0,
                squat_top: 165.0,
                curl_top: 155.0,
                curl_bottom: 65.0,
                pullup_arms: 155.0,
                plank_alignment: 20.0,
            },
            Difficulty::Advanced => Thresholds {
                alignment_tolerance: 15.0,
                pushup_top: 160.0,
                pushup_bottom: 90.0,
                squat_depth: 90.0,
                squat_top: 170.0,
                curl_top: 160.0,
                curl_bottom: 60.0,
                pullup_arms: 160.0,
                plank_alignment: 15.0,
            },
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "beginner"),
            Difficulty::Intermediate => write!(f, "intermediate"),
            Difficulty::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = FormCoachError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            _ => Err(FormCoachError::msg(format!("unknown difficulty `{s}`"))),
        }
    }
}

/// Angle limits in degrees for one difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub alignment_tolerance: f32,
    pub pushup_top: f32,
    pub pushup_bottom: f32,
    pub squat_depth: f32,
    pub squat_top: f32,
    pub curl_top: f32,
    pub curl_bottom: f32,
    pub pullup_arms: f32,
    pub plank_alignment: f32,
}

/// Count and coaching hints after one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Grade {
    pub count: u32,
    pub errors: Vec<&'static str>,
}

/// Top/bottom toggle counter for a single exercise.
#[derive(Debug, Clone)]
pub struct GradedCounter {
    exercise: ExerciseKind,
    thresholds: Thresholds,
    visibility_threshold: f32,
    armed: bool,
    count: u32,
    armed_elbow_x: Option<f32>,
}

impl GradedCounter {
    pub fn new(exercise: ExerciseKind, difficulty: Difficulty) -> Self {
        Self {
            exercise,
            thresholds: difficulty.thresholds(),
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            armed: false,
            count: 0,
            armed_elbow_x: None,
        }
    }

    pub fn with_visibility_threshold(mut self, visibility_threshold: f32) -> Self {
        self.visibility_threshold = visibility_threshold;
        self
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Grades one frame. Returns `None` when a landmark the exercise needs is
    /// missing or not visible enough, leaving the counter untouched.
    pub fn grade(&mut self, frame: &PoseFrame) -> Option<Grade> {
        let threshold = self.visibility_threshold;
        let point = |id: usize| {
            frame
                .landmark(id)
                .filter(|landmark| landmark.visibility > threshold)
                .map(|landmark| landmark.point())
        };
        let errors = match self.exercise {
            ExerciseKind::Pushups => self.pushups(
                point(LEFT_SHOULDER)?,
                point(LEFT_ELBOW)?,
                point(LEFT_WRIST)?,
                point(LEFT_HIP)?,
                point(LEFT_ANKLE)?,
            ),
            ExerciseKind::Squats => self.squats(
                point(LEFT_HIP)?,
                point(LEFT_KNEE)?,
                point(LEFT_ANKLE)?,
                point(LEFT_FOOT_INDEX)?,
            ),
            ExerciseKind::Curls => {
                self.curls(point(LEFT_SHOULDER)?, point(LEFT_ELBOW)?, point(LEFT_WRIST)?)
            }
            ExerciseKind::PullUps => self.pull_ups(
                point(NOSE)?,
                point(LEFT_SHOULDER)?,
                point(LEFT_ELBOW)?,
                point(LEFT_WRIST)?,
            ),
            ExerciseKind::Plank => self.plank(
                point(LEFT_SHOULDER)?,
                point(LEFT_ELBOW)?,
                point(LEFT_HIP)?,
                point(LEFT_ANKLE)?,
            ),
            ExerciseKind::JumpingJacks => Vec::new(),
        };

        Some(Grade {
            count: self.count,
            errors,
        })
    }

    fn bump(&mut self) {
        self.count += 1;
        self.armed = false;
        debug!(exercise = %self.exercise, count = self.count, "graded repetition");
    }

    fn pushups(&mut self, shoulder: Point, elbow: Point, wrist: Point, hip: Point, ankle: Point) -> Vec<&'static str> {
        let t = self.thresholds;
        let mut errors = Vec::new();

        let alignment = joint_angle(shoulder, hip, ankle);
        if (180.0 - alignment).abs() > t.alignment_tolerance {
            errors.push("Try to keep your body straighter. It's okay to start with knee push-ups!");
        }

        let elbow_angle = joint_angle(shoulder, elbow, wrist);
        if elbow_angle > t.pushup_top && !self.armed {
            self.armed = true;
        }
        if elbow_angle <= t.pushup_bottom && self.armed {
            self.bump();
        }
        if elbow_angle > t.pushup_bottom && self.armed {
            errors.push("Try to go a little lower if you can. Remember, any depth is better than none!");
        }

        errors
    }

    fn squats(&mut self, hip: Point, knee: Point, ankle: Point, toe: Point) -> Vec<&'static str> {
        let t = self.thresholds;
        let mut errors = Vec::new();

        let knee_angle = joint_angle(hip, knee, ankle);
        if knee_angle < t.squat_depth && !self.armed {
            self.armed = true;
        }
        if knee_angle > t.squat_top && self.armed {
            self.bump();
        }

        if knee_angle > t.squat_depth {
            errors.push("Lower yourself comfortably. Remember to keep your back straight!");
        }
        if knee.x > toe.x + KNEE_OVER_TOE {
            errors.push("Try to keep your knees from going too far forward.");
        }

        errors
    }

    fn curls(&mut self, shoulder: Point, elbow: Point, wrist: Point) -> Vec<&'static str> {
        let t = self.thresholds;
        let mut errors = Vec::new();

        let curl_angle = joint_angle(shoulder, elbow, wrist);
        if curl_angle > t.curl_top && !self.armed {
            self.armed = true;
            self.armed_elbow_x = Some(elbow.x);
        }
        if curl_angle < t.curl_bottom && self.armed {
            self.bump();
        }

        if let Some(anchor) = self.armed_elbow_x {
            if (elbow.x - anchor).abs() > ELBOW_DRIFT {
                errors.push("Try to keep your upper arm steady.");
            }
        }

        errors
    }

    fn pull_ups(&mut self, nose: Point, shoulder: Point, elbow: Point, wrist: Point) -> Vec<&'static str> {
        let arm_angle = joint_angle(shoulder, elbow, wrist);
        if arm_angle > self.thresholds.pullup_arms && !self.armed {
            self.armed = true;
        }
        if nose.y <= CHIN_OVER_BAR && self.armed {
            self.bump();
        }
        Vec::new()
    }

    fn plank(&mut self, shoulder: Point, elbow: Point, hip: Point, ankle: Point) -> Vec<&'static str> {
        let mut errors = Vec::new();

        let alignment = joint_angle(shoulder, hip, ankle);
        if (180.0 - alignment).abs() > self.thresholds.plank_alignment {
            errors.push("Focus on keeping your body as straight as you can.");
        }
        if (elbow.x - shoulder.x).abs() > ELBOW_DRIFT {
            errors.push("Try to keep your elbows under your shoulders.");
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{Landmark, LANDMARK_COUNT};

    fn frame(points: &[(usize, f32, f32)]) -> PoseFrame {
        let mut landmarks = vec![Landmark::new(0.0, 0.0, 1.0); LANDMARK_COUNT];
        for &(id, x, y) in points {
            landmarks[id] = Landmark::new(x, y, 1.0);
        }
        PoseFrame::new(0, landmarks)
    }

    /// Straight body, elbow bent to `elbow_deg`.
    fn pushup(elbow_deg: f32) -> PoseFrame {
        let radians = elbow_deg.to_radians();
        frame(&[
            (LEFT_SHOULDER, 0.4, 0.5),
            (LEFT_ELBOW, 0.5, 0.5),
            (LEFT_WRIST, 0.5 - 0.1 * radians.cos(), 0.5 + 0.1 * radians.sin()),
            (LEFT_HIP, 0.6, 0.5),
            (LEFT_ANKLE, 0.8, 0.5),
        ])
    }

    #[test]
    fn parses_difficulty() {
        assert_eq!("Advanced".parse::<Difficulty>().unwrap(), Difficulty::Advanced);
        assert!("expert".parse::<Difficulty>().is_err());
    }

    #[test]
    fn harder_levels_are_stricter() {
        let beginner = Difficulty::Beginner.thresholds();
        let advanced = Difficulty::Advanced.thresholds();
        assert!(advanced.squat_depth < beginner.squat_depth);
        assert!(advanced.alignment_tolerance < beginner.alignment_tolerance);
    }

    #[test]
    fn counts_pushup_cycle() {
        let mut counter = GradedCounter::new(ExerciseKind::Pushups, Difficulty::Beginner);

        let top = counter.grade(&pushup(170.0)).unwrap();
        assert_eq!(top.count, 0);
        assert_eq!(
            top.errors,
            vec!["Try to go a little lower if you can. Remember, any depth is better than none!"]
        );

        let bottom = counter.grade(&pushup(80.0)).unwrap();
        assert_eq!(bottom.count, 1);
        assert!(bottom.errors.is_empty());

        // Staying at the bottom does not count again.
        assert_eq!(counter.grade(&pushup(80.0)).unwrap().count, 1);
    }

    #[test]
    fn flags_sagging_plank() {
        let mut counter = GradedCounter::new(ExerciseKind::Plank, Difficulty::Advanced);
        let grade = counter
            .grade(&frame(&[
                (LEFT_SHOULDER, 0.2, 0.4),
                (LEFT_ELBOW, 0.5, 0.6),
                (LEFT_HIP, 0.5, 0.6),
                (LEFT_ANKLE, 0.8, 0.4),
            ]))
            .unwrap();
        assert_eq!(
            grade.errors,
            vec![
                "Focus on keeping your body as straight as you can.",
                "Try to keep your elbows under your shoulders.",
            ]
        );
    }

    #[test]
    fn pull_up_counts_when_chin_clears_bar() {
        let mut counter = GradedCounter::new(ExerciseKind::PullUps, Difficulty::Beginner);
        let hanging = frame(&[
            (NOSE, 0.5, 0.5),
            (LEFT_SHOULDER, 0.5, 0.4),
            (LEFT_ELBOW, 0.5, 0.3),
            (LEFT_WRIST, 0.5, 0.2),
        ]);
        let over_bar = frame(&[
            (NOSE, 0.5, 0.1),
            (LEFT_SHOULDER, 0.5, 0.2),
            (LEFT_ELBOW, 0.6, 0.15),
            (LEFT_WRIST, 0.5, 0.05),
        ]);

        counter.grade(&hanging);
        assert_eq!(counter.grade(&over_bar).unwrap().count, 1);
    }

    /// Thigh and shin meeting at `knee_deg`, foot tip at `toe_x`.
    fn squat(knee_deg: f32, toe_x: f32) -> PoseFrame {
        let radians = knee_deg.to_radians();
        frame(&[
            (LEFT_HIP, 0.5 + 0.2 * radians.sin(), 0.6 + 0.2 * radians.cos()),
            (LEFT_KNEE, 0.5, 0.6),
            (LEFT_ANKLE, 0.5, 0.8),
            (LEFT_FOOT_INDEX, toe_x, 0.8),
        ])
    }

    /// Upper arm hanging from the shoulder, forearm at `curl_deg`.
    fn curl(curl_deg: f32, elbow_x: f32) -> PoseFrame {
        let radians = curl_deg.to_radians();
        frame(&[
            (LEFT_SHOULDER, elbow_x, 0.3),
            (LEFT_ELBOW, elbow_x, 0.5),
            (LEFT_WRIST, elbow_x + 0.2 * radians.sin(), 0.5 - 0.2 * radians.cos()),
        ])
    }

    #[test]
    fn counts_squat_cycle() {
        let mut counter = GradedCounter::new(ExerciseKind::Squats, Difficulty::Beginner);
        let shallow = "Lower yourself comfortably. Remember to keep your back straight!";

        let standing = counter.grade(&squat(170.0, 0.5)).unwrap();
        assert_eq!(standing.count, 0);
        assert_eq!(standing.errors, vec![shallow]);

        let deep = counter.grade(&squat(80.0, 0.5)).unwrap();
        assert_eq!(deep.count, 0);
        assert!(deep.errors.is_empty());

        assert_eq!(counter.grade(&squat(170.0, 0.5)).unwrap().count, 1);
        // Back at the top without going deep again.
        assert_eq!(counter.grade(&squat(170.0, 0.5)).unwrap().count, 1);
    }

    #[test]
    fn flags_knee_past_toes() {
        let mut counter = GradedCounter::new(ExerciseKind::Squats, Difficulty::Beginner);
        let grade = counter.grade(&squat(80.0, 0.35)).unwrap();
        assert_eq!(grade.errors, vec!["Try to keep your knees from going too far forward."]);
    }

    #[test]
    fn counts_curl_and_flags_elbow_drift() {
        let mut counter = GradedCounter::new(ExerciseKind::Curls, Difficulty::Beginner);

        let extended = counter.grade(&curl(170.0, 0.5)).unwrap();
        assert_eq!(extended.count, 0);
        assert!(extended.errors.is_empty());

        let curled = counter.grade(&curl(40.0, 0.5)).unwrap();
        assert_eq!(curled.count, 1);
        assert!(curled.errors.is_empty());

        let drifted = counter.grade(&curl(100.0, 0.7)).unwrap();
        assert_eq!(drifted.errors, vec!["Try to keep your upper arm steady."]);
    }

    #[test]
    fn curl_drift_ignored_before_arming() {
        let mut counter = GradedCounter::new(ExerciseKind::Curls, Difficulty::Beginner);
        counter.grade(&curl(100.0, 0.5));
        assert!(counter.grade(&curl(100.0, 0.9)).unwrap().errors.is_empty());
    }

    #[test]
    fn jumping_jacks_have_no_errors() {
        let mut counter = GradedCounter::new(ExerciseKind::JumpingJacks, Difficulty::Advanced);
        let grade = counter.grade(&pushup(45.0)).unwrap();
        assert_eq!(grade, Grade::default());
    }

    #[test]
    fn low_visibility_landmark_skips_the_frame() {
        let mut counter = GradedCounter::new(ExerciseKind::Pushups, Difficulty::Beginner);
        let mut frame = pushup(170.0);
        frame.landmarks[LEFT_WRIST].visibility = 0.3;
        assert!(counter.grade(&frame).is_none());

        let mut counter = counter.with_visibility_threshold(0.2);
        assert!(counter.grade(&frame).is_some());
    }

    #[test]
    fn missing_landmarks_skip_the_frame() {
        let mut counter = GradedCounter::new(ExerciseKind::Squats, Difficulty::Beginner);
        assert!(counter.grade(&PoseFrame::empty(0)).is_none());
        assert_eq!(counter.count(), 0);
    }
}
