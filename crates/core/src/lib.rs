//! Core library for the Form Coach exercise analysis engine.
//!
//! The crate turns a stream of body-landmark frames from an external pose
//! estimator into structured coaching decisions: smoothed landmarks, joint
//! angles, per-exercise form mistakes, confirmed repetitions, isometric hold
//! times and set progression. Each module owns one stage of that pipeline and
//! [`Session`] wires them together for a single exercise run.

pub mod classify;
pub mod config;
pub mod error;
pub mod events;
pub mod geometry;
pub mod grading;
pub mod landmarks;
pub mod plank;
pub mod profile;
pub mod progression;
pub mod session;
pub mod smoothing;
pub mod timeline;
pub mod tracker;

pub use classify::{classify, Classification, PhaseReading};
pub use config::{AppConfig, EngineConfig, SessionConfig};
pub use error::{FormCoachError, Result};
pub use events::SessionEvent;
pub use geometry::joint_angle;
pub use grading::{Difficulty, Grade, GradedCounter};
pub use landmarks::{Landmark, Point, PoseFrame};
pub use plank::{PlankState, PlankTracker};
pub use profile::{ExerciseKind, ExerciseProfile, TrackingMode};
pub use progression::{SetPhase, SetProgressionController, SetState};
pub use session::{FrameDisposition, FrameOutcome, Session, SessionSnapshot, SessionStatus};
pub use smoothing::{LandmarkSmoother, SmoothedLandmarks};
pub use timeline::{ScheduledEvent, Scheduler, SessionClock, TimerId};
pub use tracker::{CurlPhase, RepetitionState, RepetitionTracker};
