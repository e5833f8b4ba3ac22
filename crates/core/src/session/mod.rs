//! Frame pipeline for one exercise session.
//!
//! Each frame flows smoother -> classifier -> repetition or plank tracker ->
//! set progression. All state lives in [`Session`] and time only advances
//! through the timestamps handed in, so the pipeline runs unchanged against a
//! live camera or a recorded replay.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classify::classify_profile;
use crate::config::{EngineConfig, SessionConfig};
use crate::events::SessionEvent;
use crate::landmarks::PoseFrame;
use crate::plank::{HoldDecision, PlankState, PlankTracker};
use crate::profile::{ExerciseKind, TrackingMode};
use crate::progression::{SetProgressionController, SetState};
use crate::smoothing::LandmarkSmoother;
use crate::timeline::SessionClock;
use crate::tracker::{RepDecision, RepetitionState, RepetitionTracker};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Configured but never started.
    Idle,
    Running,
    /// Stopped by the host; counters stay readable.
    Stopped,
    /// Every set is done. No further frames are processed.
    Finished,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "idle"),
            SessionStatus::Running => write!(f, "running"),
            SessionStatus::Stopped => write!(f, "stopped"),
            SessionStatus::Finished => write!(f, "finished"),
        }
    }
}

/// Why a frame did or did not reach the trackers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameDisposition {
    Processed,
    /// The estimator reported no landmarks, or none above the visibility
    /// threshold.
    NoLandmarks,
    /// Dropped during the pause between sets.
    SetPause,
    /// The session is not running.
    Inactive,
}

/// Everything the host needs to react to one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameOutcome {
    pub disposition: FrameDisposition,
    pub events: Vec<SessionEvent>,
    /// Current feedback lines after this frame.
    pub feedback: Vec<String>,
    /// Set once the exercise is complete; the capture driver should release
    /// the camera.
    pub stop_capture: bool,
}

impl FrameOutcome {
    fn new(disposition: FrameDisposition) -> Self {
        Self {
            disposition,
            events: Vec::new(),
            feedback: Vec::new(),
            stop_capture: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlankSnapshot {
    pub hold_started_at: Option<u64>,
    pub hold_duration_ms: Option<u64>,
}

/// Read-only view for UI collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub exercise: ExerciseKind,
    pub status: SessionStatus,
    pub repetition: Option<RepetitionState>,
    pub set: SetState,
    pub plank: Option<PlankSnapshot>,
    pub feedback: Vec<String>,
    pub paused_until: Option<u64>,
}

#[derive(Debug, Clone)]
enum Counter {
    Reps(RepetitionTracker),
    Hold(PlankTracker),
}

impl Counter {
    fn for_session(config: &SessionConfig, engine: &EngineConfig) -> Self {
        let profile = config.exercise.profile();
        match profile.tracking {
            TrackingMode::Hold => Counter::Hold(PlankTracker::new()),
            TrackingMode::Repetitions => {
                let tracker = RepetitionTracker::new(
                    config.target_reps,
                    engine.min_correct_streak,
                    engine.rep_debounce_ms,
                );
                Counter::Reps(match profile.phase {
                    Some(detector) => tracker.with_phase_detector(detector),
                    None => tracker,
                })
            }
        }
    }

    fn feedback(&self) -> &[String] {
        match self {
            Counter::Reps(tracker) => tracker.feedback(),
            Counter::Hold(plank) => plank.feedback(),
        }
    }

    fn clear_transient(&mut self) {
        match self {
            Counter::Reps(tracker) => tracker.clear_transient(),
            Counter::Hold(plank) => plank.clear_transient(),
        }
    }
}

/// One exercise + set sequence, from start to completion or stop.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    engine: EngineConfig,
    smoother: LandmarkSmoother,
    counter: Counter,
    progression: SetProgressionController,
    clock: SessionClock,
    status: SessionStatus,
}

impl Session {
    pub fn new(config: SessionConfig, engine: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            smoother: LandmarkSmoother::new(engine.smoothing_alpha, engine.visibility_threshold),
            counter: Counter::for_session(&config, &engine),
            progression: SetProgressionController::new(config.total_sets, engine.set_pause_ms),
            clock: SessionClock::default(),
            status: SessionStatus::Idle,
            config,
            engine,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn feedback(&self) -> &[String] {
        self.counter.feedback()
    }

    /// Begins a fresh session at `now` milliseconds.
    pub fn start(&mut self, now: u64) {
        self.reset_all();
        self.clock.reset(now);
        self.status = SessionStatus::Running;
        info!(
            exercise = %self.config.exercise,
            target_reps = self.config.target_reps,
            total_sets = self.config.total_sets,
            "session started"
        );
    }

    /// Stops processing. Pending set transitions are cancelled and smoothing
    /// and phase state are cleared; counters keep their last values.
    pub fn stop(&mut self) {
        self.progression.cancel_pending();
        self.smoother.reset();
        self.counter.clear_transient();
        if self.status == SessionStatus::Running {
            self.status = SessionStatus::Stopped;
        }
        info!(status = %self.status, "session stopped");
    }

    /// Changes reps and sets; counters restart from set one.
    pub fn reconfigure(&mut self, target_reps: u32, total_sets: u32) -> Result<()> {
        let config = SessionConfig {
            target_reps,
            total_sets,
            ..self.config
        };
        config.validate()?;
        self.config = config;
        self.reset_all();
        info!(target_reps, total_sets, "session reconfigured");
        Ok(())
    }

    /// Switches exercise; counters restart from set one.
    pub fn set_exercise(&mut self, exercise: ExerciseKind) {
        self.config.exercise = exercise;
        self.reset_all();
        info!(%exercise, "exercise changed");
    }

    fn reset_all(&mut self) {
        self.smoother.reset();
        self.counter = Counter::for_session(&self.config, &self.engine);
        self.progression.reset(self.config.total_sets);
        if self.status == SessionStatus::Finished {
            self.status = SessionStatus::Stopped;
        }
    }

    /// Fires any deferred transition that is due at `now` without a frame.
    pub fn tick(&mut self, now: u64) -> FrameOutcome {
        let mut outcome = FrameOutcome::new(FrameDisposition::Processed);
        if self.status == SessionStatus::Running {
            let now = self.clock.advance_to(now);
            self.fire_due(now, &mut outcome);
        } else {
            outcome.disposition = FrameDisposition::Inactive;
        }
        outcome.feedback = self.feedback().to_vec();
        outcome
    }

    /// Runs one pose frame through the pipeline.
    pub fn process_frame(&mut self, frame: &PoseFrame) -> FrameOutcome {
        if self.status != SessionStatus::Running {
            let mut outcome = FrameOutcome::new(FrameDisposition::Inactive);
            outcome.feedback = self.feedback().to_vec();
            return outcome;
        }

        let now = self.clock.advance_to(frame.timestamp_ms);
        let mut outcome = FrameOutcome::new(FrameDisposition::Processed);
        self.fire_due(now, &mut outcome);

        if self.progression.is_paused() {
            outcome.disposition = FrameDisposition::SetPause;
        } else if frame.is_empty() {
            outcome.disposition = FrameDisposition::NoLandmarks;
        } else {
            self.track(frame, now, &mut outcome);
        }

        outcome.feedback = self.feedback().to_vec();
        outcome
    }

    fn track(&mut self, frame: &PoseFrame, now: u64, outcome: &mut FrameOutcome) {
        let smoothed = self.smoother.smooth(frame);
        if smoothed.is_empty() {
            debug!(at = now, "no landmark above visibility threshold");
            outcome.disposition = FrameDisposition::NoLandmarks;
            return;
        }

        let classification = classify_profile(&smoothed, self.config.exercise.profile());
        debug!(
            at = now,
            visible = smoothed.len(),
            mistakes = classification.mistakes.len(),
            unevaluated = classification.unevaluated,
            "frame classified"
        );

        let current_set = self.progression.state().current_set;
        match &mut self.counter {
            Counter::Hold(plank) => match plank.update(&classification, now) {
                HoldDecision::Started => outcome.events.push(SessionEvent::HoldStarted),
                HoldDecision::Broken(duration_ms) => {
                    outcome.events.push(SessionEvent::HoldBroken { duration_ms })
                }
                HoldDecision::Holding | HoldDecision::Mistakes | HoldDecision::NoVerdict => {}
            },
            Counter::Reps(tracker) => match tracker.update(&classification, now, current_set) {
                RepDecision::Confirmed(rep) => {
                    let state = tracker.state();
                    outcome.events.push(SessionEvent::RepConfirmed {
                        rep,
                        remaining: state.remaining(),
                        set: current_set,
                    });
                    let progress =
                        self.progression
                            .on_reps(state.confirmed_reps, state.target_reps, now);
                    Self::announce(tracker, &progress);
                    outcome.events.extend(progress);
                }
                RepDecision::Mistakes { incorrect_rep: true } => {
                    outcome.events.push(SessionEvent::IncorrectRep {
                        total: tracker.state().incorrect_reps,
                    });
                }
                RepDecision::Mistakes { .. } | RepDecision::Streak | RepDecision::NoVerdict => {}
            },
        }

        if self.progression.state().exercise_complete {
            self.finish();
            outcome.stop_capture = true;
        }
    }

    fn fire_due(&mut self, now: u64, outcome: &mut FrameOutcome) {
        if let Some(event) = self.progression.poll(now) {
            if let Counter::Reps(tracker) = &mut self.counter {
                tracker.start_next_set();
                Self::announce(tracker, std::slice::from_ref(&event));
            }
            outcome.events.push(event);
        }
    }

    fn announce(tracker: &mut RepetitionTracker, events: &[SessionEvent]) {
        if let Some(message) = events.iter().filter_map(SessionEvent::progress_message).last() {
            tracker.set_feedback(vec![message]);
        }
    }

    fn finish(&mut self) {
        self.smoother.reset();
        self.counter.clear_transient();
        self.status = SessionStatus::Finished;
        info!("exercise complete, releasing capture");
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let (repetition, plank) = match &self.counter {
            Counter::Reps(tracker) => (Some(tracker.state().clone()), None),
            Counter::Hold(plank) => {
                let state: PlankState = plank.state();
                (
                    None,
                    Some(PlankSnapshot {
                        hold_started_at: state.hold_started_at,
                        hold_duration_ms: state.hold_duration_ms(self.clock.now_ms),
                    }),
                )
            }
        };

        SessionSnapshot {
            exercise: self.config.exercise,
            status: self.status,
            repetition,
            set: self.progression.state(),
            plank,
            feedback: self.feedback().to_vec(),
            paused_until: self.progression.resumes_at(),
        }
    }
}
