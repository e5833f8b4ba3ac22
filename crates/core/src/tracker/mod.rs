//! Repetition counting.
//!
//! A repetition is confirmed after a streak of mistake-free frames, at most
//! once per debounce window and never beyond the set's target. Curl-type
//! exercises additionally run a two-phase detector whose mistakes depend on
//! which half of the movement the arm is believed to be in.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classify::{Classification, PhaseReading};
use crate::profile::PhaseDetector;

/// Which half-cycle the curl detector believes the working arm is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurlPhase {
    #[default]
    Neutral,
    Up,
    Down,
}

impl fmt::Display for CurlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurlPhase::Neutral => write!(f, "neutral"),
            CurlPhase::Up => write!(f, "up"),
            CurlPhase::Down => write!(f, "down"),
        }
    }
}

/// Two-phase state machine for curls.
#[derive(Debug, Clone)]
pub struct CurlPhaseTracker {
    detector: PhaseDetector,
    phase: CurlPhase,
}

impl CurlPhaseTracker {
    pub fn new(detector: PhaseDetector) -> Self {
        Self {
            detector,
            phase: CurlPhase::Neutral,
        }
    }

    pub fn phase(&self) -> CurlPhase {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = CurlPhase::Neutral;
    }

    /// Advances the phase from one reading and returns the phase-conditional
    /// mistake, if any. Only one phase is active, so the "extend" and "curl"
    /// mistakes are never reported together. `Neutral` has no outgoing
    /// transition.
    pub fn observe(&mut self, reading: PhaseReading) -> Option<&'static str> {
        let extended = reading.primary_angle > self.detector.extended_above;
        let curled = reading.primary_angle < self.detector.curled_below;
        let stable = reading.stability_angle < self.detector.stable_below;

        let next = match self.phase {
            CurlPhase::Down if extended => CurlPhase::Up,
            CurlPhase::Up if curled && stable => CurlPhase::Down,
            current => current,
        };

        if next != self.phase {
            debug!(from = %self.phase, to = %next, angle = reading.primary_angle, "curl phase transition");
            self.phase = next;
        }

        match self.phase {
            CurlPhase::Up if !extended => Some(self.detector.extend_mistake),
            CurlPhase::Down if !curled => Some(self.detector.curl_mistake),
            _ => None,
        }
    }
}

/// Counters owned by the repetition tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepetitionState {
    pub confirmed_reps: u32,
    pub target_reps: u32,
    pub correct_streak: u32,
    pub incorrect_reps: u32,
    /// Timestamp of the last confirmed repetition, in milliseconds.
    pub last_confirmed_at: Option<u64>,
    pub phase: CurlPhase,
}

impl RepetitionState {
    pub fn new(target_reps: u32) -> Self {
        Self {
            confirmed_reps: 0,
            target_reps,
            correct_streak: 0,
            incorrect_reps: 0,
            last_confirmed_at: None,
            phase: CurlPhase::Neutral,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.target_reps.saturating_sub(self.confirmed_reps)
    }
}

/// What a single frame did to the repetition counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepDecision {
    /// A repetition was confirmed; carries the new count.
    Confirmed(u32),
    /// Mistake-free frame that did not (yet) confirm a repetition.
    Streak,
    /// Mistakes were reported; `incorrect_rep` is set when the stability
    /// filter counted them as an incorrect repetition.
    Mistakes { incorrect_rep: bool },
    /// Some rules could not be evaluated and none fired.
    NoVerdict,
}

/// Debounced, streak-gated repetition counter for one exercise session.
#[derive(Debug, Clone)]
pub struct RepetitionTracker {
    state: RepetitionState,
    feedback: Vec<String>,
    min_correct_streak: u32,
    debounce_ms: u64,
    curl: Option<CurlPhaseTracker>,
}

impl RepetitionTracker {
    pub fn new(target_reps: u32, min_correct_streak: u32, debounce_ms: u64) -> Self {
        Self {
            state: RepetitionState::new(target_reps),
            feedback: Vec::new(),
            min_correct_streak,
            debounce_ms,
            curl: None,
        }
    }

    /// Enables the two-phase curl detector.
    pub fn with_phase_detector(mut self, detector: PhaseDetector) -> Self {
        self.curl = Some(CurlPhaseTracker::new(detector));
        self
    }

    pub fn state(&self) -> &RepetitionState {
        &self.state
    }

    pub fn feedback(&self) -> &[String] {
        &self.feedback
    }

    pub fn set_feedback(&mut self, feedback: Vec<String>) {
        self.feedback = feedback;
    }

    /// Feeds one classified frame taken at `now` milliseconds.
    pub fn update(&mut self, classification: &Classification, now: u64, current_set: u32) -> RepDecision {
        let mut mistakes = Vec::with_capacity(classification.mistakes.len() + 1);

        if let (Some(curl), Some(reading)) = (self.curl.as_mut(), classification.phase) {
            mistakes.extend(curl.observe(reading));
            self.state.phase = curl.phase();
        }
        mistakes.extend(classification.mistakes.iter().copied());

        if !mistakes.is_empty() {
            return self.record_mistakes(&mistakes);
        }

        if classification.unevaluated > 0 {
            debug!(unevaluated = classification.unevaluated, "frame left without verdict");
            return RepDecision::NoVerdict;
        }

        self.record_clean_frame(now, current_set)
    }

    fn record_clean_frame(&mut self, now: u64, current_set: u32) -> RepDecision {
        self.state.correct_streak += 1;

        let debounced = self
            .state
            .last_confirmed_at
            .map(|last| now.saturating_sub(last) < self.debounce_ms)
            .unwrap_or(false);

        if self.state.correct_streak < self.min_correct_streak
            || self.state.confirmed_reps >= self.state.target_reps
            || debounced
        {
            return RepDecision::Streak;
        }

        self.state.confirmed_reps += 1;
        self.state.correct_streak = 0;
        self.state.last_confirmed_at = Some(now);

        let rep = self.state.confirmed_reps;
        self.feedback = vec![
            format!("Great form! Rep {rep} completed!"),
            format!("{} reps remaining in set {current_set}", self.state.remaining()),
        ];

        info!(rep, target = self.state.target_reps, set = current_set, "repetition confirmed");
        RepDecision::Confirmed(rep)
    }

    fn record_mistakes(&mut self, mistakes: &[&'static str]) -> RepDecision {
        self.state.correct_streak = 0;

        let incorrect_rep = mistakes.len() >= 2
            && mistakes
                .iter()
                .all(|mistake| self.feedback.iter().any(|shown| shown == mistake));

        if incorrect_rep {
            self.state.incorrect_reps += 1;
            debug!(total = self.state.incorrect_reps, "incorrect repetition counted");
        }

        self.feedback = mistakes.iter().map(|mistake| mistake.to_string()).collect();
        RepDecision::Mistakes { incorrect_rep }
    }

    /// Prepares for the next set; incorrect repetitions carry over.
    pub fn start_next_set(&mut self) {
        self.state.confirmed_reps = 0;
        self.state.correct_streak = 0;
        self.reset_phase();
    }

    /// Drops transient per-movement state but keeps the counters readable.
    pub fn clear_transient(&mut self) {
        self.state.correct_streak = 0;
        self.reset_phase();
    }

    /// Full reset, optionally with a new target.
    pub fn reset(&mut self, target_reps: u32) {
        self.state = RepetitionState::new(target_reps);
        self.feedback.clear();
        self.reset_phase();
    }

    fn reset_phase(&mut self) {
        if let Some(curl) = self.curl.as_mut() {
            curl.reset();
        }
        self.state.phase = CurlPhase::Neutral;
    }
}
