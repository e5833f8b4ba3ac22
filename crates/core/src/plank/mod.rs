use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classify::Classification;

/// Hold state for isometric exercises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlankState {
    /// When the current good-form hold began, `None` while not holding.
    pub hold_started_at: Option<u64>,
}

impl PlankState {
    /// Length of the active hold at `now`, if any.
    pub fn hold_duration_ms(&self, now: u64) -> Option<u64> {
        self.hold_started_at
            .map(|started| now.saturating_sub(started))
    }
}

/// What a single frame did to the hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldDecision {
    Started,
    Holding,
    /// The hold ended after the given number of milliseconds.
    Broken(u64),
    /// Mistakes while no hold was active.
    Mistakes,
    NoVerdict,
}

/// Times continuous good-form holds.
#[derive(Debug, Clone, Default)]
pub struct PlankTracker {
    state: PlankState,
    feedback: Vec<String>,
}

impl PlankTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlankState {
        self.state
    }

    pub fn feedback(&self) -> &[String] {
        &self.feedback
    }

    pub fn update(&mut self, classification: &Classification, now: u64) -> HoldDecision {
        if classification.is_inconclusive() {
            return HoldDecision::NoVerdict;
        }

        if classification.mistakes.is_empty() {
            if self.state.hold_started_at.is_some() {
                return HoldDecision::Holding;
            }
            self.state.hold_started_at = Some(now);
            self.feedback = vec!["Good plank form! Keep it up!".to_string()];
            info!(at = now, "plank hold started");
            return HoldDecision::Started;
        }

        let mistakes = classification.mistakes.iter().map(|mistake| mistake.to_string());

        match self.state.hold_duration_ms(now) {
            Some(duration_ms) => {
                self.state.hold_started_at = None;
                self.feedback = std::iter::once(format!(
                    "Plank broken after {:.1}s!",
                    duration_ms as f64 / 1000.0
                ))
                .chain(mistakes)
                .collect();
                info!(duration_ms, "plank hold broken");
                HoldDecision::Broken(duration_ms)
            }
            None => {
                self.feedback = mistakes.collect();
                HoldDecision::Mistakes
            }
        }
    }

    /// Abandons any active hold without reporting it.
    pub fn clear_transient(&mut self) {
        self.state.hold_started_at = None;
    }

    pub fn reset(&mut self) {
        self.state = PlankState::default();
        self.feedback.clear();
    }
}
