//! Set and exercise progression.
//!
//! States run `InProgress(n) -> SetComplete(n) -> InProgress(n + 1)` with a
//! fixed pause between sets, ending in `ExerciseComplete` after the last set.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::events::SessionEvent;
use crate::timeline::{Scheduler, TimerId};

/// Snapshot of set progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetState {
    pub current_set: u32,
    pub total_sets: u32,
    pub set_complete: bool,
    pub exercise_complete: bool,
}

impl SetState {
    pub fn new(total_sets: u32) -> Self {
        Self {
            current_set: 1,
            total_sets,
            set_complete: false,
            exercise_complete: false,
        }
    }
}

/// Named view over [`SetState`] flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetPhase {
    InProgress(u32),
    SetComplete(u32),
    ExerciseComplete,
}

impl fmt::Display for SetPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetPhase::InProgress(set) => write!(f, "InProgress({set})"),
            SetPhase::SetComplete(set) => write!(f, "SetComplete({set})"),
            SetPhase::ExerciseComplete => write!(f, "ExerciseComplete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AdvanceSet;

#[derive(Debug)]
pub struct SetProgressionController {
    state: SetState,
    pause_ms: u64,
    scheduler: Scheduler<AdvanceSet>,
    pending: Option<TimerId>,
}

impl SetProgressionController {
    pub fn new(total_sets: u32, pause_ms: u64) -> Self {
        Self {
            state: SetState::new(total_sets),
            pause_ms,
            scheduler: Scheduler::new(),
            pending: None,
        }
    }

    pub fn state(&self) -> SetState {
        self.state
    }

    pub fn phase(&self) -> SetPhase {
        if self.state.exercise_complete {
            SetPhase::ExerciseComplete
        } else if self.state.set_complete {
            SetPhase::SetComplete(self.state.current_set)
        } else {
            SetPhase::InProgress(self.state.current_set)
        }
    }

    /// True while waiting for the inter-set pause to elapse.
    pub fn is_paused(&self) -> bool {
        self.pending
            .map(|id| self.scheduler.is_pending(id))
            .unwrap_or(false)
    }

    /// When the pending set transition fires, if one is scheduled.
    pub fn resumes_at(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    /// Evaluates the confirmed count against the set target.
    pub fn on_reps(&mut self, confirmed_reps: u32, target_reps: u32, now: u64) -> Vec<SessionEvent> {
        if confirmed_reps < target_reps || self.state.set_complete {
            return Vec::new();
        }

        self.state.set_complete = true;
        let set = self.state.current_set;
        info!(phase = %self.phase(), total = self.state.total_sets, "set completed");
        let mut events = vec![SessionEvent::SetCompleted { set }];

        if set < self.state.total_sets {
            self.pending = Some(self.scheduler.schedule(now + self.pause_ms, AdvanceSet));
        } else {
            self.state.exercise_complete = true;
            info!(phase = %self.phase(), total_sets = self.state.total_sets, "exercise completed");
            events.push(SessionEvent::ExerciseCompleted {
                total_sets: self.state.total_sets,
            });
        }

        events
    }

    /// Fires the pending transition once `now` reaches its due time. Returns
    /// the event for the new set; the caller resets the repetition count.
    pub fn poll(&mut self, now: u64) -> Option<SessionEvent> {
        let fired = self.scheduler.take_due(now);
        let due = fired
            .iter()
            .any(|event| Some(event.id) == self.pending && event.payload == AdvanceSet);
        if !due {
            return None;
        }

        self.pending = None;
        self.state.current_set += 1;
        self.state.set_complete = false;
        info!(phase = %self.phase(), total = self.state.total_sets, "set started");

        Some(SessionEvent::SetStarted {
            set: self.state.current_set,
            total_sets: self.state.total_sets,
        })
    }

    /// Invalidates the pending transition so it can never fire.
    pub fn cancel_pending(&mut self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel(id);
        }
        self.scheduler.cancel_all();
    }

    /// Back to set one with all flags cleared.
    pub fn reset(&mut self, total_sets: u32) {
        self.cancel_pending();
        self.state = SetState::new(total_sets);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_set_and_schedules_pause() {
        let mut progression = SetProgressionController::new(2, 3000);
        assert!(progression.on_reps(2, 3, 0).is_empty());

        let events = progression.on_reps(3, 3, 1000);
        assert_eq!(events, vec![SessionEvent::SetCompleted { set: 1 }]);
        assert_eq!(progression.phase(), SetPhase::SetComplete(1));
        assert_eq!(progression.phase().to_string(), "SetComplete(1)");
        assert!(progression.is_paused());
        assert_eq!(progression.resumes_at(), Some(4000));

        // Already complete: no duplicate completion.
        assert!(progression.on_reps(3, 3, 1100).is_empty());
    }

    #[test]
    fn advances_after_pause() {
        let mut progression = SetProgressionController::new(2, 3000);
        progression.on_reps(3, 3, 1000);

        assert_eq!(progression.poll(3999), None);
        assert_eq!(
            progression.poll(4000),
            Some(SessionEvent::SetStarted { set: 2, total_sets: 2 })
        );
        let state = progression.state();
        assert_eq!(state.current_set, 2);
        assert!(!state.set_complete);
        assert!(!progression.is_paused());
    }

    #[test]
    fn last_set_completes_exercise() {
        let mut progression = SetProgressionController::new(1, 3000);
        let events = progression.on_reps(3, 3, 0);
        assert_eq!(
            events,
            vec![
                SessionEvent::SetCompleted { set: 1 },
                SessionEvent::ExerciseCompleted { total_sets: 1 },
            ]
        );
        let state = progression.state();
        assert!(state.exercise_complete && state.set_complete);
        assert_eq!(state.current_set, state.total_sets);
        assert!(!progression.is_paused());
    }

    #[test]
    fn cancelled_transition_never_fires() {
        let mut progression = SetProgressionController::new(3, 3000);
        progression.on_reps(3, 3, 0);
        progression.cancel_pending();
        assert_eq!(progression.poll(10_000), None);
        assert_eq!(progression.state().current_set, 1);
    }

    #[test]
    fn reset_returns_to_first_set() {
        let mut progression = SetProgressionController::new(2, 3000);
        progression.on_reps(3, 3, 0);
        progression.poll(3000);
        progression.reset(4);
        assert_eq!(progression.state(), SetState::new(4));
        assert_eq!(progression.phase(), SetPhase::InProgress(1));
    }
}
