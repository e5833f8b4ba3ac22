//! Structured decisions emitted by a session.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A repetition passed the streak and debounce gates.
    RepConfirmed {
        rep: u32,
        remaining: u32,
        set: u32,
    },

    /// The stability filter counted a badly performed repetition.
    IncorrectRep { total: u32 },

    /// A good-form isometric hold began.
    HoldStarted,

    /// An isometric hold ended because form broke.
    HoldBroken {
        /// How long the hold lasted
        duration_ms: u64,
    },

    /// The target repetitions for a set were reached.
    SetCompleted { set: u32 },

    /// The inter-set pause elapsed and a new set began.
    SetStarted { set: u32, total_sets: u32 },

    /// The final set finished; capture should be released.
    ExerciseCompleted { total_sets: u32 },
}

impl SessionEvent {
    /// Feedback line shown for progression events.
    pub fn progress_message(&self) -> Option<String> {
        match self {
            SessionEvent::SetCompleted { set } => Some(format!("Great job! Set {set} completed!")),
            SessionEvent::SetStarted { set, total_sets } => {
                Some(format!("Starting set {set} of {total_sets}"))
            }
            SessionEvent::ExerciseCompleted { total_sets } => Some(format!(
                "Congratulations! You've completed all {total_sets} sets!"
            )),
            _ => None,
        }
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::RepConfirmed { rep, remaining, set } => {
                write!(f, "REP_CONFIRMED (rep {rep}, {remaining} left in set {set})")
            }
            SessionEvent::IncorrectRep { total } => write!(f, "INCORRECT_REP ({total} total)"),
            SessionEvent::HoldStarted => write!(f, "HOLD_STARTED"),
            SessionEvent::HoldBroken { duration_ms } => write!(f, "HOLD_BROKEN ({duration_ms}ms)"),
            SessionEvent::SetCompleted { set } => write!(f, "SET_COMPLETED ({set})"),
            SessionEvent::SetStarted { set, total_sets } => {
                write!(f, "SET_STARTED ({set}/{total_sets})")
            }
            SessionEvent::ExerciseCompleted { total_sets } => {
                write!(f, "EXERCISE_COMPLETED ({total_sets} sets)")
            }
        }
    }
}
