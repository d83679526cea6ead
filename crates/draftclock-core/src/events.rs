use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::{FailPolicy, GoalKind};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The user stopped it.
    Explicit,
    /// A new session was started over it.
    Replaced,
    /// The host closed the surface.
    SurfaceGone,
    /// Stall grace ran out.
    Failed,
    /// Goal reached.
    Finished,
}

/// Every session lifecycle change produces an Event.
/// The CLI turns outcome events into user notices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_id: Uuid,
        goal_kind: GoalKind,
        goal_amount: u32,
        at: DateTime<Utc>,
    },
    SessionStopped {
        session_id: Uuid,
        reason: StopReason,
        at: DateTime<Utc>,
    },
    /// The stall penalty fired and the draft was wiped.
    TimeExpired {
        session_id: Uuid,
        fail_policy: FailPolicy,
        lost_chars: usize,
        /// True when the wiped text went to the recoverable store.
        stashed: bool,
        #[serde(default)]
        stash_error: Option<String>,
        #[serde(default)]
        save_error: Option<String>,
        at: DateTime<Utc>,
    },
    /// The goal was reached.
    DraftFinished {
        session_id: Uuid,
        goal_kind: GoalKind,
        words: usize,
        chars: usize,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn session_id(&self) -> Uuid {
        match self {
            Event::SessionStarted { session_id, .. }
            | Event::SessionStopped { session_id, .. }
            | Event::TimeExpired { session_id, .. }
            | Event::DraftFinished { session_id, .. } => *session_id,
        }
    }

    /// User-facing notice for outcome events.
    pub fn notice(&self) -> Option<String> {
        match self {
            Event::TimeExpired {
                stashed,
                save_error,
                stash_error,
                ..
            } => {
                let mut msg = String::from("Time expired");
                if *stashed {
                    msg.push_str(" (draft stashed; `draftclock recover` prints it)");
                }
                if let Some(err) = stash_error {
                    msg.push_str(&format!("; could not stash draft: {err}"));
                }
                if let Some(err) = save_error {
                    msg.push_str(&format!("; save failed: {err}"));
                }
                Some(msg)
            }
            Event::DraftFinished { words, .. } => {
                Some(format!("Drafting finished ({words} words)"))
            }
            _ => None,
        }
    }
}
