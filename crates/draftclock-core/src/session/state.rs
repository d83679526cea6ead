use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tracker::StallTracker;
use crate::surface::SubscriptionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    /// Write for `goal_amount` minutes.
    #[default]
    Time,
    /// Write `goal_amount` words.
    WordCount,
}

impl fmt::Display for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalKind::Time => f.write_str("time"),
            GoalKind::WordCount => f.write_str("word_count"),
        }
    }
}

impl FromStr for GoalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(GoalKind::Time),
            "word_count" | "words" => Ok(GoalKind::WordCount),
            other => Err(format!("unknown goal kind '{other}' (expected time or word_count)")),
        }
    }
}

/// What happens to the draft when the stall clock runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailPolicy {
    /// Wipe the draft but stash it in the recoverable store.
    #[default]
    Kill,
    /// Wipe the draft for good.
    Delete,
}

impl fmt::Display for FailPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailPolicy::Kill => f.write_str("kill"),
            FailPolicy::Delete => f.write_str("delete"),
        }
    }
}

impl FromStr for FailPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kill" => Ok(FailPolicy::Kill),
            "delete" => Ok(FailPolicy::Delete),
            other => Err(format!("unknown fail policy '{other}' (expected kill or delete)")),
        }
    }
}

pub const DEFAULT_GRACE_SECONDS: u32 = 5;

/// Per-session knobs that are not the goal itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    pub grace_seconds: u32,
    pub fail_policy: FailPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            grace_seconds: DEFAULT_GRACE_SECONDS,
            fail_policy: FailPolicy::default(),
        }
    }
}

/// Progress toward the goal as of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Words(usize),
    /// Whole seconds until the deadline, rounded up; zero or negative once
    /// it has passed.
    SecondsLeft(i64),
}

impl Progress {
    /// Time left until `deadline`. A partial second still counts as one, so
    /// the goal is never reported reached before the deadline itself.
    pub fn until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let ms = (deadline - now).num_milliseconds();
        Progress::SecondsLeft(ms.div_euclid(1000) + i64::from(ms.rem_euclid(1000) > 0))
    }

    pub fn goal_reached(&self, goal_amount: u32) -> bool {
        match *self {
            Progress::Words(words) => words >= goal_amount as usize,
            Progress::SecondsLeft(secs) => secs <= 0,
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Progress::Words(words) => write!(f, "{words}"),
            Progress::SecondsLeft(secs) => {
                let sign = if secs < 0 { "-" } else { "" };
                let secs = secs.unsigned_abs();
                write!(f, "{sign}{}:{:02}", secs / 60, secs % 60)
            }
        }
    }
}

/// The single active session of a [`super::SessionEngine`].
///
/// Only the engine constructs or mutates it; the stall-tracking pair lives in
/// a shared [`StallTracker`] so the surface's mutation listener can update it
/// inline with each edit.
pub struct SessionState<S> {
    pub(crate) id: Uuid,
    pub(crate) goal_kind: GoalKind,
    pub(crate) goal_amount: u32,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) deadline: Option<DateTime<Utc>>,
    pub(crate) grace_seconds: u32,
    pub(crate) fail_policy: FailPolicy,
    pub(crate) tracker: Rc<RefCell<StallTracker>>,
    pub(crate) surface: Weak<RefCell<S>>,
    pub(crate) subscription: SubscriptionId,
}

impl<S> SessionState<S> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn goal_kind(&self) -> GoalKind {
        self.goal_kind
    }

    pub fn goal_amount(&self) -> u32 {
        self.goal_amount
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// `None` for word-count goals.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn grace_seconds(&self) -> u32 {
        self.grace_seconds
    }

    pub fn fail_policy(&self) -> FailPolicy {
        self.fail_policy
    }

    pub fn high_water_mark(&self) -> usize {
        self.tracker.borrow().high_water_mark()
    }

    pub fn last_productive(&self) -> DateTime<Utc> {
        self.tracker.borrow().last_productive()
    }

    /// The timed surface, if the host still holds it.
    pub fn surface(&self) -> Option<Rc<RefCell<S>>> {
        self.surface.upgrade()
    }
}

impl<S> fmt::Debug for SessionState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("id", &self.id)
            .field("goal_kind", &self.goal_kind)
            .field("goal_amount", &self.goal_amount)
            .field("started_at", &self.started_at)
            .field("deadline", &self.deadline)
            .field("grace_seconds", &self.grace_seconds)
            .field("fail_policy", &self.fail_policy)
            .field("tracker", &self.tracker.borrow())
            .field("surface_alive", &(self.surface.strong_count() > 0))
            .finish()
    }
}
