//! Session engine implementation.
//!
//! The engine is a tick-driven state machine. It does not use internal
//! threads - the host loop calls [`SessionEngine::pump`] whenever it wakes
//! (at the latest by [`SessionEngine::next_tick_due`]), and edits reach the
//! engine through a listener subscribed on the surface.
//!
//! ## Outcomes
//!
//! ```text
//! Idle -> Active -> (Finished | Failed | Stopped) -> Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = SessionEngine::new(ScratchBuffer::new, KillRing::new());
//! let draft = engine.start_session(GoalKind::WordCount, 150, SessionOptions::default())?;
//! draft.borrow_mut().insert_str("It was a dark and stormy night");
//! for event in engine.pump() { /* TimeExpired / DraftFinished */ }
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::format::StatusFormat;
use super::hooks::Hooks;
use super::state::{FailPolicy, GoalKind, Progress, SessionOptions, SessionState};
use super::ticker::{TaskHandle, TickScheduler};
use super::tracker::StallTracker;
use crate::clock::{Clock, SystemClock};
use crate::error::{Result, ValidationError};
use crate::events::{Event, StopReason};
use crate::store::RecoverableStore;
use crate::surface::TextSurface;

/// Tick period. [`StallTracker::remaining_grace`]'s `+ 1` assumes it is 1 s.
pub const TICK_INTERVAL_SECS: i64 = 1;

/// Produces a fresh surface for each session.
pub type SurfaceFactory<S> = Box<dyn FnMut() -> S>;

pub struct SessionEngine<S: TextSurface + 'static> {
    clock: Rc<dyn Clock>,
    scheduler: TickScheduler,
    tick_task: Option<TaskHandle>,
    new_surface: SurfaceFactory<S>,
    store: Box<dyn RecoverableStore>,
    hooks: Hooks,
    status_format: StatusFormat,
    /// Display slot, overwritten every tick.
    status: String,
    session: Option<SessionState<S>>,
    /// Every lifecycle event since the host last drained it.
    journal: Vec<Event>,
}

impl<S: TextSurface + 'static> SessionEngine<S> {
    pub fn new(
        new_surface: impl FnMut() -> S + 'static,
        store: impl RecoverableStore + 'static,
    ) -> Self {
        Self {
            clock: Rc::new(SystemClock),
            scheduler: TickScheduler::new(),
            tick_task: None,
            new_surface: Box::new(new_surface),
            store: Box::new(store),
            hooks: Hooks::new(),
            status_format: StatusFormat::default(),
            status: String::new(),
            session: None,
            journal: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Rc::new(clock);
        self
    }

    pub fn with_status_format(mut self, format: StatusFormat) -> Self {
        self.status_format = format;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> Option<&SessionState<S>> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn status_line(&self) -> &str {
        &self.status
    }

    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// When the host loop should call [`Self::pump`] next.
    pub fn next_tick_due(&self) -> Option<DateTime<Utc>> {
        self.scheduler.next_due()
    }

    /// Take the lifecycle events recorded so far, oldest first: starts,
    /// stops and outcomes, including replacements `pump` never returns.
    pub fn drain_journal(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.journal)
    }

    /// Stall seconds left right now, if a session is active.
    pub fn remaining_grace(&self) -> Option<i64> {
        let session = self.session.as_ref()?;
        let now = self.clock.now();
        Some(session.tracker.borrow().remaining_grace(session.grace_seconds, now))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a session on a fresh surface, replacing any active one.
    ///
    /// The returned handle is the only strong reference to the surface:
    /// dropping it (or closing the surface) ends the session on the next tick.
    pub fn start_session(
        &mut self,
        goal_kind: GoalKind,
        goal_amount: u32,
        options: SessionOptions,
    ) -> Result<Rc<RefCell<S>>> {
        if goal_amount == 0 {
            return Err(ValidationError::NonPositiveGoal(0).into());
        }

        self.teardown(StopReason::Replaced);

        let now = self.clock.now();
        let surface = Rc::new(RefCell::new((self.new_surface)()));
        let tracker = Rc::new(RefCell::new(StallTracker::new(now)));

        let subscription = {
            let tracker = Rc::clone(&tracker);
            let clock = Rc::clone(&self.clock);
            let mut target = surface.borrow_mut();
            target.set_peak_marker(None);
            let id = target.subscribe(Box::new(move |len| {
                tracker.borrow_mut().observe(len, clock.now());
            }));
            id
        };

        let deadline = match goal_kind {
            GoalKind::Time => Some(now + Duration::minutes(i64::from(goal_amount))),
            GoalKind::WordCount => None,
        };

        let id = Uuid::new_v4();
        self.session = Some(SessionState {
            id,
            goal_kind,
            goal_amount,
            started_at: now,
            deadline,
            grace_seconds: options.grace_seconds,
            fail_policy: options.fail_policy,
            tracker,
            surface: Rc::downgrade(&surface),
            subscription,
        });
        self.tick_task = Some(
            self.scheduler
                .schedule_repeating(Duration::seconds(TICK_INTERVAL_SECS), now),
        );

        info!(
            session_id = %id,
            %goal_kind,
            goal_amount,
            grace_seconds = options.grace_seconds,
            fail_policy = %options.fail_policy,
            "writing session started"
        );
        self.journal.push(Event::SessionStarted {
            session_id: id,
            goal_kind,
            goal_amount,
            at: now,
        });
        self.hooks.fire_start();
        Ok(surface)
    }

    /// Feed a length observation by hand, for surfaces whose edits bypass
    /// the subscription.
    pub fn on_text_mutated(&mut self, current_length: usize) {
        if let Some(session) = &self.session {
            let now = self.clock.now();
            session.tracker.borrow_mut().observe(current_length, now);
        }
    }

    /// Run the tick if it is due. Returns the outcome events produced.
    pub fn pump(&mut self) -> Vec<Event> {
        let now = self.clock.now();
        let mut events = Vec::new();
        for handle in self.scheduler.take_due(now) {
            if self.tick_task != Some(handle) {
                continue;
            }
            if let Some(event) = self.tick() {
                events.push(event);
            }
        }
        events
    }

    /// Evaluate the active session once.
    ///
    /// Returns `Some` when the session ended: `TimeExpired`, `DraftFinished`,
    /// or `SessionStopped` if the surface disappeared.
    pub fn tick(&mut self) -> Option<Event> {
        let session = self.session.as_ref()?;

        let Some(surface) = session
            .surface
            .upgrade()
            .filter(|s| s.borrow().is_live())
        else {
            debug!(session_id = %session.id, "surface gone, ending session");
            return self.teardown(StopReason::SurfaceGone);
        };

        let now = self.clock.now();
        let (progress, len) = {
            let target = surface.borrow();
            let progress = match session.deadline {
                Some(deadline) => Progress::until(deadline, now),
                None => Progress::Words(target.word_count()),
            };
            (progress, target.char_count())
        };

        let remaining_grace = session
            .tracker
            .borrow()
            .remaining_grace(session.grace_seconds, now);

        let peak = {
            let mut tracker = session.tracker.borrow_mut();
            tracker.observe(len, now);
            tracker.high_water_mark()
        };
        surface.borrow_mut().set_peak_marker(Some(peak));

        self.status = self
            .status_format
            .render(&progress, session.goal_amount, remaining_grace);
        trace!(session_id = %session.id, status = %self.status, peak, "tick");

        let id = session.id;
        let goal_kind = session.goal_kind;
        let goal_amount = session.goal_amount;
        let fail_policy = session.fail_policy;
        if remaining_grace <= 0 {
            Some(self.fail(id, fail_policy, &surface))
        } else if progress.goal_reached(goal_amount) {
            Some(self.finish(id, goal_kind, &surface))
        } else {
            None
        }
    }

    /// End the active session without penalty. No-op when idle.
    pub fn stop(&mut self) -> Option<Event> {
        self.teardown(StopReason::Explicit)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn fail(&mut self, id: Uuid, fail_policy: FailPolicy, surface: &Rc<RefCell<S>>) -> Event {
        let text = surface.borrow_mut().take_contents();
        let lost_chars = text.chars().count();

        let mut stash_error = None;
        let stashed = match fail_policy {
            FailPolicy::Kill if !text.is_empty() => match self.store.stash(text) {
                Ok(()) => true,
                Err(e) => {
                    warn!(session_id = %id, error = %e, "could not stash killed draft");
                    stash_error = Some(e.to_string());
                    false
                }
            },
            _ => false,
        };
        surface.borrow_mut().clear_history();

        self.teardown(StopReason::Failed);

        let save_error = {
            let mut target = surface.borrow_mut();
            let saved = target.save();
            target.close();
            match saved {
                Ok(_) => None,
                Err(e) => {
                    warn!(session_id = %id, error = %e, "could not save wiped draft");
                    Some(e.to_string())
                }
            }
        };

        info!(session_id = %id, lost_chars, stashed, "time expired");
        self.record(Event::TimeExpired {
            session_id: id,
            fail_policy,
            lost_chars,
            stashed,
            stash_error,
            save_error,
            at: self.clock.now(),
        })
    }

    fn finish(&mut self, id: Uuid, goal_kind: GoalKind, surface: &Rc<RefCell<S>>) -> Event {
        let (words, chars) = {
            let target = surface.borrow();
            (target.word_count(), target.char_count())
        };
        self.teardown(StopReason::Finished);
        info!(session_id = %id, words, chars, "drafting finished");
        self.record(Event::DraftFinished {
            session_id: id,
            goal_kind,
            words,
            chars,
            at: self.clock.now(),
        })
    }

    fn record(&mut self, event: Event) -> Event {
        self.journal.push(event.clone());
        event
    }

    /// Cancel the tick, detach from the surface, clear the display slot and
    /// fire stop hooks. Safe to call when idle.
    fn teardown(&mut self, reason: StopReason) -> Option<Event> {
        if let Some(task) = self.tick_task.take() {
            self.scheduler.cancel(task);
        }
        self.status.clear();

        let session = self.session.take()?;
        if let Some(surface) = session.surface.upgrade() {
            let mut target = surface.borrow_mut();
            target.set_peak_marker(None);
            target.unsubscribe(session.subscription);
        }

        debug!(session_id = %session.id, ?reason, "writing session stopped");
        self.hooks.fire_stop();
        Some(self.record(Event::SessionStopped {
            session_id: session.id,
            reason,
            at: self.clock.now(),
        }))
    }
}

impl<S: TextSurface + 'static> Drop for SessionEngine<S> {
    fn drop(&mut self) {
        self.teardown(StopReason::Explicit);
    }
}
