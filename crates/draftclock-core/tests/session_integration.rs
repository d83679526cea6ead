//! Integration tests for the writing session engine.
//!
//! Time is driven by a `ManualClock`; ticks run through `pump()` exactly as a
//! host loop would run them.

use std::cell::Cell;
use std::rc::Rc;

use chrono::Duration;
use draftclock_core::{
    Clock, Event, FailPolicy, GoalKind, KillRing, ManualClock, ScratchBuffer, SessionEngine,
    SessionOptions, StatusFormat, StopReason, TextSurface,
};

fn setup() -> (SessionEngine<ScratchBuffer>, ManualClock, KillRing) {
    let clock = ManualClock::default();
    let ring = KillRing::new();
    let engine = SessionEngine::new(ScratchBuffer::new, ring.clone()).with_clock(clock.clone());
    (engine, clock, ring)
}

fn options(grace_seconds: u32, fail_policy: FailPolicy) -> SessionOptions {
    SessionOptions {
        grace_seconds,
        fail_policy,
    }
}

#[test]
fn word_goal_finishes_on_the_tick_that_reaches_it() {
    let (mut engine, clock, _ring) = setup();
    let draft = engine
        .start_session(GoalKind::WordCount, 10, options(5, FailPolicy::Kill))
        .unwrap();
    assert!(engine.pump().is_empty());

    for word in 1..=10 {
        clock.advance_secs(1);
        draft.borrow_mut().insert_str("word ");
        let events = engine.pump();
        if word < 10 {
            assert!(events.is_empty(), "ended early at word {word}");
            assert_eq!(engine.status_line(), format!("{word}|6"));
        } else {
            assert!(matches!(
                events.as_slice(),
                [Event::DraftFinished { words: 10, .. }]
            ));
        }
    }
    assert!(!engine.is_active());
    assert_eq!(engine.status_line(), "");
    assert_eq!(draft.borrow().text().len(), 50);
}

#[test]
fn idle_writer_fails_on_sixth_tick() {
    let (mut engine, clock, _ring) = setup();
    let _draft = engine
        .start_session(GoalKind::WordCount, 10, options(5, FailPolicy::Kill))
        .unwrap();
    assert!(engine.pump().is_empty());
    assert_eq!(engine.status_line(), "0|6");

    for tick in 1..=5 {
        clock.advance_secs(1);
        assert!(engine.pump().is_empty());
        assert_eq!(engine.status_line(), format!("0|{}", 6 - tick));
    }

    clock.advance_secs(1);
    let events = engine.pump();
    assert!(matches!(events.as_slice(), [Event::TimeExpired { .. }]));
    assert!(!engine.is_active());
    assert_eq!(engine.scheduler().pending(), 0);
}

#[test]
fn productive_edit_resets_grace_to_full() {
    let (mut engine, clock, _ring) = setup();
    let draft = engine
        .start_session(GoalKind::Time, 5, options(5, FailPolicy::Kill))
        .unwrap();
    engine.pump();
    clock.advance_secs(3);
    engine.pump();
    assert_eq!(engine.remaining_grace(), Some(3));

    draft.borrow_mut().insert_str("more");
    assert_eq!(engine.remaining_grace(), Some(6));
}

#[test]
fn retyping_deleted_text_does_not_reset_stall_clock() {
    let (mut engine, clock, _ring) = setup();
    let draft = engine
        .start_session(GoalKind::WordCount, 100, options(5, FailPolicy::Kill))
        .unwrap();

    clock.advance_secs(1);
    draft.borrow_mut().insert_str("abcdef");
    let peak_at = clock.now();

    clock.advance_secs(1);
    draft.borrow_mut().delete_backward(3);
    clock.advance_secs(1);
    draft.borrow_mut().insert_str("xyz");
    assert_eq!(engine.session().unwrap().last_productive(), peak_at);

    clock.advance_secs(1);
    draft.borrow_mut().insert_char('!');
    assert_eq!(engine.session().unwrap().last_productive(), clock.now());
    assert_eq!(engine.session().unwrap().high_water_mark(), 7);
}

#[test]
fn stalled_edits_still_fail_the_session() {
    let (mut engine, clock, _ring) = setup();
    let draft = engine
        .start_session(GoalKind::WordCount, 100, options(2, FailPolicy::Delete))
        .unwrap();
    draft.borrow_mut().insert_str("hello world");
    engine.pump();

    // Fiddling below the peak never buys time.
    for _ in 0..2 {
        clock.advance_secs(1);
        draft.borrow_mut().delete_backward(5);
        draft.borrow_mut().insert_str("there");
        assert!(engine.pump().is_empty());
    }
    clock.advance_secs(1);
    assert!(matches!(
        engine.pump().as_slice(),
        [Event::TimeExpired { lost_chars: 11, .. }]
    ));
}

#[test]
fn kill_policy_stashes_exact_text_and_empties_surface() {
    let (mut engine, clock, ring) = setup();
    let draft = engine
        .start_session(GoalKind::Time, 3, options(5, FailPolicy::Kill))
        .unwrap();
    draft.borrow_mut().insert_str("a precious sentence");
    engine.pump();

    clock.advance_secs(6);
    let events = engine.pump();
    match events.as_slice() {
        [Event::TimeExpired {
            fail_policy,
            lost_chars,
            stashed,
            save_error,
            ..
        }] => {
            assert_eq!(*fail_policy, FailPolicy::Kill);
            assert_eq!(*lost_chars, 19);
            assert!(*stashed);
            assert!(save_error.is_none());
        }
        other => panic!("expected TimeExpired, got {other:?}"),
    }

    assert_eq!(ring.len(), 1);
    assert_eq!(ring.entries(), vec!["a precious sentence".to_string()]);
    let draft = draft.borrow();
    assert_eq!(draft.text(), "");
    assert!(!draft.is_live());
    assert!(!draft.can_undo());
}

#[test]
fn delete_policy_leaves_nothing_to_recover() {
    let (mut engine, clock, ring) = setup();
    let draft = engine
        .start_session(GoalKind::Time, 3, options(5, FailPolicy::Delete))
        .unwrap();
    draft.borrow_mut().insert_str("gone for good");
    engine.pump();

    clock.advance_secs(6);
    assert!(matches!(
        engine.pump().as_slice(),
        [Event::TimeExpired { stashed: false, lost_chars: 13, .. }]
    ));
    assert!(ring.is_empty());
    assert_eq!(draft.borrow().text(), "");
}

#[test]
fn stall_check_runs_before_goal_check() {
    let (mut engine, clock, _ring) = setup();
    let draft = engine
        .start_session(GoalKind::WordCount, 1, options(5, FailPolicy::Kill))
        .unwrap();
    draft.borrow_mut().insert_str("done");
    clock.advance_secs(6);
    assert!(matches!(
        engine.pump().as_slice(),
        [Event::TimeExpired { .. }]
    ));
}

#[test]
fn time_goal_finishes_at_deadline() {
    let (mut engine, clock, _ring) = setup();
    let draft = engine
        .start_session(GoalKind::Time, 1, options(5, FailPolicy::Kill))
        .unwrap();
    assert!(engine.pump().is_empty());
    assert_eq!(engine.status_line(), "1:00|6");

    for second in 1..=60 {
        clock.advance_secs(1);
        draft.borrow_mut().insert_char('x');
        let events = engine.pump();
        if second < 60 {
            assert!(events.is_empty(), "ended early at {second}s");
        } else {
            assert!(matches!(
                events.as_slice(),
                [Event::DraftFinished {
                    goal_kind: GoalKind::Time,
                    chars: 60,
                    ..
                }]
            ));
        }
    }
}

#[test]
fn time_goal_waits_out_the_last_partial_second() {
    let (mut engine, clock, _ring) = setup();
    let draft = engine
        .start_session(GoalKind::Time, 1, options(5, FailPolicy::Kill))
        .unwrap();
    let started = clock.now();
    assert!(engine.pump().is_empty());

    // A real host wakes a little after each due tick.
    clock.advance(Duration::milliseconds(10));
    for second in 1..=60 {
        clock.advance_secs(1);
        draft.borrow_mut().insert_char('x');
        let events = engine.pump();
        if second < 60 {
            assert!(
                events.is_empty(),
                "finished at {}ms, before the 60s deadline",
                (clock.now() - started).num_milliseconds()
            );
        } else {
            assert!(matches!(
                events.as_slice(),
                [Event::DraftFinished {
                    goal_kind: GoalKind::Time,
                    ..
                }]
            ));
        }
        if second == 59 {
            assert_eq!(engine.status_line(), "0:01|6");
        }
    }
}

#[test]
fn new_session_replaces_old_one_cleanly() {
    let (mut engine, clock, _ring) = setup();
    let starts = Rc::new(Cell::new(0));
    let stops = Rc::new(Cell::new(0));
    {
        let starts = Rc::clone(&starts);
        let stops = Rc::clone(&stops);
        let hooks = engine.hooks_mut();
        hooks.on_session_start(move || starts.set(starts.get() + 1));
        hooks.on_session_stop(move || stops.set(stops.get() + 1));
    }

    let first = engine
        .start_session(GoalKind::Time, 3, SessionOptions::default())
        .unwrap();
    engine.pump();
    assert!(!engine.status_line().is_empty());

    clock.advance_secs(1);
    let second = engine
        .start_session(GoalKind::WordCount, 50, SessionOptions::default())
        .unwrap();
    assert_eq!(engine.status_line(), "");
    assert_eq!(engine.scheduler().pending(), 1);
    assert_eq!((starts.get(), stops.get()), (2, 1));

    // The old surface is no longer wired to the engine.
    first.borrow_mut().insert_str("stray text in the old draft");
    assert_eq!(engine.session().unwrap().high_water_mark(), 0);
    assert_eq!(first.borrow().peak_marker(), None);

    assert!(engine.pump().is_empty());
    assert_eq!(engine.status_line(), "0|6");
    drop(second);
}

#[test]
fn dropped_surface_ends_session_silently() {
    let (mut engine, clock, ring) = setup();
    let draft = engine
        .start_session(GoalKind::WordCount, 10, SessionOptions::default())
        .unwrap();
    draft.borrow_mut().insert_str("unfinished");
    engine.pump();
    drop(draft);
    clock.advance_secs(1);

    assert!(matches!(
        engine.pump().as_slice(),
        [Event::SessionStopped {
            reason: StopReason::SurfaceGone,
            ..
        }]
    ));
    assert!(!engine.is_active());
    assert!(ring.is_empty());
    assert_eq!(engine.status_line(), "");
}

#[test]
fn closed_surface_ends_session_silently() {
    let (mut engine, _clock, _ring) = setup();
    let draft = engine
        .start_session(GoalKind::WordCount, 10, SessionOptions::default())
        .unwrap();
    draft.borrow_mut().close();
    assert!(matches!(
        engine.tick(),
        Some(Event::SessionStopped {
            reason: StopReason::SurfaceGone,
            ..
        })
    ));
}

#[test]
fn failure_saves_wiped_draft_to_backing_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("draft.txt");
    std::fs::write(&path, "old contents").unwrap();

    let clock = ManualClock::default();
    let factory_path = path.clone();
    let mut engine = SessionEngine::new(
        move || ScratchBuffer::with_path(&factory_path),
        KillRing::new(),
    )
    .with_clock(clock.clone());

    let draft = engine
        .start_session(GoalKind::Time, 3, SessionOptions::default())
        .unwrap();
    draft.borrow_mut().insert_str("new words");
    clock.advance_secs(6);
    assert!(matches!(
        engine.pump().as_slice(),
        [Event::TimeExpired { save_error: None, .. }]
    ));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
}

#[test]
fn save_failure_is_reported_but_wipe_still_happens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing-dir").join("draft.txt");

    let clock = ManualClock::default();
    let ring = KillRing::new();
    let mut engine = SessionEngine::new(move || ScratchBuffer::with_path(&path), ring.clone())
        .with_clock(clock.clone());

    let draft = engine
        .start_session(GoalKind::Time, 3, SessionOptions::default())
        .unwrap();
    draft.borrow_mut().insert_str("unsaved");
    clock.advance_secs(6);

    let events = engine.pump();
    let [Event::TimeExpired { save_error, stashed, .. }] = events.as_slice() else {
        panic!("expected TimeExpired, got {events:?}");
    };
    assert!(save_error.is_some());
    assert!(*stashed);
    assert_eq!(ring.latest().as_deref(), Some("unsaved"));
    assert_eq!(draft.borrow().text(), "");
    assert!(!engine.is_active());
}

#[test]
fn custom_status_format_is_used() {
    let clock = ManualClock::default();
    let mut engine = SessionEngine::new(ScratchBuffer::new, KillRing::new())
        .with_clock(clock.clone())
        .with_status_format(StatusFormat::new("{progress}/{goal} ({grace})"));
    let draft = engine
        .start_session(GoalKind::WordCount, 150, SessionOptions::default())
        .unwrap();
    draft.borrow_mut().insert_str("three little words");
    engine.pump();
    assert_eq!(engine.status_line(), "3/150 (6)");
}

#[test]
fn pump_waits_for_next_due_tick() {
    let (mut engine, clock, _ring) = setup();
    let _draft = engine
        .start_session(GoalKind::WordCount, 10, SessionOptions::default())
        .unwrap();
    let start = clock.now();
    engine.pump();
    assert_eq!(engine.next_tick_due(), Some(start + Duration::seconds(1)));

    clock.advance(Duration::milliseconds(500));
    engine.pump();
    assert_eq!(engine.status_line(), "0|6");
}
