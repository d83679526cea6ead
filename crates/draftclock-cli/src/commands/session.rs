use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use chrono::Utc;
use clap::Args;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use draftclock_core::{
    Config, Event, FailPolicy, GoalKind, KillFile, ScratchBuffer, SessionEngine, StopReason,
    TextSurface,
};

use crate::runtime::{CrosstermInput, InputEvent, InputSource};
use crate::screen::{Screen, SessionView};

/// Upper bound on how long the loop sleeps between redraws.
const IDLE_POLL: Duration = Duration::from_millis(250);

#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Seconds you may stall before the draft is wiped
    #[arg(long)]
    grace: Option<u32>,
    /// What happens to the draft on failure: kill (recoverable) or delete
    #[arg(long, value_parser = parse_policy)]
    policy: Option<FailPolicy>,
    /// File the draft is saved to when the session ends
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn parse_policy(s: &str) -> Result<FailPolicy, String> {
    s.parse()
}

/// What a key press did to the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    Edited,
    Ignored,
    Stop,
}

fn apply_key(key: KeyEvent, draft: &mut ScratchBuffer) -> KeyOutcome {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => KeyOutcome::Stop,
        KeyCode::Char('c') | KeyCode::Char('d') if ctrl => KeyOutcome::Stop,
        KeyCode::Char('w') if ctrl => {
            draft.delete_word_backward();
            KeyOutcome::Edited
        }
        KeyCode::Char('z') | KeyCode::Char('_') if ctrl => {
            draft.undo();
            KeyOutcome::Edited
        }
        KeyCode::Char('h') if ctrl => {
            draft.delete_backward(1);
            KeyOutcome::Edited
        }
        KeyCode::Char(_) if ctrl => KeyOutcome::Ignored,
        KeyCode::Char(c) => {
            draft.insert_char(c);
            KeyOutcome::Edited
        }
        KeyCode::Enter => {
            draft.insert_char('\n');
            KeyOutcome::Edited
        }
        KeyCode::Tab => {
            draft.insert_char('\t');
            KeyOutcome::Edited
        }
        KeyCode::Backspace => {
            draft.delete_backward(1);
            KeyOutcome::Edited
        }
        _ => KeyOutcome::Ignored,
    }
}

fn goal_label(kind: GoalKind, amount: u32) -> String {
    match kind {
        GoalKind::Time => format!("{amount} min"),
        GoalKind::WordCount => format!("{amount} words"),
    }
}

pub fn run(
    goal_kind: Option<GoalKind>,
    goal_amount: Option<u32>,
    args: SessionArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let kind = goal_kind.unwrap_or(config.session.default_goal_kind);
    let amount = goal_amount.unwrap_or_else(|| config.default_goal_amount(kind));
    let mut options = config.session_options();
    if let Some(grace) = args.grace {
        options.grace_seconds = grace;
    }
    if let Some(policy) = args.policy {
        options.fail_policy = policy;
    }

    let output = args.output.clone();
    let mut engine = SessionEngine::new(
        move || match &output {
            Some(path) => ScratchBuffer::with_path(path),
            None => ScratchBuffer::new(),
        },
        KillFile::open_default()?,
    )
    .with_status_format(config.display.status_format.clone());

    let draft = engine.start_session(kind, amount, options)?;
    tracing::debug!(%kind, amount, output = ?args.output, "interactive session running");
    let header = format!(
        "draftclock: {} | grace {}s | {} on stall | Esc to stop",
        goal_label(kind, amount),
        options.grace_seconds,
        options.fail_policy,
    );

    let input = CrosstermInput::new();
    let outcome = {
        let mut screen = Screen::enter()?;
        run_loop(&mut engine, &draft, &input, |engine, draft| {
            let draft = draft.borrow();
            screen.draw(&SessionView {
                header: &header,
                text: draft.text(),
                peak_marker: draft.peak_marker(),
                status: engine.status_line(),
            })
        })?
    };

    for event in engine.drain_journal() {
        tracing::debug!(session_id = %event.session_id(), ?event, "session event");
    }

    let result = report(outcome, &mut draft.borrow_mut());
    result
}

/// Drive the engine until the session ends. `draw` runs after every tick and
/// every key.
fn run_loop<I, D>(
    engine: &mut SessionEngine<ScratchBuffer>,
    draft: &Rc<RefCell<ScratchBuffer>>,
    input: &I,
    mut draw: D,
) -> std::io::Result<Option<Event>>
where
    I: InputSource,
    D: FnMut(&SessionEngine<ScratchBuffer>, &Rc<RefCell<ScratchBuffer>>) -> std::io::Result<()>,
{
    loop {
        if let Some(event) = engine.pump().into_iter().next() {
            return Ok(Some(event));
        }
        draw(&*engine, draft)?;

        let timeout = engine
            .next_tick_due()
            .map(|due| (due - Utc::now()).to_std().unwrap_or(Duration::ZERO))
            .map_or(IDLE_POLL, |wait| wait.min(IDLE_POLL));

        match input.recv_timeout(timeout) {
            Ok(InputEvent::Key(key)) => {
                let outcome = apply_key(key, &mut draft.borrow_mut());
                if outcome == KeyOutcome::Stop {
                    return Ok(engine.stop());
                }
            }
            Ok(InputEvent::Resize) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return Ok(engine.stop()),
        }
    }
}

/// Print the outcome once the terminal is restored.
fn report(
    outcome: Option<Event>,
    draft: &mut ScratchBuffer,
) -> Result<(), Box<dyn std::error::Error>> {
    match outcome {
        Some(event @ Event::TimeExpired { .. }) => {
            if let Some(notice) = event.notice() {
                eprintln!("{notice}");
            }
        }
        Some(event @ Event::DraftFinished { .. }) => {
            if let Some(notice) = event.notice() {
                eprintln!("{notice}");
            }
            keep_draft(draft)?;
        }
        Some(Event::SessionStopped {
            reason: StopReason::Explicit,
            ..
        }) => {
            eprintln!("Session stopped");
            keep_draft(draft)?;
        }
        _ => {}
    }
    Ok(())
}

/// Save to `--output` if given, otherwise hand the draft back on stdout.
fn keep_draft(draft: &mut ScratchBuffer) -> Result<(), Box<dyn std::error::Error>> {
    if draft.save()? {
        if let Some(path) = draft.path() {
            eprintln!("Draft saved to {}", path.display());
        }
    } else if !draft.text().is_empty() {
        println!("{}", draft.text());
    }
    Ok(())
}
