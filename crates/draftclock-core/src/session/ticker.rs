//! Repeating, cancellable tasks for a cooperative host loop.
//!
//! Nothing here sleeps or spawns: the host asks [`TickScheduler::next_due`]
//! how long it may wait and calls [`TickScheduler::take_due`] when it wakes.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone)]
struct Task {
    handle: TaskHandle,
    interval: Duration,
    next_due: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct TickScheduler {
    tasks: Vec<Task>,
    next_id: u64,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task firing every `interval`, first due at `now`.
    pub fn schedule_repeating(&mut self, interval: Duration, now: DateTime<Utc>) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task {
            handle,
            interval: interval.max(Duration::milliseconds(1)),
            next_due: now,
        });
        handle
    }

    /// Returns false if the handle was not pending.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.handle != handle);
        self.tasks.len() != before
    }

    /// Handles due at `now`, each fired once. Fires missed while the host was
    /// away are skipped, not replayed.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<TaskHandle> {
        let mut due = Vec::new();
        for task in self.tasks.iter_mut().filter(|t| t.next_due <= now) {
            due.push(task.handle);
            let behind = (now - task.next_due).num_milliseconds();
            let periods = behind / task.interval.num_milliseconds() + 1;
            task.next_due += task.interval * periods as i32;
        }
        due
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.tasks.iter().map(|t| t.next_due).min()
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }
}
