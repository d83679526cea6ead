mod engine;
mod format;
mod hooks;
mod state;
mod ticker;
mod tracker;

pub use engine::{SessionEngine, SurfaceFactory, TICK_INTERVAL_SECS};
pub use format::{StatusFormat, DEFAULT_STATUS_FORMAT};
pub use hooks::{Hook, Hooks};
pub use state::{
    FailPolicy, GoalKind, Progress, SessionOptions, SessionState, DEFAULT_GRACE_SECONDS,
};
pub use ticker::{TaskHandle, TickScheduler};
pub use tracker::StallTracker;
