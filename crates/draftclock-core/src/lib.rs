//! # draftclock Core Library
//!
//! This library provides the core logic for draftclock, a writing timer that
//! punishes stalling: stop producing new text for longer than the grace
//! period and the draft is wiped.
//!
//! ## Architecture
//!
//! - **Session Engine**: A tick-driven state machine that requires the host
//!   loop to call `pump()` periodically
//! - **Surface**: The text buffer being timed, observed through a mutation
//!   subscription
//! - **Stores**: Where killed drafts go so they can be recovered
//! - **Storage**: TOML-based configuration and the on-disk kill file
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: Core session state machine
//! - [`TextSurface`] / [`ScratchBuffer`]: The timed buffer
//! - [`RecoverableStore`]: Destination for killed text
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod store;
pub mod surface;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::{Event, StopReason};
pub use session::{
    FailPolicy, GoalKind, Progress, SessionEngine, SessionOptions, SessionState, StatusFormat,
};
pub use storage::{Config, KillFile, KilledDraft};
pub use store::{KillRing, RecoverableStore};
pub use surface::{count_words, ScratchBuffer, TextSurface};
