//! The text surface a session times.
//!
//! The engine only needs a narrow view of the host's buffer: its size, a way
//! to wipe it, a marker slot for the peak position, and a mutation
//! subscription. [`ScratchBuffer`] is the in-memory implementation used by
//! the CLI and the tests.

mod scratch;

pub use scratch::ScratchBuffer;

use crate::error::Result;

/// Called with the resulting character count after every insert or delete.
pub type MutationListener = Box<dyn FnMut(usize)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

pub trait TextSurface {
    /// Current content length in characters.
    fn char_count(&self) -> usize;

    fn word_count(&self) -> usize;

    /// False once the host has closed or destroyed the surface.
    fn is_live(&self) -> bool;

    /// Remove the whole content and hand it back.
    fn take_contents(&mut self) -> String;

    /// Forget undo history so earlier edits (including a wipe) cannot be undone.
    fn clear_history(&mut self);

    /// Place (or with `None`, remove) the zero-width marker just before `position`.
    fn set_peak_marker(&mut self, position: Option<usize>);

    fn subscribe(&mut self, listener: MutationListener) -> SubscriptionId;

    /// Unknown ids are ignored.
    fn unsubscribe(&mut self, id: SubscriptionId);

    /// Write the content to the backing location. `Ok(false)` when there is none.
    fn save(&mut self) -> Result<bool>;

    fn close(&mut self);
}

/// Counts maximal runs of alphanumeric characters (apostrophes inside a word
/// do not split it).
pub fn count_words(text: &str) -> usize {
    let mut words = 0;
    let mut in_word = false;
    let mut prev_alnum = false;
    for c in text.chars() {
        let alnum = c.is_alphanumeric();
        let joins = (c == '\'' || c == '\u{2019}') && prev_alnum;
        if alnum && !in_word {
            words += 1;
            in_word = true;
        } else if !alnum && !joins {
            in_word = false;
        }
        prev_alnum = alnum;
    }
    words
}
