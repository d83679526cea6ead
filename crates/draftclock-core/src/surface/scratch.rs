//! In-memory append buffer with the cursor pinned at the end.

use std::fmt;
use std::path::{Path, PathBuf};

use super::{count_words, MutationListener, SubscriptionId, TextSurface};
use crate::error::{Result, StorageError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Edit {
    /// `chars` characters were appended.
    Insert { chars: usize },
    /// `text` was removed from the end.
    Delete { text: String },
}

/// A scratch document for one writing session.
///
/// Every change notifies subscribers with the resulting character count,
/// whether it grew or shrank the buffer.
pub struct ScratchBuffer {
    text: String,
    /// Cached `text.chars().count()`.
    chars: usize,
    undo: Vec<Edit>,
    listeners: Vec<(SubscriptionId, MutationListener)>,
    next_subscription: u64,
    peak_marker: Option<usize>,
    path: Option<PathBuf>,
    closed: bool,
}

impl ScratchBuffer {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            chars: 0,
            undo: Vec::new(),
            listeners: Vec::new(),
            next_subscription: 0,
            peak_marker: None,
            path: None,
            closed: false,
        }
    }

    /// A buffer that saves to `path` on [`TextSurface::save`].
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::new()
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn peak_marker(&self) -> Option<usize> {
        self.peak_marker
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    // ── Editing ──────────────────────────────────────────────────────

    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() || self.closed {
            return;
        }
        let added = s.chars().count();
        self.text.push_str(s);
        self.chars += added;
        self.undo.push(Edit::Insert { chars: added });
        self.notify();
    }

    pub fn insert_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.insert_str(c.encode_utf8(&mut buf));
    }

    /// Delete up to `n` characters before the cursor. Returns how many went.
    pub fn delete_backward(&mut self, n: usize) -> usize {
        if self.closed {
            return 0;
        }
        let removed = self.cut_tail(n);
        let count = removed.chars().count();
        if count > 0 {
            self.undo.push(Edit::Delete { text: removed });
            self.notify();
        }
        count
    }

    /// Delete trailing whitespace and then the word before it.
    pub fn delete_word_backward(&mut self) -> usize {
        let mut n = 0;
        let mut seen_word = false;
        for c in self.text.chars().rev() {
            if c.is_whitespace() {
                if seen_word {
                    break;
                }
            } else {
                seen_word = true;
            }
            n += 1;
        }
        self.delete_backward(n)
    }

    /// Revert the most recent edit. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        if self.closed {
            return false;
        }
        match self.undo.pop() {
            Some(Edit::Insert { chars }) => {
                self.cut_tail(chars);
            }
            Some(Edit::Delete { text }) => {
                self.chars += text.chars().count();
                self.text.push_str(&text);
            }
            None => return false,
        }
        self.notify();
        true
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn cut_tail(&mut self, n: usize) -> String {
        let keep = self.chars.saturating_sub(n);
        let at = self
            .text
            .char_indices()
            .nth(keep)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len());
        let removed = self.text.split_off(at);
        self.chars = keep;
        removed
    }

    fn notify(&mut self) {
        let len = self.chars;
        for (_, listener) in self.listeners.iter_mut() {
            listener(len);
        }
    }
}

impl Default for ScratchBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScratchBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchBuffer")
            .field("chars", &self.chars)
            .field("undo_depth", &self.undo.len())
            .field("listeners", &self.listeners.len())
            .field("peak_marker", &self.peak_marker)
            .field("path", &self.path)
            .field("closed", &self.closed)
            .finish()
    }
}

impl TextSurface for ScratchBuffer {
    fn char_count(&self) -> usize {
        self.chars
    }

    fn word_count(&self) -> usize {
        count_words(&self.text)
    }

    fn is_live(&self) -> bool {
        !self.closed
    }

    fn take_contents(&mut self) -> String {
        let text = std::mem::take(&mut self.text);
        self.chars = 0;
        if !text.is_empty() {
            self.undo.push(Edit::Delete { text: text.clone() });
            self.notify();
        }
        text
    }

    fn clear_history(&mut self) {
        self.undo.clear();
    }

    fn set_peak_marker(&mut self, position: Option<usize>) {
        self.peak_marker = position;
    }

    fn subscribe(&mut self, listener: MutationListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(sid, _)| *sid != id);
    }

    fn save(&mut self) -> Result<bool> {
        let Some(path) = self.path.as_ref() else {
            return Ok(false);
        };
        std::fs::write(path, &self.text).map_err(|source| StorageError::SaveFailed {
            path: path.clone(),
            source,
        })?;
        Ok(true)
    }

    fn close(&mut self) {
        self.closed = true;
        self.listeners.clear();
        self.peak_marker = None;
    }
}
