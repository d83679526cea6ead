//! On-disk recoverable store: one JSON object per line, appended on kill.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{Result, StorageError};
use crate::store::RecoverableStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KilledDraft {
    pub at: DateTime<Utc>,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct KillFile {
    path: PathBuf,
}

impl KillFile {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `kill-ring.jsonl` in the data directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::at(data_dir()?.join("kill-ring.jsonl")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stashed drafts, newest first. A missing file is an empty store.
    pub fn entries(&self) -> Result<Vec<KilledDraft>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut entries = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str::<KilledDraft>(line).map_err(|e| StorageError::CorruptEntry {
                    line: i + 1,
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, StorageError>>()?;
        entries.reverse();
        Ok(entries)
    }

    pub fn latest(&self) -> Result<Option<KilledDraft>> {
        Ok(self.entries()?.into_iter().next())
    }

    fn append(&self, entry: &KilledDraft) -> std::result::Result<(), String> {
        let line = serde_json::to_string(entry).map_err(|e| e.to_string())?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| e.to_string())?;
        writeln!(file, "{line}").map_err(|e| e.to_string())
    }
}

impl RecoverableStore for KillFile {
    fn stash(&mut self, text: String) -> Result<()> {
        let entry = KilledDraft {
            at: Utc::now(),
            text,
        };
        self.append(&entry).map_err(|message| StorageError::StashFailed {
            path: self.path.clone(),
            message,
        })?;
        Ok(())
    }
}
