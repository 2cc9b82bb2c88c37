//! Persisted conversation log
//!
//! The whole log lives in one JSON file that is rewritten on every save.
//! A missing file is an empty log.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{ContextError, Message};

/// File name of the log inside the config directory
pub const CONTEXT_FILE: &str = "context.json";

/// Loads and saves the conversation log
#[derive(Debug, Clone)]
pub struct ContextStore {
    path: PathBuf,
}

impl ContextStore {
    /// Store backed by the JSON file at `path`
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        debug!(?path, "Opened context store");
        Self { path }
    }

    /// `<config_dir>/yact/context.json`
    pub fn default_path() -> Result<PathBuf, ContextError> {
        dirs::config_dir()
            .map(|dir| dir.join("yact").join(CONTEXT_FILE))
            .ok_or(ContextError::NoConfigDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every message in chronological order
    pub fn load(&self) -> Result<Vec<Message>, ContextError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "load: no context yet");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(ContextError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let messages: Vec<Message> = serde_json::from_str(&data).map_err(|source| ContextError::Parse {
            path: self.path.clone(),
            source,
        })?;

        debug!(count = messages.len(), "load: loaded messages");
        Ok(messages)
    }

    /// Replace the stored log with `messages`
    pub fn save(&self, messages: &[Message]) -> Result<(), ContextError> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).map_err(|source| ContextError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let data = serde_json::to_string_pretty(messages).map_err(ContextError::Encode)?;
        fs::write(&self.path, data).map_err(|source| ContextError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(count = messages.len(), path = ?self.path, "save: saved messages");
        Ok(())
    }

    /// Remove the stored log; removing a missing log is fine
    pub fn clear(&self) -> Result<(), ContextError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = ?self.path, "clear: context removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ContextError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Append one message and save
    pub fn append(&self, message: Message) -> Result<Vec<Message>, ContextError> {
        let mut messages = self.load()?;
        messages.push(message);
        self.save(&messages)?;
        Ok(messages)
    }

    /// Drop the last `count` messages (at most the whole log); returns how many went
    pub fn pop(&self, count: usize) -> Result<usize, ContextError> {
        let mut messages = self.load()?;
        let removed = count.min(messages.len());
        messages.truncate(messages.len() - removed);
        self.save(&messages)?;
        debug!(removed, "pop: done");
        Ok(removed)
    }

    /// Keep messages `0..=index`; returns how many went
    pub fn pop_to(&self, index: usize) -> Result<usize, ContextError> {
        let mut messages = self.load()?;
        check_index(index, messages.len())?;
        let removed = messages.len() - index - 1;
        messages.truncate(index + 1);
        self.save(&messages)?;
        debug!(index, removed, "pop_to: done");
        Ok(removed)
    }

    /// Remove the message at `index`
    pub fn delete(&self, index: usize) -> Result<Message, ContextError> {
        let mut messages = self.load()?;
        check_index(index, messages.len())?;
        let removed = messages.remove(index);
        self.save(&messages)?;
        debug!(index, "delete: done");
        Ok(removed)
    }

    /// The most recent message
    pub fn last(&self) -> Result<Message, ContextError> {
        self.load()?.pop().ok_or(ContextError::Empty)
    }

    /// Overwrite the content of the most recent message
    pub fn replace_last_content(&self, content: impl Into<String>) -> Result<(), ContextError> {
        let mut messages = self.load()?;
        let last = messages.last_mut().ok_or(ContextError::Empty)?;
        last.content = content.into();
        self.save(&messages)
    }
}

fn check_index(index: usize, len: usize) -> Result<(), ContextError> {
    if index >= len {
        return Err(ContextError::IndexOutOfRange { index, len });
    }
    Ok(())
}
