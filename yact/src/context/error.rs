//! Context store and workflow errors

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::MessageType;

/// Errors that can occur while loading, editing or rebuilding the log
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("could not determine the user config directory")]
    NoConfigDir,

    #[error("failed to read context {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write context {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("context {} is not valid: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode context: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("index out of range: {index} (context has {len} messages)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("context is empty")]
    Empty,

    #[error("not enough messages in context (need at least 2, have {0})")]
    NotEnoughMessages(usize),

    #[error("last message is not a plan (type: {0})")]
    LastNotPlan(MessageType),

    #[error("message before the plan is not a prompt (type: {0})")]
    NoPromptBeforePlan(MessageType),

    #[error("reloaded context with errors: {}", .0.join("; "))]
    Reload(Vec<String>),
}
