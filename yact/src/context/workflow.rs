//! Plan acceptance and log rebuilds
//!
//! All operations take the full log and return a new one; saving is up to
//! the caller.

use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

use super::{ContextError, Message, MessageType};
use crate::codeblock::CodeBlockParser;

/// The plan waiting to be accepted, if the log ends with one
pub fn pending_plan(messages: &[Message]) -> Option<&Message> {
    messages.last().filter(|m| m.message_type == MessageType::Plan)
}

/// Accept the trailing plan
///
/// The log must end with `[prompt, Plan]`. The prompt that asked for the plan
/// is dropped and the plan becomes a `Command`, so code generation picks it
/// up as its instruction.
pub fn accept(messages: &[Message]) -> Result<Vec<Message>, ContextError> {
    debug!(count = messages.len(), "accept: called");
    let len = messages.len();
    if len < 2 {
        return Err(ContextError::NotEnoughMessages(len));
    }

    let last = &messages[len - 1];
    if last.message_type != MessageType::Plan {
        return Err(ContextError::LastNotPlan(last.message_type));
    }

    let before = &messages[len - 2];
    if !before.message_type.is_prompt() {
        return Err(ContextError::NoPromptBeforePlan(before.message_type));
    }

    let mut accepted = messages[..len - 2].to_vec();
    accepted.push(last.retyped(MessageType::Command));
    debug!(count = accepted.len(), "accept: plan converted to command");
    Ok(accepted)
}

/// A rebuilt log plus the files that could not be re-read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reloaded {
    pub messages: Vec<Message>,
    pub failures: Vec<String>,
}

impl Reloaded {
    /// Aggregate error for the failures, if there were any
    pub fn error(&self) -> Option<ContextError> {
        if self.failures.is_empty() {
            None
        } else {
            Some(ContextError::Reload(self.failures.clone()))
        }
    }
}

/// Rebuild the log from disk
///
/// `File` messages are re-read from `root`, and every `Action` expands into
/// one `File` message per code block it contains. A path already present
/// earlier in the rebuilt log is not added again. Files that can no longer
/// be read are dropped and reported in `failures`.
pub fn reload(messages: &[Message], root: &Path) -> Reloaded {
    debug!(count = messages.len(), ?root, "reload: called");
    let parser = CodeBlockParser::new(root);
    let mut seen: HashSet<String> = HashSet::new();
    let mut rebuilt = Reloaded::default();

    for message in messages {
        match message.message_type {
            MessageType::File => {
                let Some(path) = message.path.as_deref() else {
                    rebuilt.failures.push("could not reload file message without a path".to_string());
                    continue;
                };
                if seen.contains(path) {
                    debug!(%path, "reload: duplicate file dropped");
                    continue;
                }
                match Message::read_file(root, path) {
                    Ok(fresh) => {
                        seen.insert(path.to_string());
                        rebuilt.messages.push(fresh);
                    }
                    Err(e) => {
                        warn!(%path, error = %e, "reload: could not re-read file");
                        rebuilt.failures.push(format!("could not reload {}: {}", path, e));
                    }
                }
            }
            MessageType::Action => {
                for block in parser.parse(&message.content).blocks {
                    if seen.contains(&block.path) {
                        debug!(path = %block.path, "reload: duplicate block dropped");
                        continue;
                    }
                    seen.insert(block.path.clone());
                    rebuilt.messages.push(Message::file(block.path, &block.content));
                }
            }
            _ => rebuilt.messages.push(message.clone()),
        }
    }

    debug!(
        count = rebuilt.messages.len(),
        failures = rebuilt.failures.len(),
        "reload: done"
    );
    rebuilt
}

/// Reload, then keep only the `File` messages
pub fn reset(messages: &[Message], root: &Path) -> Reloaded {
    let mut reloaded = reload(messages, root);
    reloaded.messages.retain(|m| m.message_type == MessageType::File);
    debug!(count = reloaded.messages.len(), "reset: done");
    reloaded
}
