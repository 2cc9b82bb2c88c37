//! Provider-agnostic chat turns

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::{Message, MessageType};

/// Speaker of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Model-side role of a logged message type
    pub fn of(message_type: MessageType) -> Role {
        match message_type {
            MessageType::Answer | MessageType::Action | MessageType::Plan => Role::Assistant,
            MessageType::File
            | MessageType::Question
            | MessageType::Command
            | MessageType::Objective
            | MessageType::Revision => Role::User,
        }
    }
}

/// One turn sent to a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: Role::of(message.message_type),
            content: message.content.clone(),
        }
    }
}

/// Convert logged messages to chat turns, joining adjacent turns of one role
///
/// Providers expect user and assistant turns to alternate, starting with a
/// user turn, while the log often holds several files followed by a prompt.
/// Assistant turns before the first user turn are dropped; pruning can leave
/// a reply whose prompt is gone.
pub fn to_chat_messages(messages: &[Message]) -> Vec<ChatMessage> {
    let mut turns: Vec<ChatMessage> = Vec::with_capacity(messages.len());
    for message in messages {
        let turn = ChatMessage::from(message);
        match turns.last_mut() {
            None if turn.role == Role::Assistant => {
                debug!(message_type = %message.message_type, "to_chat_messages: dropped leading assistant turn");
            }
            Some(last) if last.role == turn.role => {
                last.content.push_str("\n\n");
                last.content.push_str(&turn.content);
            }
            _ => turns.push(turn),
        }
    }
    debug!(messages = messages.len(), turns = turns.len(), "to_chat_messages: done");
    turns
}
