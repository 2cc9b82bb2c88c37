//! Model-visible slices of the conversation log
//!
//! Each mode only shows the model the message kinds it can make sense of:
//! code generation never sees planning chatter, and planning sees earlier
//! plans as revisions rather than as plans to follow.

use tracing::debug;

use super::{Message, MessageType};

/// Source types visible for a target mode, `None` when the mode sees nothing
pub fn visible_types(target: MessageType) -> Option<&'static [MessageType]> {
    use MessageType::*;

    match target {
        Command => Some(&[File, Command, Action]),
        Objective => Some(&[File, Question, Answer, Objective, Plan, Revision]),
        Question => Some(&[File, Question, Answer, Objective, Plan]),
        _ => None,
    }
}

/// Select the messages visible to the model for `target`, in log order
///
/// In `Objective` mode every `Plan` comes back as a `Revision` with the same
/// content.
pub fn filter_messages(messages: &[Message], target: MessageType) -> Vec<Message> {
    let Some(allowed) = visible_types(target) else {
        debug!(%target, "filter_messages: mode sees no context");
        return Vec::new();
    };

    let filtered: Vec<Message> = messages
        .iter()
        .filter(|m| allowed.contains(&m.message_type))
        .map(|m| {
            if target == MessageType::Objective && m.message_type == MessageType::Plan {
                m.retyped(MessageType::Revision)
            } else {
                m.clone()
            }
        })
        .collect();

    debug!(%target, total = messages.len(), visible = filtered.len(), "filter_messages: done");
    filtered
}
