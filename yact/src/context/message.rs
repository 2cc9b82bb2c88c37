//! Typed conversation messages

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::codeblock::render_fenced;

/// Kind of a logged message
///
/// Prompts (`Command`, `Question`, `Objective`) are user turns that ask the
/// model for something; their answers are `Action`, `Answer` and `Plan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    File,
    Question,
    Answer,
    Command,
    Action,
    Objective,
    Plan,
    Revision,
}

impl MessageType {
    /// Type under which the model's reply to this prompt is logged
    pub fn response_type(self) -> MessageType {
        match self {
            MessageType::Command => MessageType::Action,
            MessageType::Question => MessageType::Answer,
            MessageType::Objective => MessageType::Plan,
            other => other,
        }
    }

    /// True for user turns that request a model response
    pub fn is_prompt(self) -> bool {
        matches!(self, MessageType::Command | MessageType::Question | MessageType::Objective)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::File => "File",
            MessageType::Question => "Question",
            MessageType::Answer => "Answer",
            MessageType::Command => "Command",
            MessageType::Action => "Action",
            MessageType::Objective => "Objective",
            MessageType::Plan => "Plan",
            MessageType::Revision => "Revision",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub message_type: MessageType,

    /// Source path, only for `File` messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    pub content: String,
}

impl Message {
    pub fn new(message_type: MessageType, content: impl Into<String>) -> Self {
        Self {
            message_type,
            path: None,
            content: content.into(),
        }
    }

    /// A `File` message holding `contents` fenced under `path`
    pub fn file(path: impl Into<String>, contents: &str) -> Self {
        let path = path.into();
        Self {
            message_type: MessageType::File,
            content: render_fenced(&path, contents),
            path: Some(path),
        }
    }

    /// Read `path` (relative to `root`) into a `File` message
    pub fn read_file(root: &Path, path: &str) -> io::Result<Self> {
        let contents = fs::read_to_string(root.join(path))?;
        Ok(Self::file(path, &contents))
    }

    /// Same message under another type
    pub fn retyped(&self, message_type: MessageType) -> Self {
        Self {
            message_type,
            ..self.clone()
        }
    }

    /// One-line description for listings
    pub fn summary(&self, width: usize) -> String {
        if let Some(path) = &self.path {
            return path.clone();
        }

        let flat = self.content.replace('\n', " ");
        if flat.chars().count() > width {
            let truncated: String = flat.chars().take(width).collect();
            format!("{}...", truncated)
        } else {
            flat
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codeblock::parse_code_blocks;
    use tempfile::TempDir;

    #[test]
    fn test_response_type_mapping() {
        assert_eq!(MessageType::Command.response_type(), MessageType::Action);
        assert_eq!(MessageType::Question.response_type(), MessageType::Answer);
        assert_eq!(MessageType::Objective.response_type(), MessageType::Plan);
        assert_eq!(MessageType::File.response_type(), MessageType::File);
        assert_eq!(MessageType::Plan.response_type(), MessageType::Plan);
        assert_eq!(MessageType::Revision.response_type(), MessageType::Revision);
    }

    #[test]
    fn test_prompt_types() {
        assert!(MessageType::Command.is_prompt());
        assert!(MessageType::Objective.is_prompt());
        assert!(!MessageType::Plan.is_prompt());
        assert!(!MessageType::File.is_prompt());
    }

    #[test]
    fn test_file_message_round_trips_through_parser() {
        let message = Message::file("src/lib.rs", "pub fn a() {}\n");
        let blocks = parse_code_blocks(&message.content);

        assert_eq!(blocks.len(), 1);
        assert_eq!(Some(blocks[0].path.clone()), message.path);
        assert_eq!(blocks[0].content, "pub fn a() {}\n");
    }

    #[test]
    fn test_read_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.txt"), "hello\n").unwrap();

        let message = Message::read_file(temp.path(), "a.txt").unwrap();
        assert_eq!(message.message_type, MessageType::File);
        assert_eq!(message.path.as_deref(), Some("a.txt"));
        assert!(message.content.contains("// a.txt\nhello\n"));

        assert!(Message::read_file(temp.path(), "missing.txt").is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Message::new(MessageType::Command, "do it")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "Command", "content": "do it"}));

        let json = serde_json::to_value(Message::file("a.txt", "x")).unwrap();
        assert_eq!(json["type"], "File");
        assert_eq!(json["path"], "a.txt");
    }

    #[test]
    fn test_summary() {
        let message = Message::new(MessageType::Question, "line one\nline two");
        assert_eq!(message.summary(200), "line one line two");
        assert_eq!(message.summary(4), "line...");
        assert_eq!(Message::file("a.txt", "x").summary(4), "a.txt");
    }
}
