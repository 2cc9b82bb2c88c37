//! Model-calling modes

use std::fmt;

use crate::context::MessageType;

/// What a model call is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Generate source files
    Act,
    /// Generate a single shell script
    Bash,
    /// Ask a question about the code
    Ask,
    /// Produce a plan for a later `act`
    Plan,
}

impl Mode {
    /// Type the prompt is logged under; it also selects the visible context
    pub fn prompt_type(self) -> MessageType {
        match self {
            Mode::Act | Mode::Bash => MessageType::Command,
            Mode::Ask => MessageType::Question,
            Mode::Plan => MessageType::Objective,
        }
    }

    /// Type the model's reply is logged under
    pub fn response_type(self) -> MessageType {
        self.prompt_type().response_type()
    }

    /// True when the reply is materialized to disk
    pub fn writes_files(self) -> bool {
        matches!(self, Mode::Act | Mode::Bash)
    }

    /// Name of the system prompt template
    pub fn template_name(self) -> &'static str {
        match self {
            Mode::Act => "act",
            Mode::Bash => "bash",
            Mode::Ask => "ask",
            Mode::Plan => "plan",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template_name())
    }
}
