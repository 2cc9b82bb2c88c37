//! yact - a command-line code assistant
//!
//! yact sends prompts to a code model, pulls the files out of the fenced
//! blocks in its reply and writes them to disk, while keeping a typed log of
//! the conversation that later prompts build on.
//!
//! # Core Concepts
//!
//! - **Fenced files**: each reply block carries its path in a first-line
//!   comment, its block header, or gets an `unknown<N>` placeholder
//! - **Typed log**: every message is a File, prompt or response; each mode
//!   only shows the model the kinds it can use
//! - **Plans**: `plan` drafts, `accept` turns the draft into a command, `go`
//!   does both and acts
//!
//! # Modules
//!
//! - [`codeblock`] - Path extraction, block parsing and file writing
//! - [`context`] - Message log, per-mode filtering and plan workflow
//! - [`llm`] - Model client trait and provider implementations
//! - [`prompts`] - System prompt templates
//! - [`commands`] - Command handlers
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod codeblock;
pub mod commands;
pub mod config;
pub mod context;
pub mod llm;
pub mod mode;
pub mod progress;
pub mod prompts;

pub use codeblock::{CodeBlock, CodeBlockParser, FileMaterializer, WriteError};
pub use commands::{App, ModelOutcome};
pub use config::{Config, Provider};
pub use context::{ContextError, ContextStore, Message, MessageType};
pub use llm::{ChatMessage, LlmClient, LlmError};
pub use mode::Mode;
