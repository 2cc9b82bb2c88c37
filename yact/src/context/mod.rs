//! Typed conversation context
//!
//! - [`store`] - JSON-backed message log with pruning operations
//! - [`filter`] - per-mode views of the log sent to the model
//! - [`workflow`] - plan acceptance, reload and reset

mod error;
pub mod filter;
mod message;
pub mod store;
pub mod workflow;

pub use error::ContextError;
pub use filter::{filter_messages, visible_types};
pub use message::{Message, MessageType};
pub use store::ContextStore;
pub use workflow::{Reloaded, accept, pending_plan, reload, reset};
