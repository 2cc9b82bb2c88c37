//! System prompt templates
//!
//! Template loading chain:
//! 1. `.yact/prompts/{name}.pmt` under the working root
//! 2. `<config_dir>/yact/prompts/{name}.pmt`
//! 3. Embedded fallback in code
//!
//! Templates use Handlebars syntax; `{{fence}}` renders the block fence.

pub mod embedded;
mod loader;

pub use loader::{PromptContext, PromptLoader};
