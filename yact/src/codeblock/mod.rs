//! Code block extraction and materialization
//!
//! Model responses carry files as fenced blocks:
//!
//! `````text
//! ````
//! // src/main.rs
//! fn main() {}
//! ````
//! `````
//!
//! [`CodeBlockParser`] recovers `(path, content)` pairs from a response and
//! [`FileMaterializer`] writes them below a working root.

mod error;
pub mod parser;
pub mod path;
pub mod writer;

pub use error::WriteError;
pub use parser::{CodeBlock, CodeBlockParser, FENCE, ParsedResponse, parse_code_blocks, render_fenced};
pub use path::{CommentStyle, extract_path};
pub use writer::{FileMaterializer, SAFE_SUFFIX};
