//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

pub const ACT: &str = include_str!("../../prompts/act.pmt");
pub const BASH: &str = include_str!("../../prompts/bash.pmt");
pub const ASK: &str = include_str!("../../prompts/ask.pmt");
pub const PLAN: &str = include_str!("../../prompts/plan.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "act" => Some(ACT),
        "bash" => Some(BASH),
        "ask" => Some(ASK),
        "plan" => Some(PLAN),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mode_has_a_prompt() {
        for name in ["act", "bash", "ask", "plan"] {
            assert!(get_embedded(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn test_code_prompts_mention_the_fence() {
        assert!(ACT.contains("{{fence}}"));
        assert!(BASH.contains("#!/bin/bash"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("unknown-template").is_none());
    }
}
