//! Prompt Loader
//!
//! Loads prompt templates from override directories or falls back to the
//! embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::codeblock::FENCE;
use crate::mode::Mode;

/// Values available to prompt templates
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    /// The code block fence
    pub fence: &'static str,
    /// Files are being written with the safe suffix
    pub safe: bool,
}

impl PromptContext {
    pub fn new(safe: bool) -> Self {
        Self { fence: FENCE, safe }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    hbs: Handlebars<'static>,
    dirs: Vec<PathBuf>,
}

impl PromptLoader {
    /// Loader that checks `<root>/.yact/prompts` then the user prompt directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        debug!(?root, "PromptLoader::new: called");
        let candidates = std::iter::once(root.join(".yact").join("prompts"))
            .chain(dirs::config_dir().map(|dir| dir.join("yact").join("prompts")));
        Self::with_dirs(candidates.filter(|dir| dir.is_dir()).collect())
    }

    /// Loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        Self::with_dirs(Vec::new())
    }

    fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        debug!(?dirs, "PromptLoader::with_dirs: called");
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        Self { hbs, dirs }
    }

    /// Load a template by name, first match in the chain wins
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        for dir in &self.dirs {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render(&self, template_name: &str, context: &PromptContext) -> Result<String> {
        let template = self.load_template(template_name)?;
        info!("Rendering prompt template '{}'", template_name);
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// System prompt for a model-calling mode
    pub fn system_prompt(&self, mode: Mode, safe: bool) -> Result<String> {
        self.render(mode.template_name(), &PromptContext::new(safe))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_act_renders_fence_unescaped() {
        let prompt = PromptLoader::embedded_only().system_prompt(Mode::Act, false).unwrap();

        assert!(prompt.contains(&format!("{}\n// src/handlers/user.go", FENCE)));
        assert!(!prompt.contains("{{fence}}"));
        assert!(!prompt.contains("&#x60;"));
        assert!(!prompt.contains("written next to the originals"));
    }

    #[test]
    fn test_safe_flag_reaches_template() {
        let prompt = PromptLoader::embedded_only().system_prompt(Mode::Act, true).unwrap();
        assert!(prompt.contains("written next to the originals"));
    }

    #[test]
    fn test_project_override_wins() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".yact").join("prompts");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("ask.pmt"), "custom ask, fence is {{fence}}").unwrap();

        let loader = PromptLoader::new(temp.path());

        assert_eq!(
            loader.system_prompt(Mode::Ask, false).unwrap(),
            format!("custom ask, fence is {}", FENCE)
        );
        // Modes without an override keep the embedded prompt
        assert!(loader.system_prompt(Mode::Plan, false).unwrap().contains("planning assistant"));
    }

    #[test]
    fn test_unknown_template() {
        let err = PromptLoader::embedded_only()
            .render("nope", &PromptContext::new(false))
            .unwrap_err();
        assert!(err.to_string().contains("Prompt template not found: nope"));
    }
}
