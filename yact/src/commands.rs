//! Command handlers
//!
//! Each handler loads what it needs from the [`ContextStore`], does its work
//! and saves before returning. Handlers print progress for the operator and
//! return `eyre` errors that `main` reports verbatim.

use colored::*;
use eyre::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::codeblock::FileMaterializer;
use crate::config::{Config, Provider};
use crate::context::{self, ContextStore, Message};
use crate::llm::{LlmClient, to_chat_messages};
use crate::mode::Mode;
use crate::progress::Spinner;
use crate::prompts::PromptLoader;

/// Width of message summaries in `context list`
const SUMMARY_WIDTH: usize = 200;

/// Result of one model call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOutcome {
    /// The reply text as logged
    pub response: String,
    /// Files written for code-generating modes
    pub written: Vec<PathBuf>,
}

/// Everything a command needs: config, log and working root
pub struct App {
    config: Config,
    config_path: Option<PathBuf>,
    store: ContextStore,
    root: PathBuf,
    provider: Provider,
    safe: bool,
    spinner: bool,
    prompts: PromptLoader,
}

impl App {
    /// App rooted at `root` using the log configured in `config`
    pub fn new(config: Config, root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let store = ContextStore::open(config.context_path()?);
        let provider = config.default_provider;
        let spinner = config.ui.spinner;
        debug!(?root, path = ?store.path(), %provider, "App::new: called");
        Ok(Self {
            prompts: PromptLoader::new(&root),
            config,
            config_path: None,
            store,
            root,
            provider,
            safe: false,
            spinner,
        })
    }

    /// File that `config set` edits
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn with_provider(mut self, provider: Option<Provider>) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }
        self
    }

    pub fn with_safe(mut self, safe: bool) -> Self {
        self.safe = safe;
        self
    }

    pub fn with_spinner(mut self, spinner: bool) -> Self {
        self.spinner = spinner;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn store(&self) -> &ContextStore {
        &self.store
    }

    /// Add files matching `patterns` as File messages; returns the added paths
    ///
    /// Directories and paths already in the log are skipped. A file that cannot
    /// be read is reported and skipped; the rest are still added.
    pub fn read(&self, patterns: &[String]) -> Result<Vec<String>> {
        debug!(?patterns, "read: called");
        let mut messages = self.store.load()?;
        let mut added = Vec::new();

        for pattern in patterns {
            let full = if Path::new(pattern).is_absolute() {
                pattern.clone()
            } else {
                self.root.join(pattern).to_string_lossy().into_owned()
            };

            let entries: Vec<_> = glob::glob(&full)
                .with_context(|| format!("invalid pattern {}", pattern))?
                .collect();

            if entries.is_empty() {
                println!("No files found matching pattern: {}", pattern);
                continue;
            }

            for entry in entries {
                let path = match entry {
                    Ok(path) => path,
                    Err(e) => {
                        warn!(error = %e, "read: glob entry failed");
                        println!("{} {}", "Error:".red(), e);
                        continue;
                    }
                };

                if path.is_dir() {
                    println!("Skipping directory: {}", path.display());
                    continue;
                }

                let relative = path
                    .strip_prefix(&self.root)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .into_owned();

                if messages.iter().any(|m| m.path.as_deref() == Some(relative.as_str())) {
                    println!("{} {}", "Skipping:".yellow(), relative);
                    continue;
                }

                let message = match Message::read_file(&self.root, &relative) {
                    Ok(message) => message,
                    Err(e) => {
                        warn!(path = %relative, error = %e, "read: could not read file");
                        println!("{} error reading file {}: {}", "Error:".red(), relative, e);
                        continue;
                    }
                };
                println!("{} {}", "Reading:".green(), relative);
                messages.push(message);
                added.push(relative);
            }
        }

        self.store.save(&messages)?;
        info!(added = added.len(), "read: done");
        Ok(added)
    }

    /// Print every message with its index
    pub fn context_list(&self) -> Result<()> {
        let messages = self.store.load()?;
        if messages.is_empty() {
            println!("Context is empty");
            return Ok(());
        }

        for (i, message) in messages.iter().enumerate() {
            println!(
                "[{}] {} - {}",
                i.to_string().cyan(),
                message.message_type.to_string().yellow(),
                message.summary(SUMMARY_WIDTH)
            );
        }
        Ok(())
    }

    pub fn context_pop(&self, count: usize) -> Result<usize> {
        let removed = self.store.pop(count)?;
        println!("Removed {} message(s)", removed);
        Ok(removed)
    }

    pub fn context_pop_to(&self, index: usize) -> Result<usize> {
        let removed = self.store.pop_to(index)?;
        println!("Removed {} message(s)", removed);
        Ok(removed)
    }

    pub fn context_delete(&self, index: usize) -> Result<Message> {
        let removed = self.store.delete(index)?;
        println!("Deleted message {} ({})", index, removed.message_type);
        Ok(removed)
    }

    /// Rebuild the log from disk; unreadable files are reported after saving
    pub fn context_reload(&self) -> Result<()> {
        let messages = self.store.load()?;
        let reloaded = context::reload(&messages, &self.root);
        self.store.save(&reloaded.messages)?;
        println!("Context reloaded ({} messages)", reloaded.messages.len());
        match reloaded.error() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// Reload, keeping only files
    pub fn reset(&self) -> Result<()> {
        let messages = self.store.load()?;
        let rebuilt = context::reset(&messages, &self.root);
        self.store.save(&rebuilt.messages)?;
        println!("Context reset ({} files)", rebuilt.messages.len());
        match rebuilt.error() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    pub fn new_context(&self) -> Result<()> {
        self.store.clear().context("error clearing context")?;
        println!("New context created");
        Ok(())
    }

    /// Accept the pending plan
    pub fn accept(&self) -> Result<()> {
        let messages = self.store.load()?;
        let accepted = context::accept(&messages)?;
        self.store.save(&accepted)?;
        println!("{} Plan accepted", "✓".green());
        Ok(())
    }

    /// Accept the pending plan, then act on it
    pub async fn go(&self, client: &dyn LlmClient) -> Result<ModelOutcome> {
        self.accept()?;
        self.call_model(Mode::Act, None, client).await
    }

    /// Print the last message, or replace its content with a file's
    pub fn last(&self, file: Option<&Path>) -> Result<()> {
        match file {
            None => {
                let last = self.store.last()?;
                print!("{}", last.content);
                if !last.content.ends_with('\n') {
                    println!();
                }
            }
            Some(path) => {
                let content =
                    fs::read_to_string(path).with_context(|| format!("error reading file {}", path.display()))?;
                self.store.replace_last_content(content)?;
                println!("Replaced last message with {}", path.display());
            }
        }
        Ok(())
    }

    /// Run a model command
    ///
    /// With `prompt` set, a message of the mode's prompt type is added first;
    /// without one the log must already end with the instruction (as after
    /// `accept`). The log is only saved once the model has replied.
    pub async fn call_model(&self, mode: Mode, prompt: Option<String>, client: &dyn LlmClient) -> Result<ModelOutcome> {
        debug!(%mode, has_prompt = prompt.is_some(), "call_model: called");
        let mut messages = self.store.load()?;
        if let Some(prompt) = prompt {
            messages.push(Message::new(mode.prompt_type(), prompt));
        }

        let visible = context::filter_messages(&messages, mode.prompt_type());
        let turns = to_chat_messages(&visible);
        if turns.is_empty() {
            bail!("nothing to send: the context has no {} message", mode.prompt_type());
        }

        let system_prompt = self.prompts.system_prompt(mode, self.safe)?;

        println!("Sending request to {} ({})...", client.provider(), client.model_name());
        let spinner = Spinner::start(format!("waiting for {}", client.provider()), self.spinner);
        let result = client.call(&turns, &system_prompt).await;
        spinner.stop().await;

        let response = result?;
        if response.trim().is_empty() {
            bail!("empty response from {}", client.provider());
        }

        messages.push(Message::new(mode.response_type(), response.clone()));
        self.store.save(&messages)?;
        info!(%mode, bytes = response.len(), "call_model: response logged");

        let mut written = Vec::new();
        if mode.writes_files() {
            println!("Processing response...");
            let materializer =
                FileMaterializer::new(&self.root).with_trailing_newline(self.config.write.ensure_trailing_newline);
            written = materializer.process_all(&response, self.safe)?;
            println!("Done!");
        } else {
            println!("{}", response);
        }

        Ok(ModelOutcome { response, written })
    }

    /// Print the effective configuration with API keys masked
    pub fn config_show(&self) -> Result<()> {
        println!("Active provider: {}", self.provider.to_string().cyan());
        println!("Context: {}", self.store.path().display());
        let yaml = serde_yaml::to_string(&self.config.masked()).context("Failed to serialize config")?;
        print!("{}", yaml);
        Ok(())
    }

    /// Set one key in the config file and save it
    pub fn config_set(&self, key: &str, value: &str) -> Result<PathBuf> {
        let path = Config::writable_path(self.config_path.as_ref(), &self.root)?;
        let mut config = if path.exists() {
            Config::load(Some(&path))?
        } else {
            Config::default()
        };
        config.set(key, value)?;
        config.save(&path)?;

        let shown = if key.ends_with("api-key") { mask(value) } else { value.to_string() };
        println!("Set {} to {}", key, shown);
        Ok(path)
    }

    /// True when the log ends with a plan waiting for `accept`
    pub fn has_pending_plan(&self) -> Result<bool> {
        Ok(context::pending_plan(&self.store.load()?).is_some())
    }
}

fn mask(secret: &str) -> String {
    "*".repeat(secret.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codeblock::FENCE;
    use crate::context::MessageType;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::Role;
    use tempfile::TempDir;

    fn app(temp: &TempDir) -> App {
        let mut config = Config::default();
        config
            .set("context.path", &temp.path().join("state").join("context.json").to_string_lossy())
            .unwrap();
        App::new(config, temp.path().join("work")).unwrap().with_spinner(false)
    }

    fn block(path: &str, body: &str) -> String {
        format!("{}\n// {}\n{}\n{}", FENCE, path, body, FENCE)
    }

    fn write(temp: &TempDir, path: &str, contents: &str) {
        let full = temp.path().join("work").join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, contents).unwrap();
    }

    #[test]
    fn test_read_adds_files_once() {
        let temp = TempDir::new().unwrap();
        write(&temp, "src/a.rs", "fn a() {}");
        write(&temp, "src/b.rs", "fn b() {}");
        fs::create_dir_all(temp.path().join("work/src/nested")).unwrap();
        let app = app(&temp);

        let added = app.read(&["src/*".to_string()]).unwrap();
        assert_eq!(added, vec!["src/a.rs", "src/b.rs"]);

        let again = app.read(&["src/a.rs".to_string()]).unwrap();
        assert!(again.is_empty());

        let messages = app.store().load().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], Message::file("src/a.rs", "fn a() {}"));
    }

    #[test]
    fn test_read_keeps_readable_files_past_a_bad_one() {
        let temp = TempDir::new().unwrap();
        write(&temp, "src/a.rs", "fn a() {}");
        write(&temp, "src/c.rs", "fn c() {}");
        fs::write(temp.path().join("work/src/b.bin"), [0xff, 0xfe, 0x00]).unwrap();
        let app = app(&temp);

        let added = app.read(&["src/*".to_string()]).unwrap();

        assert_eq!(added, vec!["src/a.rs", "src/c.rs"]);
        let messages = app.store().load().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], Message::file("src/c.rs", "fn c() {}"));
    }

    #[test]
    fn test_read_no_match_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let app = app(&temp);
        assert!(app.read(&["missing/*.rs".to_string()]).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_act_logs_and_writes() {
        let temp = TempDir::new().unwrap();
        let app = app(&temp);
        let reply = block("src/x.go", "package main");
        let client = MockLlmClient::new(vec![&reply]);

        let outcome = app
            .call_model(Mode::Act, Some("create X".to_string()), &client)
            .await
            .unwrap();

        assert_eq!(outcome.written, vec![temp.path().join("work/src/x.go")]);
        assert_eq!(fs::read_to_string(temp.path().join("work/src/x.go")).unwrap(), "package main");

        let messages = app.store().load().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], Message::new(MessageType::Command, "create X"));
        assert_eq!(messages[1], Message::new(MessageType::Action, reply.clone()));

        let requests = client.requests();
        assert_eq!(requests[0].0.len(), 1);
        assert_eq!(requests[0].0[0].role, Role::User);
        assert!(requests[0].1.contains(FENCE));
    }

    #[tokio::test]
    async fn test_safe_mode_writes_new_files() {
        let temp = TempDir::new().unwrap();
        write(&temp, "a.txt", "original");
        let app = app(&temp).with_safe(true);
        let reply = block("a.txt", "changed");
        let client = MockLlmClient::new(vec![&reply]);

        app.call_model(Mode::Act, Some("change a".to_string()), &client)
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(temp.path().join("work/a.txt")).unwrap(), "original");
        assert_eq!(fs::read_to_string(temp.path().join("work/a.txt.new")).unwrap(), "changed");
    }

    #[tokio::test]
    async fn test_ask_after_deleting_the_question_starts_with_user() {
        let temp = TempDir::new().unwrap();
        let app = app(&temp);
        app.store()
            .save(&[
                Message::new(MessageType::Question, "old question"),
                Message::new(MessageType::Answer, "old answer"),
            ])
            .unwrap();
        app.context_delete(0).unwrap();
        let client = MockLlmClient::new(vec!["new answer"]);

        app.call_model(Mode::Ask, Some("new question".to_string()), &client)
            .await
            .unwrap();

        let sent = &client.requests()[0].0;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].role, Role::User);
        assert_eq!(sent[0].content, "new question");
    }

    #[tokio::test]
    async fn test_ask_uses_question_context() {
        let temp = TempDir::new().unwrap();
        let app = app(&temp);
        app.store()
            .save(&[
                Message::file("a.txt", "a"),
                Message::new(MessageType::Command, "make b"),
                Message::new(MessageType::Action, block("b.txt", "b")),
            ])
            .unwrap();
        let client = MockLlmClient::new(vec!["It holds a."]);

        let outcome = app
            .call_model(Mode::Ask, Some("what is in a?".to_string()), &client)
            .await
            .unwrap();

        assert!(outcome.written.is_empty());
        // File and question only, joined into one user turn
        let sent = &client.requests()[0].0;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].content.ends_with("what is in a?"));
        assert!(!sent[0].content.contains("make b"));

        let messages = app.store().load().unwrap();
        assert_eq!(messages.last().unwrap().message_type, MessageType::Answer);
        assert!(!temp.path().join("work/b.txt").exists());
    }

    #[tokio::test]
    async fn test_failed_call_leaves_log_untouched() {
        let temp = TempDir::new().unwrap();
        let app = app(&temp);
        app.store().save(&[Message::file("a.txt", "a")]).unwrap();
        let client = MockLlmClient::new(vec![]);

        assert!(
            app.call_model(Mode::Act, Some("do it".to_string()), &client)
                .await
                .is_err()
        );
        assert_eq!(app.store().load().unwrap(), vec![Message::file("a.txt", "a")]);
    }

    #[tokio::test]
    async fn test_empty_reply_is_an_error() {
        let temp = TempDir::new().unwrap();
        let app = app(&temp);
        let client = MockLlmClient::new(vec!["   \n"]);

        let err = app
            .call_model(Mode::Plan, Some("plan it".to_string()), &client)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "empty response from mock");
        assert!(app.store().load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_plan_accept_go() {
        let temp = TempDir::new().unwrap();
        let app = app(&temp);
        let plan_reply = "1. create src/main.rs printing hello";
        let act_reply = block("src/main.rs", "fn main() { println!(\"hello\"); }");
        let client = MockLlmClient::new(vec![plan_reply, &act_reply]);

        app.call_model(Mode::Plan, Some("hello world".to_string()), &client)
            .await
            .unwrap();
        assert!(app.has_pending_plan().unwrap());

        let outcome = app.go(&client).await.unwrap();

        assert_eq!(outcome.written.len(), 1);
        let types: Vec<_> = app.store().load().unwrap().iter().map(|m| m.message_type).collect();
        assert_eq!(types, vec![MessageType::Command, MessageType::Action]);

        // The accepted plan is the only instruction act sees
        let sent = &client.requests()[1].0;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].content, plan_reply);
    }

    #[test]
    fn test_accept_without_plan_fails() {
        let temp = TempDir::new().unwrap();
        let app = app(&temp);
        app.store()
            .save(&[Message::new(MessageType::Question, "q")])
            .unwrap();

        assert!(app.accept().is_err());
        assert_eq!(app.store().load().unwrap().len(), 1);
    }

    #[test]
    fn test_reload_reports_failures_after_saving() {
        let temp = TempDir::new().unwrap();
        write(&temp, "kept.txt", "fresh");
        let app = app(&temp);
        app.store()
            .save(&[Message::file("kept.txt", "stale"), Message::file("gone.txt", "x")])
            .unwrap();

        let err = app.context_reload().unwrap_err();

        assert!(err.to_string().starts_with("reloaded context with errors"));
        assert_eq!(app.store().load().unwrap(), vec![Message::file("kept.txt", "fresh")]);
    }

    #[test]
    fn test_last_replace() {
        let temp = TempDir::new().unwrap();
        write(&temp, "edited.md", "edited plan");
        let app = app(&temp);
        app.store()
            .save(&[Message::new(MessageType::Plan, "draft plan")])
            .unwrap();

        let edited = temp.path().join("work/edited.md");
        app.last(Some(edited.as_path())).unwrap();

        assert_eq!(app.store().last().unwrap().content, "edited plan");
        assert!(app.last(None).is_ok());
    }

    #[test]
    fn test_config_set_writes_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("yact.yml");
        let app = app(&temp).with_config_path(Some(path.clone()));

        app.config_set("providers.ollama.model", "llama3").unwrap();
        app.config_set("default-provider", "ollama").unwrap();

        let saved = Config::load(Some(&path)).unwrap();
        assert_eq!(saved.default_provider, Provider::Ollama);
        assert_eq!(saved.providers.ollama.model.as_deref(), Some("llama3"));
        assert!(app.config_set("nope", "x").is_err());
    }

    #[test]
    fn test_config_set_edits_project_local_config() {
        let temp = TempDir::new().unwrap();
        write(&temp, ".yact.yml", "log-level: debug\n");
        let app = app(&temp);

        let path = app.config_set("ui.spinner", "false").unwrap();

        assert_eq!(path, temp.path().join("work").join(".yact.yml"));
        let saved = Config::load(Some(&path)).unwrap();
        assert!(!saved.ui.spinner);
        assert_eq!(saved.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("sk-123"), "******");
    }
}
