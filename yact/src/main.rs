use clap::Parser;
use eyre::{Context, Result, bail};
use std::fs;
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use tracing::{debug, info};

use yact::cli::{Cli, Command, ConfigCommand, ContextCommand, get_log_path};
use yact::config::{self, Config};
use yact::llm::create_client;
use yact::{App, Mode};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// Prompt from the command line words, else from piped stdin
fn resolve_prompt(words: &[String]) -> Result<String> {
    if !words.is_empty() {
        return Ok(words.join(" "));
    }

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        bail!("no prompt given; pass it as arguments or pipe it on stdin");
    }

    let mut prompt = String::new();
    stdin.read_to_string(&mut prompt).context("Failed to read prompt from stdin")?;
    if prompt.trim().is_empty() {
        bail!("no prompt given; stdin was empty");
    }
    Ok(prompt)
}

async fn call_model(app: &App, mode: Mode, words: &[String]) -> Result<()> {
    let prompt = resolve_prompt(words)?;
    let client = create_client(app.config(), app.provider())?;
    app.call_model(mode, Some(prompt), client.as_ref()).await?;
    Ok(())
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let spinner = config.ui.spinner && std::io::stderr().is_terminal();
    let app = App::new(config, PathBuf::from("."))?
        .with_config_path(cli.config.clone())
        .with_provider(cli.provider)
        .with_safe(cli.safe)
        .with_spinner(spinner);

    debug!(command = ?cli.command, "run: dispatching command");
    let command = match cli.command {
        Some(command) => command,
        None if !std::io::stdin().is_terminal() => Command::Act { prompt: Vec::new() },
        None => {
            <Cli as clap::CommandFactory>::command()
                .print_help()
                .context("Failed to print help")?;
            return Ok(());
        }
    };

    match command {
        Command::Act { prompt } => call_model(&app, Mode::Act, &prompt).await?,
        Command::Bash { prompt } => call_model(&app, Mode::Bash, &prompt).await?,
        Command::Ask { prompt } => call_model(&app, Mode::Ask, &prompt).await?,
        Command::Plan { prompt } => call_model(&app, Mode::Plan, &prompt).await?,
        Command::Read { patterns } => {
            app.read(&patterns)?;
        }
        Command::Context { command } => match command.unwrap_or(ContextCommand::List) {
            ContextCommand::List => app.context_list()?,
            ContextCommand::Pop { count } => {
                app.context_pop(count)?;
            }
            ContextCommand::Popto { index } => {
                app.context_pop_to(index)?;
            }
            ContextCommand::Del { index } => {
                app.context_delete(index)?;
            }
            ContextCommand::Reload => app.context_reload()?,
        },
        Command::Accept => app.accept()?,
        Command::Go => {
            let client = create_client(app.config(), app.provider())?;
            app.go(client.as_ref()).await?;
        }
        Command::New => app.new_context()?,
        Command::Reset => app.reset()?,
        Command::Last { file } => app.last(file.as_deref())?,
        Command::Config { command } => match command.unwrap_or(ConfigCommand::Show) {
            ConfigCommand::Show => app.config_show()?,
            ConfigCommand::Set { key, value } => {
                app.config_set(&key, &value)?;
            }
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = config::load_log_level(cli.config.as_ref());
    if let Err(e) = setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()) {
        eprintln!("Warning: {:#}", e);
    }

    let result = Config::load(cli.config.as_ref())
        .context("Failed to load configuration")
        .map(|config| {
            info!("yact loaded config: provider={}", config.default_provider);
            config
        });

    let result = match result {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

