//! CLI - Command Line Interface
//!
//! Available Commands:
//! - jide chat                 - Interactive terminal chat (default)
//! - jide ask "message"        - Send one message, print the reply, exit
//!
//! Global flags override the config file and `JIDE_*` environment variables.

use clap::{Args, Parser, Subcommand};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use jide_client::{ChatSession, SessionParts, SetupError};
use jide_core::{ClientConfig, ConfigError, ConfigLoader, SessionId};

use crate::ask::{PrintView, run_ask};

/// CLI Errors
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Client setup failed: {0}")]
    Setup(#[from] SetupError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Turn failed")]
    TurnFailed,

    #[error("No reply within {0}s")]
    Timeout(u64),
}

/// JIDE CLI
#[derive(Parser, Debug)]
#[command(name = "jide")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, global = true)]
    server: Option<String>,

    /// Session ID
    #[arg(long, global = true, conflicts_with = "project")]
    session: Option<String>,

    /// Project path the session ID is derived from
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Host bridge URL
    #[arg(long, global = true)]
    bridge_url: Option<String>,

    /// Route status updates through the host
    #[arg(long, global = true)]
    embedded: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Interactive terminal chat
    Chat(ChatArgs),

    /// Send one message and print the reply
    Ask(AskArgs),
}

#[derive(Args, Debug)]
pub(crate) struct ChatArgs {
    /// Log file (the terminal is owned by the UI)
    #[arg(long, default_value = ".jide/jide.log")]
    pub log_file: PathBuf,
}

impl Default for ChatArgs {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(".jide/jide.log"),
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct AskArgs {
    /// Message to send
    pub message: String,

    /// Give up when the turn has not ended after this many seconds
    #[arg(long, default_value_t = 300)]
    pub timeout_secs: u64,
}

impl Cli {
    /// Loads the config file and environment, then applies the flags.
    pub fn resolve_config(&self) -> Result<(ClientConfig, SessionId), CliError> {
        let mut loader = ConfigLoader::new();
        loader.load(self.config.as_deref())?;
        if let Some(path) = loader.source() {
            info!("config: {}", path.display());
        }
        let mut config = loader.into_config();
        self.apply_overrides(&mut config);

        if config.session_id.is_none() && config.project.is_none() {
            config.project = Some(std::env::current_dir()?);
        }
        config.validate()?;
        let session_id = config.resolve_session_id()?;
        Ok((config, session_id))
    }

    fn apply_overrides(&self, config: &mut ClientConfig) {
        if let Some(server) = &self.server {
            config.server.base_url = server.clone();
        }
        if let Some(session) = &self.session {
            config.session_id = Some(session.clone());
            config.project = None;
        }
        if let Some(project) = &self.project {
            config.project = Some(project.clone());
            config.session_id = None;
        }
        if let Some(url) = &self.bridge_url {
            config.host.bridge_url = Some(url.clone());
        }
        if self.embedded {
            config.host.embedded = true;
        }
    }

    fn log_filter(&self) -> EnvFilter {
        let default = if self.verbose { "debug" } else { "info" };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    }
}

/// Parse CLI arguments and execute commands
pub async fn run_cli() -> anyhow::Result<()> {
    let mut cli = Cli::parse();
    let command = cli
        .command
        .take()
        .unwrap_or_else(|| Commands::Chat(ChatArgs::default()));

    match command {
        Commands::Chat(args) => cmd_chat(&cli, args).await?,
        Commands::Ask(args) => cmd_ask(&cli, args).await?,
    }
    Ok(())
}

async fn cmd_chat(cli: &Cli, args: ChatArgs) -> Result<(), CliError> {
    init_file_logging(cli.log_filter(), &args.log_file)?;
    let (config, session_id) = cli.resolve_config()?;
    info!(session = %session_id, server = %config.server.base_url, "starting chat");

    let parts = SessionParts::http(&config)?;
    jide_tui::run_chat_tui(config, session_id, parts).await?;
    Ok(())
}

async fn cmd_ask(cli: &Cli, args: AskArgs) -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter())
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))?;
    let (config, session_id) = cli.resolve_config()?;
    info!(session = %session_id, "running one-shot: {}", args.message);

    let parts = SessionParts::http(&config)?;
    let mut session = ChatSession::new(config, session_id, PrintView::new(std::io::stdout()), parts);
    run_ask(
        &mut session,
        &args.message,
        Duration::from_secs(args.timeout_secs),
    )
    .await
}

fn init_file_logging(filter: EnvFilter, path: &Path) -> Result<(), CliError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("jide").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_chat_is_the_default_command() {
        let cli = parse(&[]);
        assert!(cli.command.is_none());

        let cli = parse(&["chat", "--log-file", "/tmp/x.log"]);
        match cli.command {
            Some(Commands::Chat(args)) => assert_eq!(args.log_file, PathBuf::from("/tmp/x.log")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_ask_parses_message_and_timeout() {
        let cli = parse(&["-v", "ask", "hello there", "--timeout-secs", "9"]);
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Ask(args)) => {
                assert_eq!(args.message, "hello there");
                assert_eq!(args.timeout_secs, 9);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = parse(&["ask", "hi"]);
        assert!(matches!(cli.command, Some(Commands::Ask(AskArgs { timeout_secs: 300, .. }))));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["ask", "hi", "--server", "http://h:1", "--embedded"]);
        assert_eq!(cli.server.as_deref(), Some("http://h:1"));
        assert!(cli.embedded);
    }

    #[test]
    fn test_session_conflicts_with_project() {
        let result = Cli::try_parse_from(["jide", "--session", "a", "--project", "/p", "chat"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "session_id: from-file\nserver:\n  base_url: http://file:1\nhost:\n  bridge_url: http://host:2"
        )
        .unwrap();

        let config_arg = path.to_string_lossy().to_string();
        let cli = parse(&[
            "--config",
            &config_arg,
            "--server",
            "http://flag:3",
            "--embedded",
            "chat",
        ]);
        let mut config = ConfigLoader::load_file(&path).unwrap();
        cli.apply_overrides(&mut config);

        assert_eq!(config.server.base_url, "http://flag:3");
        assert_eq!(config.session_id.as_deref(), Some("from-file"));
        assert_eq!(config.host.bridge_url.as_deref(), Some("http://host:2"));
        assert!(config.host.embedded);
    }

    #[test]
    fn test_project_flag_replaces_configured_session() {
        let cli = parse(&["--project", "/srv/app"]);
        let mut config = ClientConfig {
            session_id: Some("from-file".to_string()),
            ..ClientConfig::default()
        };
        cli.apply_overrides(&mut config);

        assert_eq!(config.session_id, None);
        assert_eq!(config.project, Some(PathBuf::from("/srv/app")));
        assert_eq!(
            config.resolve_session_id().unwrap(),
            SessionId::from_project_path(Path::new("/srv/app"))
        );
    }

    #[test]
    fn test_relative_project_matches_working_directory() {
        let cli = parse(&["--project", "."]);
        let mut config = ClientConfig::default();
        cli.apply_overrides(&mut config);

        let cwd = std::env::current_dir().unwrap();
        assert_eq!(
            config.resolve_session_id().unwrap(),
            SessionId::from_project_path(&cwd)
        );
        assert_eq!(
            config.resolve_session_id().unwrap(),
            SessionId::from_project_path(&PathBuf::from(format!("{}/", cwd.display())))
        );
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        let arg = missing.to_string_lossy().to_string();
        let cli = parse(&["--config", &arg, "--session", "s1"]);
        assert!(matches!(cli.resolve_config(), Err(CliError::Config(ConfigError::Io { .. }))));
    }

    #[test]
    fn test_cli_error_display() {
        assert_eq!(CliError::TurnFailed.to_string(), "Turn failed");
        assert_eq!(CliError::Timeout(30).to_string(), "No reply within 30s");
    }
}
