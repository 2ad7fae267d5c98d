// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mtbridge::app_config::{self, Config};
use mtbridge::chat::ChatOrchestrator;
use mtbridge::file_utils::ensure_model_present;
use mtbridge::providers::{Ollama, Provider};
use mtbridge::session::SessionStore;
use mtbridge::translation::{loader_for, TranslationService};
use mtbridge::web::{self, AppContext};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP service (default command)
    Serve(ServeArgs),

    /// Generate shell completions for mtbridge
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug, Default)]
struct ServeArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// Bind port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Translation model directory
    #[arg(short, long, env = "MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// mtbridge - translation bridge in front of a chat model
///
/// Translates user text with a local neural translation engine and forwards
/// conversations to an Ollama-compatible chat service.
#[derive(Parser, Debug)]
#[command(name = "mtbridge")]
#[command(version)]
#[command(about = "Translation front end for a chat model service")]
#[command(long_about = "mtbridge serves a small HTTP API that translates text with a local translation engine and relays conversations to an Ollama-compatible chat service.

EXAMPLES:
    mtbridge                                  # Serve using conf.json
    mtbridge serve --port 9000                # Serve on another port
    mtbridge serve -m ./models/fa-en          # Use another model directory
    mtbridge completions bash > mtbridge.bash # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the config file doesn't
    exist, a default one will be created automatically. OLLAMA_BASE (or
    OLLAMA_HOST) overrides the chat service endpoint.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // The logger itself accepts everything; `set_max_level` does the filtering
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌",
            Level::Warn => "🚧",
            Level::Info => "",
            Level::Debug => "🔍",
            Level::Trace => "📋",
        }
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the configuration says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "mtbridge", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Serve(args)) => run_serve(args).await,
        None => run_serve(ServeArgs {
            config_path: "conf.json".to_string(),
            ..ServeArgs::default()
        })
        .await,
    }
}

fn load_config(options: &ServeArgs) -> Result<Config> {
    let mut config = Config::load_or_create(Path::new(&options.config_path))?;
    config.apply_env_overrides();

    if let Some(host) = &options.host {
        config.server.host = host.clone();
    }
    if let Some(port) = options.port {
        config.server.port = port;
    }
    if let Some(model_dir) = &options.model_dir {
        config.translator.model_dir = model_dir.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

async fn run_serve(options: ServeArgs) -> Result<()> {
    let config = load_config(&options)?;
    log::set_max_level(config.log_level.to_level_filter());

    let translator_config = config.translator.clone();
    match ensure_model_present(&translator_config.model_dir, translator_config.bootstrap_command.as_deref()).await {
        Ok(true) => {}
        Ok(false) => warn!("Model directory {} is missing", translator_config.model_dir.display()),
        Err(e) => error!("Model bootstrap failed (continuing): {:#}", e),
    }

    let translation = load_translation(translator_config).await;

    let client = Ollama::from_config(&config.chat);
    match client.test_connection().await {
        Ok(()) => info!("Chat service reachable at {}", client.base_url()),
        Err(e) => warn!("Chat service at {} not reachable yet: {}", client.base_url(), e),
    }
    if config.chat.preload_model {
        client.preload_model(&config.chat.model).await;
    }

    let sessions = Arc::new(SessionStore::new());
    let orchestrator = ChatOrchestrator::new(client, sessions, &config.chat);
    let ctx = Arc::new(AppContext::new(translation, orchestrator));

    info!(
        "Startup complete. Translator loaded={}",
        ctx.translation.is_some()
    );
    web::serve(ctx, &config.server.host, config.server.port).await
}

/// Load and warm up the translation service. `None` when no device could host the engine.
async fn load_translation(config: app_config::TranslatorConfig) -> Option<Arc<TranslationService>> {
    let loader = loader_for(config.backend);
    let warmup_text = config.warmup_text.clone();

    let loaded = tokio::task::spawn_blocking(move || TranslationService::load(&config, loader)).await;
    let service = match loaded {
        Ok(Ok(service)) => Arc::new(service),
        Ok(Err(e)) => {
            error!("Translator unavailable: {:#}", e);
            return None;
        }
        Err(e) => {
            error!("Translator loading task failed: {}", e);
            return None;
        }
    };

    if let Err(e) = service.warm_up(&warmup_text).await {
        warn!("Warm-up failed (non-fatal): {}", e);
    }
    info!("Translator ready on {} ({})", service.device(), service.device_state());

    Some(service)
}
