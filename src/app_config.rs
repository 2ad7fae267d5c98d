use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::translation::engine::{Device, SearchParams};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Translation engine settings
    #[serde(default)]
    pub translator: TranslatorConfig,

    /// Chat service settings
    #[serde(default)]
    pub chat: ChatConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// HTTP server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Translation engine backend
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineBackend {
    // @backend: Identity engine, echoes source pieces
    #[default]
    Passthrough,
}

/// Translation engine configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslatorConfig {
    /// Directory holding the model and tokenizer artifacts
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Command run once when `model_dir` is missing (program followed by arguments)
    #[serde(default = "default_bootstrap_command")]
    pub bootstrap_command: Option<Vec<String>>,

    /// Preferred compute device
    #[serde(default)]
    pub device: Device,

    /// Guaranteed-available device used after a resource failure
    #[serde(default = "default_fallback_device")]
    pub fallback_device: Device,

    /// Engine backend
    #[serde(default)]
    pub backend: EngineBackend,

    /// Beam search parameters
    #[serde(default)]
    pub search: SearchParams,

    /// Sentences shorter than this (in characters) are merged onto the previous segment
    #[serde(default = "default_min_fragment_chars")]
    pub min_fragment_chars: usize,

    /// Text translated once after loading
    #[serde(default = "default_warmup_text")]
    pub warmup_text: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            bootstrap_command: default_bootstrap_command(),
            device: Device::default(),
            fallback_device: default_fallback_device(),
            backend: EngineBackend::default(),
            search: SearchParams::default(),
            min_fragment_chars: default_min_fragment_chars(),
            warmup_text: default_warmup_text(),
        }
    }
}

/// Chat service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatConfig {
    /// Service endpoint URL
    #[serde(default = "default_chat_endpoint")]
    pub endpoint: String,

    /// Path of the chat-completions route
    #[serde(default = "default_chat_path")]
    pub chat_path: String,

    /// Default model name when a request does not name one
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Sampling temperature sent with every request
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion token cap sent with every request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Check for (and pull) the model at startup
    #[serde(default = "default_true")]
    pub preload_model: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: default_chat_endpoint(),
            chat_path: default_chat_path(),
            model: default_chat_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            preload_model: true,
        }
    }
}

impl ChatConfig {
    /// Full URL of the chat-completions route
    pub fn chat_url(&self) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), self.chat_path)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("./quickmt-fa-en")
}

fn default_bootstrap_command() -> Option<Vec<String>> {
    Some(vec!["/bin/sh".to_string(), "entrypoint.sh".to_string()])
}

fn default_fallback_device() -> Device {
    Device::Cpu
}

fn default_min_fragment_chars() -> usize {
    5
}

fn default_warmup_text() -> String {
    "سلام".to_string()
}

fn default_chat_endpoint() -> String {
    "http://ollama:11434".to_string()
}

fn default_chat_path() -> String {
    "/v1/chat/completions".to_string()
}

fn default_chat_model() -> String {
    "qwen2.5-coder:1.5b".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load the configuration file, or write and return the defaults when it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let file = File::open(path)
                .context(format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .context(format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            log::warn!("Config file not found at '{}', creating default config.", path.display());
            let config = Config::default();
            let config_json = serde_json::to_string_pretty(&config)
                .context("Failed to serialize default config to JSON")?;
            std::fs::write(path, config_json)
                .context(format!("Failed to write default config to file: {}", path.display()))?;
            Ok(config)
        }
    }

    /// Apply `OLLAMA_BASE` / `OLLAMA_HOST` overrides, in that order of preference
    pub fn apply_env_overrides(&mut self) {
        let endpoint = std::env::var("OLLAMA_BASE")
            .or_else(|_| std::env::var("OLLAMA_HOST"))
            .ok()
            .filter(|v| !v.trim().is_empty());
        if let Some(endpoint) = endpoint {
            self.chat.endpoint = endpoint;
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let search = &self.translator.search;
        if search.beam_size == 0 {
            return Err(anyhow!("translator.search.beam_size must be at least 1"));
        }
        if search.max_batch_size == 0 {
            return Err(anyhow!("translator.search.max_batch_size must be at least 1"));
        }
        if self.chat.endpoint.trim().is_empty() {
            return Err(anyhow!("chat.endpoint cannot be empty"));
        }
        url::Url::parse(&self.chat.endpoint)
            .context(format!("chat.endpoint is not a valid URL: {}", self.chat.endpoint))?;
        if self.chat.model.trim().is_empty() {
            return Err(anyhow!("chat.model cannot be empty"));
        }
        if self.chat.timeout_secs == 0 {
            return Err(anyhow!("chat.timeout_secs must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(anyhow!("chat.temperature must be between 0.0 and 2.0"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            translator: TranslatorConfig::default(),
            chat: ChatConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
