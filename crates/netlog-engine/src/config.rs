//! Generative Engine connection settings
//!
//! Built once at startup and shared (behind an `Arc`) by both transports.
//! Values come from defaults, an optional TOML file, then environment overrides.
//! The API token is only ever read from the environment.

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::EngineError;
use crate::transport::TransportKind;

pub const DEFAULT_SOCKET_URL: &str = "wss://ws.generative.engine.capgemini.com/";
pub const DEFAULT_REST_URL: &str = "https://api.generative.engine.capgemini.com/v1/llm/invoke";
pub const DEFAULT_MODEL: &str = "openai.gpt-4o";
pub const DEFAULT_PROVIDER: &str = "azure";
pub const DEFAULT_REPLY_TIMEOUT_SECS: u64 = 120;

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // never read from the file
    #[serde(skip)]
    pub api_token: String,

    // streaming (websocket) endpoint
    pub socket_url: String,

    // single-shot invoke endpoint
    pub rest_url: String,

    pub model_name: String,
    pub provider: String,

    // may be empty
    pub workspace_id: String,

    // which transport the shells use
    pub transport: TransportKind,

    // how long to wait for a final response
    pub reply_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            socket_url: DEFAULT_SOCKET_URL.to_string(),
            rest_url: DEFAULT_REST_URL.to_string(),
            model_name: DEFAULT_MODEL.to_string(),
            provider: DEFAULT_PROVIDER.to_string(),
            workspace_id: String::new(),
            transport: TransportKind::default(),
            reply_timeout_secs: DEFAULT_REPLY_TIMEOUT_SECS,
        }
    }
}

// keep the token out of logs
impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("api_token", &"<redacted>")
            .field("socket_url", &self.socket_url)
            .field("rest_url", &self.rest_url)
            .field("model_name", &self.model_name)
            .field("provider", &self.provider)
            .field("workspace_id", &self.workspace_id)
            .field("transport", &self.transport)
            .field("reply_timeout_secs", &self.reply_timeout_secs)
            .finish()
    }
}

impl EngineConfig {
    /// Create from environment variables
    /// - API_TOKEN: required
    /// - GE_SOCKET_URL, GE_REST_URL, GE_MODEL, GE_PROVIDER, GE_WORKSPACE_ID,
    ///   GE_TRANSPORT, GE_REPLY_TIMEOUT_SECS: optional overrides
    pub fn from_env() -> Result<Self, EngineError> {
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    /// Read a TOML file without touching the environment (token stays empty)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Set the token directly (tests, CLI flag)
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = token.into();
        self
    }

    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_secs)
    }

    /// Apply overrides from a variable lookup, then require a token
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GE_SOCKET_URL") {
            self.socket_url = v;
        }
        if let Some(v) = lookup("GE_REST_URL") {
            self.rest_url = v;
        }
        if let Some(v) = lookup("GE_MODEL") {
            self.model_name = v;
        }
        if let Some(v) = lookup("GE_PROVIDER") {
            self.provider = v;
        }
        if let Some(v) = lookup("GE_WORKSPACE_ID") {
            self.workspace_id = v;
        }
        if let Some(v) = lookup("GE_TRANSPORT") {
            self.transport = v.parse()?;
        }
        if let Some(v) = lookup("GE_REPLY_TIMEOUT_SECS") {
            self.reply_timeout_secs = v.trim().parse().map_err(|_| {
                EngineError::Config(format!("GE_REPLY_TIMEOUT_SECS is not a number: {}", v))
            })?;
        }
        if let Some(token) = lookup("API_TOKEN") {
            self.api_token = token;
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.api_token.trim().is_empty() {
            return Err(EngineError::MissingApiToken);
        }
        if self.reply_timeout_secs == 0 {
            return Err(EngineError::Config(
                "reply_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// Load configuration from a TOML file, then apply environment overrides
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, EngineError> {
    EngineConfig::from_file(path)?.apply_env(|key| std::env::var(key).ok())
}
