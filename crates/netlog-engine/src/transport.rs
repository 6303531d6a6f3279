// Transport capability - callers ask a question and get an answer,
// regardless of whether it goes over the socket or the invoke endpoint

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::rest_client::RestClient;
use crate::session::Session;
use crate::ws_client::WebSocketClient;

/// Which Generative Engine endpoint to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    #[serde(alias = "ws")]
    WebSocket,
    #[serde(alias = "http")]
    Rest,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::WebSocket => "websocket",
            TransportKind::Rest => "rest",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "websocket" | "ws" => Ok(TransportKind::WebSocket),
            "rest" | "http" => Ok(TransportKind::Rest),
            other => Err(EngineError::Config(format!("unknown transport: {}", other))),
        }
    }
}

#[async_trait]
pub trait InferenceTransport: Send + Sync {
    /// Send the excerpt and the question within `session`, return the model's answer
    async fn ask(
        &self,
        session: &Session,
        excerpt: &str,
        question: &str,
    ) -> Result<String, EngineError>;

    fn kind(&self) -> TransportKind;
}

/// Build the transport selected in the config
pub fn build_transport(
    config: Arc<EngineConfig>,
    cancel: CancellationToken,
) -> Arc<dyn InferenceTransport> {
    match config.transport {
        TransportKind::WebSocket => Arc::new(WebSocketClient::new(config).with_cancellation(cancel)),
        TransportKind::Rest => Arc::new(RestClient::new(config)),
    }
}
