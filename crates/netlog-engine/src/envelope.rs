// Generative Engine request/reply envelopes

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::session::Session;

/// Prefix the invoke endpoint puts in front of its JSON reply
pub const EVENT_PREFIX: &str = "data:";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope<'a> {
    action: &'static str,
    model_interface: &'static str,
    data: RequestData<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestData<'a> {
    mode: &'static str,
    text: &'a str,
    files: Vec<String>,
    model_name: &'a str,
    provider: &'a str,
    session_id: Uuid,
    workspace_id: &'a str,
    model_kwargs: ModelKwargs,
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelKwargs {
    pub streaming: bool,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
}

impl Default for ModelKwargs {
    fn default() -> Self {
        Self {
            streaming: false,
            max_tokens: 4096,
            temperature: 0.5,
            top_p: 0.9,
        }
    }
}

impl<'a> RequestEnvelope<'a> {
    /// Build a "run" request for one prompt
    pub fn run(config: &'a EngineConfig, session: &Session, text: &'a str) -> Self {
        Self {
            action: "run",
            model_interface: "langchain",
            data: RequestData {
                mode: "chain",
                text,
                files: Vec::new(),
                model_name: &config.model_name,
                provider: &config.provider,
                session_id: session.id(),
                workspace_id: &config.workspace_id,
                model_kwargs: ModelKwargs::default(),
            },
        }
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Top-level `action` of a reply
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyAction {
    FinalResponse,
    Error,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub action: Option<ReplyAction>,

    // shape differs between actions, so keep it loose
    #[serde(default)]
    pub data: Option<Value>,
}

impl ResponseEnvelope {
    pub fn parse(text: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Strip the `data:` prefix of an invoke body; `None` if it is missing
    pub fn strip_event_prefix(body: &str) -> Option<&str> {
        body.strip_prefix(EVENT_PREFIX).map(str::trim_start)
    }

    /// Parse an invoke body; `Ok(None)` when the prefix is missing
    pub fn parse_event_body(body: &str) -> Result<Option<Self>, EngineError> {
        Self::strip_event_prefix(body).map(Self::parse).transpose()
    }

    pub fn is_error(&self) -> bool {
        self.action == Some(ReplyAction::Error)
    }

    fn content(&self) -> Option<&str> {
        self.data.as_ref()?.get("content")?.as_str()
    }

    /// The answer, only for a final response that carries content
    pub fn final_content(&self) -> Option<&str> {
        match self.action {
            Some(ReplyAction::FinalResponse) => self.content(),
            _ => None,
        }
    }

    pub fn into_final_content(self) -> Option<String> {
        self.final_content().map(str::to_string)
    }
}
