// Single-shot client for the Generative Engine invoke endpoint

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::error::EngineError;
use crate::session::{combined_prompt, Session};
use crate::transport::{InferenceTransport, TransportKind};

#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    config: Arc<EngineConfig>,
}

impl RestClient {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// POST one prompt and pull the answer out of the `data:` body
    pub async fn send(&self, session: &Session, prompt: &str) -> Result<String, EngineError> {
        let envelope = RequestEnvelope::run(&self.config, session, prompt);

        let response = self
            .client
            .post(&self.config.rest_url)
            .header("x-api-key", self.config.api_token.as_str())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .timeout(self.config.reply_timeout())
            .json(&envelope)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(EngineError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        debug!(body = %body, "Invoke reply");

        let reply = ResponseEnvelope::parse_event_body(&body)?.ok_or(EngineError::NoFinalResponse)?;
        if reply.is_error() {
            warn!(body = %body, "Generative Engine reported an error");
        }
        reply.into_final_content().ok_or(EngineError::NoFinalResponse)
    }
}

#[async_trait]
impl InferenceTransport for RestClient {
    async fn ask(
        &self,
        session: &Session,
        excerpt: &str,
        question: &str,
    ) -> Result<String, EngineError> {
        info!(session = %session, url = %self.config.rest_url, "Invoking Generative Engine");
        self.send(session, &combined_prompt(excerpt, question)).await
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Rest
    }
}
