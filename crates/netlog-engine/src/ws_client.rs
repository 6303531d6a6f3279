// WebSocket client for the Generative Engine streaming endpoint
// One connection per question: context message, then the question, then close.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::envelope::{ReplyAction, RequestEnvelope, ResponseEnvelope};
use crate::error::EngineError;
use crate::session::{context_prompt, question_prompt, Session};
use crate::transport::{InferenceTransport, TransportKind};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct WebSocketClient {
    config: Arc<EngineConfig>,
    cancel: CancellationToken,
}

impl WebSocketClient {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort pending waits when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    async fn connect(&self) -> Result<Socket, EngineError> {
        let mut request = self.config.socket_url.as_str().into_client_request()?;
        let key = HeaderValue::from_str(&self.config.api_token).map_err(|_| EngineError::InvalidHeader)?;
        request.headers_mut().insert("x-api-key", key);

        let handshake = async { Ok::<_, EngineError>(connect_async(request).await?.0) };
        bounded(handshake, self.config.reply_timeout(), &self.cancel).await
    }

    // send one prompt and wait for its final response
    async fn round_trip(
        &self,
        socket: &mut Socket,
        session: &Session,
        prompt: &str,
    ) -> Result<String, EngineError> {
        let payload = RequestEnvelope::run(&self.config, session, prompt).to_json()?;
        let send = async { Ok::<_, EngineError>(socket.send(Message::text(payload)).await?) };
        bounded(send, self.config.reply_timeout(), &self.cancel).await?;
        await_final_response(socket, self.config.reply_timeout(), &self.cancel).await
    }
}

#[async_trait]
impl InferenceTransport for WebSocketClient {
    async fn ask(
        &self,
        session: &Session,
        excerpt: &str,
        question: &str,
    ) -> Result<String, EngineError> {
        let mut socket = self.connect().await?;
        info!(session = %session, url = %self.config.socket_url, "Socket connected");

        let ack = self.round_trip(&mut socket, session, &context_prompt(excerpt)).await?;
        debug!(ack = %ack, "Context acknowledged");

        let answer = self.round_trip(&mut socket, session, &question_prompt(question)).await?;

        if let Err(e) = socket.close(None).await {
            debug!(error = %e, "Socket close failed");
        }
        Ok(answer)
    }

    fn kind(&self) -> TransportKind {
        TransportKind::WebSocket
    }
}

/// Read frames until a final response arrives.
/// `error` replies are logged and skipped. The wait ends early on timeout,
/// cancellation, a closed stream, or a frame that is not JSON.
pub async fn await_final_response<S>(
    stream: &mut S,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<String, EngineError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    bounded(read_until_final(stream), timeout, cancel).await
}

// Run one step of the exchange under the reply timeout and the cancellation token
async fn bounded<T, F>(
    step: F,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<T, EngineError>
where
    F: Future<Output = Result<T, EngineError>>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(EngineError::Cancelled),
        result = tokio::time::timeout(timeout, step) => {
            result.map_err(|_| EngineError::Timeout(timeout))?
        }
    }
}

async fn read_until_final<S>(stream: &mut S) -> Result<String, EngineError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(frame) = stream.next().await {
        let text = match frame? {
            Message::Text(text) => text,
            Message::Close(_) => return Err(EngineError::ConnectionClosed),
            _ => continue,
        };

        let reply = ResponseEnvelope::parse(text.as_str())?;
        if reply.is_error() {
            warn!(frame = %text.as_str(), "Generative Engine reported an error");
            continue;
        }
        match reply.action {
            Some(ReplyAction::FinalResponse) => match reply.into_final_content() {
                Some(content) => return Ok(content),
                None => warn!("final_response without content, still waiting"),
            },
            _ => debug!(frame = %text.as_str(), "Ignoring frame"),
        }
    }
    Err(EngineError::ConnectionClosed)
}
