// Engine errors and the fail-soft rendering used by the shells

use std::time::Duration;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Answer shown when the engine never produced a final response
pub const DEFAULT_ANSWER: &str = "Unable to connect to Generative Engine";

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Missing API token (set API_TOKEN)")]
    MissingApiToken,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read config file: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("API token is not a valid header value")]
    InvalidHeader,

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Generative Engine returned status {0}")]
    Status(u16),

    #[error("Malformed reply: {0}")]
    MalformedReply(#[from] serde_json::Error),

    #[error("No final response in reply")]
    NoFinalResponse,

    #[error("Connection closed before a final response arrived")]
    ConnectionClosed,

    #[error("No final response within {0:?}")]
    Timeout(Duration),

    #[error("Request cancelled")]
    Cancelled,
}

impl EngineError {
    /// Text shown to the user in place of an answer
    pub fn user_message(&self) -> String {
        match self {
            EngineError::Status(code) => format!("Error Response from Generative Engine:{}", code),
            EngineError::NoFinalResponse => DEFAULT_ANSWER.to_string(),
            other => format!("Exception thrown during comms:{}", other),
        }
    }
}

/// Turn a transport result into the text displayed as the answer
pub fn render_answer(result: Result<String, EngineError>) -> String {
    match result {
        Ok(answer) => answer,
        Err(e) => e.user_message(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_contains_code() {
        let text = render_answer(Err(EngineError::Status(404)));
        assert_eq!(text, "Error Response from Generative Engine:404");
    }

    #[test]
    fn test_no_final_response_uses_default() {
        assert_eq!(render_answer(Err(EngineError::NoFinalResponse)), DEFAULT_ANSWER);
    }

    #[test]
    fn test_other_errors_are_prefixed() {
        let text = render_answer(Err(EngineError::ConnectionClosed));
        assert!(text.starts_with("Exception thrown during comms:"));
        assert!(text.contains("Connection closed"));
    }

    #[test]
    fn test_ok_passes_through() {
        assert_eq!(render_answer(Ok("X".to_string())), "X");
    }
}
