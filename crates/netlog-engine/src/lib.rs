// NetLog engine - talks to the Generative Engine about an extracted log excerpt

pub mod config;
pub mod envelope;
pub mod error;
pub mod rest_client;
pub mod session;
pub mod transport;
pub mod ws_client;

pub use config::{load_config, EngineConfig};
pub use envelope::{ModelKwargs, ReplyAction, RequestEnvelope, ResponseEnvelope};
pub use error::{render_answer, EngineError, DEFAULT_ANSWER};
pub use rest_client::RestClient;
pub use session::{combined_prompt, context_prompt, question_prompt, Session};
pub use transport::{build_transport, InferenceTransport, TransportKind};
pub use ws_client::{await_final_response, WebSocketClient};
