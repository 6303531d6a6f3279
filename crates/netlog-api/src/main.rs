use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use netlog_engine::{EngineConfig, build_transport, load_config};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod handlers;
mod models;
mod state;

use handlers::{ask_question, index, upload_log};
use state::AppState;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

fn build_router(state: Arc<AppState>, allow_cross_origin: bool) -> Router {
    let api_routes = Router::new()
        .route("/api/upload", post(upload_log))
        .route("/api/ask", post(ask_question))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "ok" }))
        .merge(api_routes)
        .with_state(state);

    // the browser UI may be served from another origin during development
    if allow_cross_origin {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

async fn shutdown_signal(token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown requested, cancelling pending requests");
    token.cancel();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    //logging setup
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // NETLOG_CONFIG points at an optional TOML file
    let config = match std::env::var("NETLOG_CONFIG") {
        Ok(path) => {
            info!(path = %path, "Loading config file");
            load_config(path)?
        }
        Err(_) => EngineConfig::from_env()?,
    };
    info!(
        transport = %config.transport,
        model = %config.model_name,
        provider = %config.provider,
        "Generative Engine configured"
    );

    let shutdown = CancellationToken::new();
    let transport = build_transport(Arc::new(config), shutdown.child_token());
    let state = Arc::new(AppState::new(transport));

    let allow_cross_origin = env_flag("NETLOG_ALLOW_CROSS_ORIGIN");
    if allow_cross_origin {
        info!("Cross-origin requests ENABLED");
    }
    let app = build_router(state, allow_cross_origin);

    // Server start
    let addr = std::env::var("NETLOG_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use netlog_engine::{EngineError, InferenceTransport, Session, TransportKind};
    use serde_json::Value;
    use std::sync::Mutex;
    use tower::ServiceExt;

    const BOUNDARY: &str = "netlog-test-boundary";

    // records what it was asked and replies with a canned result
    struct FakeTransport {
        reply: Result<String, u16>,
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl InferenceTransport for FakeTransport {
        async fn ask(
            &self,
            _session: &Session,
            excerpt: &str,
            question: &str,
        ) -> Result<String, EngineError> {
            self.calls
                .lock()
                .unwrap()
                .push((excerpt.to_string(), question.to_string()));
            self.reply.clone().map_err(EngineError::Status)
        }

        fn kind(&self) -> TransportKind {
            TransportKind::Rest
        }
    }

    fn setup(reply: Result<String, u16>) -> (Router, Arc<FakeTransport>) {
        let fake = Arc::new(FakeTransport {
            reply,
            calls: Mutex::new(Vec::new()),
        });
        let state = Arc::new(AppState::new(fake.clone()));
        (build_router(state, false), fake)
    }

    fn multipart_request(file_name: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: text/plain\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn ask_request(upload_id: &str, question: &str) -> Request<Body> {
        let body = serde_json::json!({ "upload_id": upload_id, "question": question });
        Request::builder()
            .method("POST")
            .uri("/api/ask")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn upload(app: &Router, content: &[u8]) -> String {
        let response = app
            .clone()
            .oneshot(multipart_request("router.log", content))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await["upload_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let (app, _) = setup(Ok("x".into()));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("Network Log Analyzer"));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_returns_excerpt() {
        let (app, _) = setup(Ok("x".into()));

        let response = app
            .oneshot(multipart_request(
                "router.log",
                b"INFO start\nERROR disk full\nnormal line\nWarning: low memory\n",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["excerpt"], "ERROR disk full\nWarning: low memory");
        assert_eq!(json["matched_lines"], 2);
        assert_eq!(json["truncated"], false);
        assert_eq!(json["file_name"], "router.log");
    }

    #[tokio::test]
    async fn test_upload_rejects_other_file_types() {
        let (app, _) = setup(Ok("x".into()));
        let response = app
            .oneshot(multipart_request("capture.pcap", b"ERROR x"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_rejects_invalid_utf8() {
        let (app, _) = setup(Ok("x".into()));
        let response = app
            .oneshot(multipart_request("router.log", &[0xff, 0xfe, b'E']))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_ask_uses_stored_excerpt() {
        let (app, fake) = setup(Ok("The disk is full.".into()));
        let upload_id = upload(&app, b"INFO a\nERROR disk full\n").await;

        let response = app
            .oneshot(ask_request(&upload_id, "  what broke?  "))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["answer"], "The disk is full.");
        assert_eq!(json["ok"], true);
        assert_eq!(json["transport"], "rest");

        let calls = fake.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], ("ERROR disk full".to_string(), "what broke?".to_string()));
    }

    #[tokio::test]
    async fn test_ask_renders_engine_failure_inline() {
        let (app, _) = setup(Err(404));
        let upload_id = upload(&app, b"ERROR a\n").await;

        let response = app.oneshot(ask_request(&upload_id, "q")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["ok"], false);
        assert!(json["answer"].as_str().unwrap().contains("404"));
    }

    #[tokio::test]
    async fn test_ask_rejects_empty_question() {
        let (app, fake) = setup(Ok("x".into()));
        let upload_id = upload(&app, b"ERROR a\n").await;

        let response = app.oneshot(ask_request(&upload_id, "   ")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(fake.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oldest_upload_is_evicted_when_full() {
        let (app, fake) = setup(Ok("fine".into()));
        let first = upload(&app, b"ERROR first\n").await;
        for i in 0..crate::state::MAX_UPLOADS {
            upload(&app, format!("ERROR upload {}\n", i).as_bytes()).await;
        }

        let response = app.clone().oneshot(ask_request(&first, "q")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let last = upload(&app, b"ERROR last\n").await;
        let response = app.oneshot(ask_request(&last, "q")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(fake.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ask_unknown_upload() {
        let (app, _) = setup(Ok("x".into()));
        let response = app
            .oneshot(ask_request("6f1c1c2e-0000-4000-8000-000000000000", "q"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
