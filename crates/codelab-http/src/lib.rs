//! HTTP surface of the Codelab backend
//!
//! Exposes submission execution (`/run`, `/run-output`), output checking
//! (`/evaluate-output`), the challenge list, and profile/progress storage.
//! Execution routes answer 200 for every outcome; the text in `output`
//! carries timeouts and launch failures.

pub mod error;
pub mod handlers;

pub use error::{Result, ServerError};

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, options, post};
use axum::{middleware, Router};
use codelab_core::{ChallengeCatalog, CodeExecutor, RowStore, ServerSection};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Enable CORS
    pub enable_cors: bool,
    /// CORS allowed origins (if None, allows any origin)
    pub cors_origins: Option<Vec<String>>,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Enable request logging
    pub enable_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            enable_cors: true,
            cors_origins: None,
            max_body_size: codelab_core::DEFAULT_MAX_BODY_SIZE,
            enable_logging: true,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `server` section of the loaded configuration.
    pub fn from_section(section: &ServerSection) -> Result<Self> {
        Ok(Self::new()
            .with_bind_addr_str(&section.bind_addr)?
            .with_cors(section.enable_cors)
            .with_cors_origins(section.cors_origins.clone())
            .with_max_body_size(section.max_body_size)
            .with_logging(section.enable_logging))
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Parse and set the bind address from a string.
    pub fn with_bind_addr_str(mut self, addr: &str) -> Result<Self> {
        self.bind_addr = addr
            .parse()
            .map_err(|e| ServerError::config_error(format!("Invalid bind address: {}", e)))?;
        Ok(self)
    }

    pub fn with_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    pub fn with_cors_origins(mut self, origins: Option<Vec<String>>) -> Self {
        self.cors_origins = origins;
        self
    }

    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }
}

/// Dependencies shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<dyn CodeExecutor>,
    pub store: Arc<dyn RowStore>,
    pub catalog: Arc<ChallengeCatalog>,
    pub default_expected_output: Arc<str>,
}

impl AppState {
    pub fn new(executor: Arc<dyn CodeExecutor>, store: Arc<dyn RowStore>) -> Self {
        Self {
            executor,
            store,
            catalog: Arc::new(ChallengeCatalog::builtin()),
            default_expected_output: Arc::from(codelab_core::DEFAULT_EXPECTED_OUTPUT),
        }
    }

    pub fn with_catalog(mut self, catalog: ChallengeCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    pub fn with_default_expected_output(mut self, expected: impl AsRef<str>) -> Self {
        self.default_expected_output = Arc::from(expected.as_ref());
        self
    }
}

pub struct CodelabServer {
    state: AppState,
    config: ServerConfig,
}

impl CodelabServer {
    /// Create a new server with default configuration.
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            config: ServerConfig::default(),
        }
    }

    pub fn with_config(state: AppState, config: ServerConfig) -> Self {
        Self { state, config }
    }

    /// Build the Axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let mut router = Router::new()
            .route(
                "/api/health",
                get(|| async {
                    Json(HealthResponse {
                        status: "ok".to_string(),
                        timestamp: chrono::Utc::now(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                    })
                }),
            )
            // Both routes share one execution path
            .route("/run", post(handlers::run_handler))
            .route("/run-output", post(handlers::run_handler))
            .route("/evaluate-output", post(handlers::evaluate_output_handler))
            .route("/api/challenges", get(handlers::challenges_handler))
            .route("/api/progress", post(handlers::save_progress_handler))
            .route("/api/progress/{user_id}", get(handlers::get_progress_handler))
            .route("/api/profile", post(handlers::save_profile_handler))
            .route("/api/profile/{id}", get(handlers::get_profile_handler))
            .route(
                "/api/profile/username/{username}",
                get(handlers::get_profile_by_username_handler),
            )
            // CORS preflight
            .route("/run", options(|| async { StatusCode::OK }))
            .route("/run-output", options(|| async { StatusCode::OK }))
            .route("/evaluate-output", options(|| async { StatusCode::OK }))
            .route("/api/progress", options(|| async { StatusCode::OK }))
            .route("/api/profile", options(|| async { StatusCode::OK }))
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .with_state(self.state.clone());

        if self.config.enable_logging {
            router = router.layer(middleware::from_fn(
                |request: axum::http::Request<axum::body::Body>,
                 next: axum::middleware::Next| async {
                    let request_id = uuid::Uuid::new_v4().to_string();
                    let method = request.method().clone();
                    let uri = request.uri().clone();

                    // Health probes are frequent; keep them out of the info log
                    if uri.path() == "/api/health" {
                        log::debug!("Request {} {} {}", request_id, method, uri);
                    } else {
                        log::info!("Request {} {} {}", request_id, method, uri);
                    }

                    let start = std::time::Instant::now();
                    let response = next.run(request).await;
                    let duration = start.elapsed();

                    if uri.path() == "/api/health" {
                        log::debug!("Response {} completed in {:?}", request_id, duration);
                    } else {
                        log::info!(
                            "Response {} {} completed in {:?}",
                            request_id,
                            response.status(),
                            duration
                        );
                    }

                    response
                },
            ));
        }

        router = router.layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            let cors_layer = if let Some(ref origins) = self.config.cors_origins {
                let origins: std::result::Result<Vec<_>, _> =
                    origins.iter().map(|s| s.parse()).collect();
                match origins {
                    Ok(origins) => CorsLayer::new()
                        .allow_origin(origins)
                        .allow_methods(Any)
                        .allow_headers(Any),
                    Err(_) => {
                        log::warn!("Invalid CORS origin in configuration, allowing any origin");
                        CorsLayer::permissive()
                    }
                }
            } else {
                CorsLayer::permissive()
            };
            router = router.layer(cors_layer);
        }

        router
    }

    async fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind(self.config.bind_addr).await.map_err(|e| {
            ServerError::config_error(format!(
                "Failed to bind to {}: {}",
                self.config.bind_addr, e
            ))
        })
    }

    fn log_endpoints(addr: SocketAddr) {
        log::info!("Health check: http://{}/api/health", addr);
        log::info!("Run endpoint: http://{}/run", addr);
        log::info!("Evaluate endpoint: http://{}/evaluate-output", addr);
    }

    /// Start the server with graceful shutdown support.
    ///
    /// The server will shut down when the provided shutdown signal is received.
    pub async fn serve_with_shutdown<F>(self, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        self.serve_listener(listener, shutdown_signal).await
    }

    /// Serve on an already bound listener, e.g. one bound to port 0 in tests.
    pub async fn serve_listener<F>(self, listener: TcpListener, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let addr = listener.local_addr()?;

        log::info!("codelab server starting on {}", addr);
        Self::log_endpoints(addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::internal(format!("Server error: {}", e)))?;

        log::info!("codelab server shut down gracefully");
        Ok(())
    }
}

/// Utility function to create a shutdown signal from Ctrl+C.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            log::info!("Received SIGTERM, shutting down...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use codelab_core::{ExecutionOutcome, InMemoryRowStore};
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt; // for `oneshot`

    /// Replays a fixed outcome and records the code it was given.
    struct MockExecutor {
        outcome: ExecutionOutcome,
        received: Mutex<Vec<String>>,
    }

    impl MockExecutor {
        fn new(outcome: ExecutionOutcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                received: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CodeExecutor for MockExecutor {
        async fn execute(&self, code: &str) -> ExecutionOutcome {
            self.received.lock().unwrap().push(code.to_string());
            self.outcome.clone()
        }
    }

    fn completed(stdout: &str, stderr: &str) -> ExecutionOutcome {
        ExecutionOutcome::Completed {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code: Some(0),
        }
    }

    fn app_with(executor: Arc<MockExecutor>) -> Router {
        let state = AppState::new(executor, Arc::new(InMemoryRowStore::new()));
        CodelabServer::new(state).build_router()
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let body = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, body)
    }

    async fn evaluate(app: &Router, request: serde_json::Value) -> serde_json::Value {
        send(app, "POST", "/evaluate-output", Some(request)).await.1
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = app_with(MockExecutor::new(completed("", "")));

        let (status, body) = send(&app, "GET", "/api/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_run_and_run_output_share_behavior() {
        let executor = MockExecutor::new(completed("hello\n", "warning\n"));
        let app = app_with(executor.clone());

        for uri in ["/run", "/run-output"] {
            let request = json!({"code": "print('hello')"});
            let (status, body) = send(&app, "POST", uri, Some(request)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"output": "hello\nwarning\n"}));
        }

        assert_eq!(
            *executor.received.lock().unwrap(),
            vec!["print('hello')".to_string(), "print('hello')".to_string()]
        );
    }

    #[tokio::test]
    async fn test_run_without_code_runs_empty_source() {
        let executor = MockExecutor::new(completed("", ""));
        let app = app_with(executor.clone());

        let (status, body) = send(&app, "POST", "/run", Some(json!({}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["output"], "");
        assert_eq!(*executor.received.lock().unwrap(), vec![String::new()]);
    }

    #[tokio::test]
    async fn test_execution_failures_are_still_ok_responses() {
        let timed_out = app_with(MockExecutor::new(ExecutionOutcome::TimedOut {
            stdout: String::new(),
            stderr: String::new(),
            deadline: Duration::from_secs(5),
        }));
        let request = json!({"code": "import time; time.sleep(10)"});
        let (status, body) = send(&timed_out, "POST", "/run", Some(request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["output"], "Error: Execution timed out after 5 seconds");

        let failed = app_with(MockExecutor::new(ExecutionOutcome::LaunchFailed {
            message: "could not launch interpreter 'python': not found".to_string(),
        }));
        let (status, body) = send(&failed, "POST", "/run-output", Some(json!({"code": "x"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["output"],
            "Error: could not launch interpreter 'python': not found"
        );
    }

    #[tokio::test]
    async fn test_evaluate_output_default_expected() {
        let app = app_with(MockExecutor::new(completed("", "")));

        let body = evaluate(&app, json!({"output": "hello\nhello\n"})).await;
        assert_eq!(body, json!({"success": true}));

        let body = evaluate(&app, json!({"output": " hello\nhello \n"})).await;
        assert_eq!(body, json!({"success": true}));

        let body = evaluate(&app, json!({"output": "Hello\nhello"})).await;
        assert_eq!(body, json!({"success": false}));

        let (_, body) = send(&app, "POST", "/evaluate-output", Some(json!({}))).await;
        assert_eq!(body, json!({"success": false}));
    }

    #[tokio::test]
    async fn test_evaluate_output_for_challenge() {
        let app = app_with(MockExecutor::new(completed("", "")));
        let expected: String = (1..=10).map(|n| format!("{}\n", n)).collect();

        let (status, body) = send(
            &app,
            "POST",
            "/evaluate-output",
            Some(json!({"output": expected, "challenge_id": "print2"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));

        let (status, body) = send(
            &app,
            "POST",
            "/evaluate-output",
            Some(json!({"output": "1", "challenge_id": "unknown"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_configured_default_expected_output() {
        let state = AppState::new(
            MockExecutor::new(completed("", "")),
            Arc::new(InMemoryRowStore::new()),
        )
        .with_default_expected_output("42");
        let app = CodelabServer::new(state).build_router();

        let body = evaluate(&app, json!({"output": "42\n"})).await;
        assert_eq!(body, json!({"success": true}));
    }

    #[tokio::test]
    async fn test_challenges_endpoint() {
        let app = app_with(MockExecutor::new(completed("", "")));

        let (status, body) = send(&app, "GET", "/api/challenges", None).await;

        assert_eq!(status, StatusCode::OK);
        let ids: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["print", "print2", "prime100", "fizzbuzz"]);
    }

    #[tokio::test]
    async fn test_progress_endpoints() {
        let app = app_with(MockExecutor::new(completed("", "")));

        let (status, body) = send(
            &app,
            "POST",
            "/api/progress",
            Some(json!({
                "user_id": "u1",
                "challenge_id": "print",
                "progress": 40,
                "completed": false
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "progress updated"}));

        send(
            &app,
            "POST",
            "/api/progress",
            Some(json!({
                "user_id": "u1",
                "challenge_id": "print",
                "progress": 100,
                "completed": true
            })),
        )
        .await;

        let (status, body) = send(&app, "GET", "/api/progress/u1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{
                "user_id": "u1",
                "challenge_id": "print",
                "progress": 100,
                "completed": true,
                "xp_earned": 100
            }])
        );

        let (_, body) = send(&app, "GET", "/api/progress/nobody", None).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_profile_endpoints() {
        let app = app_with(MockExecutor::new(completed("", "")));

        let (status, _) = send(&app, "GET", "/api/profile/username/ada", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            "POST",
            "/api/profile",
            Some(json!({
                "id": "7c1e",
                "username": "ada",
                "display_name": "Ada",
                "avatar_url": "",
                "accessibility_mode": ""
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "profile saved");

        let (status, body) = send(&app, "GET", "/api/profile/username/ada", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "7c1e");
        assert_eq!(body["display_name"], "Ada");

        let (status, body) = send(&app, "GET", "/api/profile/7c1e", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "ada");

        let (status, body) = send(
            &app,
            "POST",
            "/api/profile",
            Some(json!({"id": "8d2f", "username": " "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
    }

    #[test]
    fn test_server_config_from_section() {
        let section = ServerSection {
            bind_addr: "0.0.0.0:8080".to_string(),
            enable_cors: false,
            cors_origins: Some(vec!["http://localhost:8081".to_string()]),
            max_body_size: 2048,
            enable_logging: false,
        };

        let config = ServerConfig::from_section(&section).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert!(!config.enable_cors);
        assert_eq!(config.max_body_size, 2048);

        let bad = ServerSection {
            bind_addr: "localhost".to_string(),
            ..ServerSection::default()
        };
        assert!(matches!(
            ServerConfig::from_section(&bad),
            Err(ServerError::Config(_))
        ));
    }
}
