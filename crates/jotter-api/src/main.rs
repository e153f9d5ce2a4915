//! jotter-api - HTTP API server for jotter

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use jotter_core::{defaults, AuthPrincipal, SessionStore};
use jotter_db::Database;
use jotter_inference::{AnthropicBackend, EnrichmentClient};

use handlers::notes::{create_note, delete_note, list_notes, update_note};
use handlers::reports::generate_report;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// log correlation and debugging production incidents.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    db: Arc<Database>,
    /// AI enrichment client; constructed once at startup and injected here
    /// rather than reached through a global.
    enrichment: Arc<EnrichmentClient<AnthropicBackend>>,
}

// =============================================================================
// CORS CONFIGURATION HELPER
// =============================================================================

/// Parse allowed origins from the comma-separated `ALLOWED_ORIGINS` variable.
///
/// Strict origin whitelisting; entries that fail to parse are skipped with a
/// warning. Defaults to localhost development origins when unset or empty.
fn parse_allowed_origins() -> Vec<HeaderValue> {
    let origins_str = std::env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());

    if origins_str.trim().is_empty() {
        return vec![
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://localhost:5173"),
        ];
    }

    origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "jotter_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "jotter_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("jotter-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(non_blocking);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            } else {
                layer = layer.with_ansi(false); // no ANSI in files
            }
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/jotter".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| defaults::HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| defaults::PORT.to_string())
        .parse()
        .unwrap_or(defaults::PORT);

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Initialize the AI enrichment client
    let backend = AnthropicBackend::from_env()?;
    info!(
        "Inference backend initialized: {}",
        jotter_core::GenerationBackend::model_name(&backend)
    );
    let enrichment = Arc::new(EnrichmentClient::new(backend));

    // Create app state
    let state = AppState {
        db: Arc::new(db),
        enrichment,
    };

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Notes
        .route("/notes", get(list_notes).post(create_note))
        .route("/notes/:id", patch(update_note).delete(delete_note))
        // Activity reports
        .route("/reports", get(generate_report))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer({
            let allowed_origins = parse_allowed_origins();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(3600))
        })
        // Note bodies are small; generous but bounded
        .layer(RequestBodyLimitLayer::new(defaults::BODY_LIMIT_BYTES))
        .with_state(state.clone());

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.db.close().await;
    info!("Server stopped");

    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM so in-flight requests can drain.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

// =============================================================================
// HEALTH CHECK
// =============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

/// Pull the session token from `Authorization: Bearer` or, failing that,
/// the `session_token` cookie.
fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    parts
        .headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(cookie_value)
}

/// Find `session_token=...` in a Cookie header value.
fn cookie_value(cookies: &str) -> Option<String> {
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == "session_token" && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

/// Extractor that requires a valid, unexpired session.
///
/// Sessions are issued by the external auth collaborator; this service only
/// reads the `session` table. A missing, unknown, or expired token rejects
/// with 401 before the handler runs.
#[derive(Debug, Clone)]
pub struct RequireAuth {
    pub principal: AuthPrincipal,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        let principal = state
            .db
            .sessions
            .get_session(&token)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        Ok(RequireAuth { principal })
    }
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
enum ApiError {
    Database(jotter_core::Error),
    Unauthorized(String),
    NotFound(String),
    BadRequest(String),
}

impl From<jotter_core::Error> for ApiError {
    fn from(err: jotter_core::Error) -> Self {
        match &err {
            // Absence and foreign ownership collapse into one message on
            // purpose; the body must not reveal which it was.
            jotter_core::Error::NoteNotFound(_) => {
                ApiError::NotFound("Note not found".to_string())
            }
            jotter_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            jotter_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            jotter_core::Error::Unauthorized(msg) => ApiError::Unauthorized(msg.clone()),
            _ => ApiError::Database(err),
        }
    }
}

// Built-in extractor rejections carry their own status and plain-text
// bodies; remap them so every failure is a 400 with the {"error"} shape.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Database(err) => {
                error!(error = %err, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value_finds_session_token() {
        assert_eq!(
            cookie_value("session_token=abc123"),
            Some("abc123".to_string())
        );
        assert_eq!(
            cookie_value("theme=dark; session_token=tok; lang=en"),
            Some("tok".to_string())
        );
    }

    #[test]
    fn test_cookie_value_ignores_other_cookies() {
        assert_eq!(cookie_value("theme=dark; lang=en"), None);
        assert_eq!(cookie_value(""), None);
    }

    #[test]
    fn test_cookie_value_empty_token_is_absent() {
        assert_eq!(cookie_value("session_token="), None);
    }

    #[test]
    fn test_not_found_maps_to_fixed_message() {
        let err = jotter_core::Error::NoteNotFound(Uuid::now_v7());
        match ApiError::from(err) {
            ApiError::NotFound(msg) => assert_eq!(msg, "Note not found"),
            other => panic!("unexpected mapping: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_input_maps_to_bad_request() {
        let err = jotter_core::Error::InvalidInput("Content is required".to_string());
        match ApiError::from(err) {
            ApiError::BadRequest(msg) => assert_eq!(msg, "Content is required"),
            other => panic!("unexpected mapping: {:?}", other),
        }
    }

    async fn response_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_bad_request_body_is_error_object() {
        let resp = ApiError::BadRequest("Invalid date".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response_json(resp).await,
            serde_json::json!({"error": "Invalid date"})
        );
    }

    #[tokio::test]
    async fn test_not_found_body_is_exact() {
        let resp = ApiError::from(jotter_core::Error::NoteNotFound(Uuid::now_v7())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response_json(resp).await,
            serde_json::json!({"error": "Note not found"})
        );
    }

    #[tokio::test]
    async fn test_internal_error_body_hides_detail() {
        let resp = ApiError::Database(jotter_core::Error::Internal("pool exhausted".to_string()))
            .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response_json(resp).await,
            serde_json::json!({"error": "Internal server error"})
        );
    }
}
