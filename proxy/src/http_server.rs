use crate::chat_proxy::{ChatProxy, ProxyError};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use gemini_ipc::chat_request::{ChatReply, ChatRequest, CHAT_ROUTE};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, warn};

/// Application state shared with all routes
#[derive(Clone)]
pub struct AppState {
    proxy: Arc<ChatProxy>,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self, "Chat request failed");
        }
        (status, Json(self.to_body())).into_response()
    }
}

/// Build the router serving the chat route and the health check
pub fn router(proxy: Arc<ChatProxy>, cors: bool) -> Router {
    let state = AppState { proxy };

    let app = Router::new()
        .route("/", get(health))
        .route(CHAT_ROUTE, post(handle_chat))
        .with_state(state);

    if cors {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    }
}

/// Start the HTTP server
pub async fn run_server(proxy: Arc<ChatProxy>, addr: SocketAddr, cors: bool) -> anyhow::Result<()> {
    let model = proxy.model_name().to_string();
    let configured = proxy.credential().is_configured();
    let app = router(proxy, cors);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;

    info!(%addr, %model, "Chat proxy listening");
    if !configured {
        warn!("GEMINI_API_KEY is not configured; chat requests will be answered with a configuration error");
    }
    info!(
        "Try it: curl -X POST http://{}{} -H \"Content-Type: application/json\" -d '{{\"message\":\"Hello\"}}'",
        addr, CHAT_ROUTE
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start HTTP server: {}", e))
}

/// Health check handler
async fn health() -> impl IntoResponse {
    "Chat proxy is running"
}

/// Handler for chat requests
///
/// A body that is not JSON is treated like one without a message.
async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ProxyError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(error = %rejection, "Unreadable chat request body");
            ChatRequest::default()
        }
    };

    state.proxy.handle(&request).await.map(Json)
}
