//! HTTP and WebSocket surface of the dev server.
//!
//! Plain HTTP routes take lifecycle notifications and symbolication
//! requests; WebSocket routes register clients with the
//! [`DevServerContext`](crate::DevServerContext) and stream its broadcasts.

use crate::bundles::{BundleSource, PlatformBundleReader};
use crate::config::ServerConfig;
use crate::context::{PlatformStatus, SharedContext};
use crate::error::{Result, ServerError};
use crate::registry::ClientFilter;
use crate::session;
use axum::{
    extract::{ws::WebSocketUpgrade, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fob_dev_protocol::{LogEntry, MethodMessage, PlatformInfo, ProgressData};
use fob_symbolicate::{
    infer_platform_from_stack, CodeFrameOptions, RawStackFrame, SymbolicationResult, Symbolicator,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

const HELLO: &str = "React Native packager is running";
const STATUS: &str = "packager-status:running";

struct AppState {
    context: SharedContext,
    bundles: Arc<dyn BundleSource>,
    root: PathBuf,
    code_frame: CodeFrameOptions,
}

type SharedState = Arc<AppState>;

/// Development server.
pub struct DevServer {
    config: ServerConfig,
    context: SharedContext,
    bundles: Arc<dyn BundleSource>,
}

impl DevServer {
    /// Creates a server broadcasting through `context` and reading build
    /// output from `bundles`.
    pub fn new(config: ServerConfig, context: SharedContext, bundles: Arc<dyn BundleSource>) -> Self {
        Self {
            config,
            context,
            bundles,
        }
    }

    /// The event hub this server broadcasts through.
    pub fn context(&self) -> &SharedContext {
        &self.context
    }

    /// Binds the configured address and serves until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns error if the address cannot be bound or the accept loop fails
    pub async fn start<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    ///
    /// Platforms with existing build output are registered for discovery
    /// before the first request is accepted.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        for platform in self.bundles.platforms().await {
            self.context.register_platform(&platform);
        }

        let local_addr = listener.local_addr()?;
        let protocol = if self.config.https { "https" } else { "http" };
        tracing::info!(
            url = %format!("{protocol}://{local_addr}"),
            platforms = self.context.platforms().len(),
            "Development server running"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ServerError::Serve)?;

        tracing::info!("Development server stopped");
        Ok(())
    }

    /// Builds the axum router with all routes.
    pub fn router(&self) -> Router {
        let state = Arc::new(AppState {
            context: Arc::clone(&self.context),
            bundles: Arc::clone(&self.bundles),
            root: self.config.root.clone(),
            code_frame: self.config.code_frame,
        });

        Router::new()
            .route("/", get(handle_hello))
            .route("/status", get(handle_status))
            .route("/symbolicate", post(handle_symbolicate))
            .route("/hot", get(handle_hot_socket))
            .route("/message", get(handle_message_socket))
            .route("/api/platforms", get(handle_platforms))
            .route("/api/status", get(handle_platform_status))
            .route("/api/dashboard", get(handle_control_socket))
            .route("/api/dashboard/{platform}", get(handle_platform_socket))
            .route("/api/compilation/{platform}/start", post(handle_build_start))
            .route("/api/compilation/{platform}/end", post(handle_build_end))
            .route("/api/compilation/{platform}/progress", post(handle_progress))
            .route("/api/hmr/{platform}", post(handle_hmr))
            .route("/api/message", post(handle_message))
            .route("/api/logs", post(handle_logs))
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(state)
    }
}

/// Number of clients a broadcast reached.
#[derive(Debug, Serialize)]
struct Delivered {
    delivered: usize,
}

async fn handle_hello() -> &'static str {
    HELLO
}

async fn handle_status() -> &'static str {
    STATUS
}

async fn handle_platforms(State(state): State<SharedState>) -> Json<Vec<PlatformInfo>> {
    Json(state.context.platforms())
}

async fn handle_platform_status(
    State(state): State<SharedState>,
) -> Json<BTreeMap<String, PlatformStatus>> {
    Json(state.context.statuses())
}

#[derive(Debug, Deserialize)]
struct SymbolicateRequest {
    stack: Vec<RawStackFrame>,
}

/// Symbolicates a stack trace reported by the application.
///
/// Applications post the body as plain text, so it is parsed here rather
/// than through the `Json` extractor.
async fn handle_symbolicate(
    State(state): State<SharedState>,
    body: String,
) -> Result<Json<SymbolicationResult>> {
    let request: SymbolicateRequest = serde_json::from_str(&body)?;

    let platform = infer_platform_from_stack(&request.stack)
        .ok_or_else(|| ServerError::bad_request("Cannot infer platform from stack trace"))?;
    tracing::debug!(%platform, frames = request.stack.len(), "Symbolication requested");

    let reader = PlatformBundleReader::new(Arc::clone(&state.bundles), platform);
    let symbolicator =
        Symbolicator::new(state.root.clone(), reader).with_code_frame_options(state.code_frame);

    Ok(Json(symbolicator.process(request.stack).await))
}

async fn handle_build_start(
    State(state): State<SharedState>,
    Path(platform): Path<String>,
) -> StatusCode {
    state.context.notify_build_start(&platform);
    StatusCode::NO_CONTENT
}

async fn handle_build_end(
    State(state): State<SharedState>,
    Path(platform): Path<String>,
) -> StatusCode {
    state.context.notify_build_end(&platform);
    StatusCode::NO_CONTENT
}

async fn handle_progress(
    State(state): State<SharedState>,
    Path(platform): Path<String>,
    Json(progress): Json<ProgressData>,
) -> StatusCode {
    state.context.report_progress(&platform, progress);
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HmrBroadcast {
    event: Value,
    #[serde(default)]
    client_ids: Option<Vec<String>>,
}

async fn handle_hmr(
    State(state): State<SharedState>,
    Path(platform): Path<String>,
    Json(request): Json<HmrBroadcast>,
) -> Json<Delivered> {
    let delivered = state.context.broadcast_to_hmr_clients(
        &request.event,
        &platform,
        request.client_ids.as_deref(),
    );
    Json(Delivered { delivered })
}

async fn handle_message(
    State(state): State<SharedState>,
    Json(message): Json<MethodMessage>,
) -> Json<Delivered> {
    let delivered = state.context.broadcast_to_message_clients(&message);
    Json(Delivered { delivered })
}

/// Accepts one structured log record or an array of them.
async fn handle_logs(State(state): State<SharedState>, Json(body): Json<Value>) -> StatusCode {
    let records = match body {
        Value::Array(records) => records,
        record => vec![record],
    };

    for entry in records.into_iter().filter_map(LogEntry::from_json_record) {
        state.context.broadcast_log(entry);
    }
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HotQuery {
    platform: Option<String>,
    client_id: Option<String>,
}

async fn handle_hot_socket(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
    Query(query): Query<HotQuery>,
) -> Result<Response> {
    let platform = query
        .platform
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ServerError::bad_request("Missing `platform` query parameter"))?;

    Ok(upgrade(
        ws,
        &state,
        ClientFilter::Hmr {
            platform,
            client_id: query.client_id,
        },
    ))
}

async fn handle_message_socket(ws: WebSocketUpgrade, State(state): State<SharedState>) -> Response {
    upgrade(ws, &state, ClientFilter::Messages)
}

async fn handle_control_socket(ws: WebSocketUpgrade, State(state): State<SharedState>) -> Response {
    upgrade(ws, &state, ClientFilter::Dashboard { platform: None })
}

async fn handle_platform_socket(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
    Path(platform): Path<String>,
) -> Response {
    upgrade(
        ws,
        &state,
        ClientFilter::Dashboard {
            platform: Some(platform),
        },
    )
}

/// Registers the client and hands the socket to a session task.
///
/// The client is registered before the handshake completes so no broadcast
/// sent after the upgrade response is missed.
fn upgrade(ws: WebSocketUpgrade, state: &AppState, filter: ClientFilter) -> Response {
    let (subscription, broadcasts) = state.context.subscribe(filter);
    ws.on_upgrade(move |socket| session::run(socket, subscription, broadcasts))
        .into_response()
}
