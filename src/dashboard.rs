use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Json, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use colored::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::adapter::Adapter;
use crate::auth::{AuthError, Authenticator, Session};
use crate::classify::InvocationResult;
use crate::config::AppConfig;
use crate::query::Query;
use crate::tools::{InputKind, ToolId};

// Uploaded images can be large camera originals
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<Adapter>,
    pub auth: Authenticator,
    pub title: String,
}

impl AppState {
    pub fn new(config: &AppConfig, adapter: Adapter) -> Self {
        Self {
            adapter: Arc::new(adapter),
            auth: Authenticator::from_config(config),
            title: config.title.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    token: String,
    name: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
pub struct WarningResponse {
    warning: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    authenticated: bool,
    name: Option<String>,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ToolInfo {
    id: ToolId,
    label: &'static str,
    header: &'static str,
    prompt: &'static str,
    button: &'static str,
    input: InputKind,
}

#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: error.into() })).into_response()
}

fn require_session(state: &AppState, headers: &HeaderMap) -> Result<Session, Response> {
    let session = state.auth.session_from_headers(headers);
    if session.authenticated {
        Ok(session)
    } else {
        Err(error_response(StatusCode::UNAUTHORIZED, AuthError::MissingCredentials.to_string()))
    }
}

fn parse_tool(tool: &str) -> Result<ToolId, Response> {
    tool.parse::<ToolId>()
        .map_err(|e| error_response(StatusCode::NOT_FOUND, e))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, Response> {
    match state.auth.login(&payload.username, &payload.password) {
        Ok(issued) => {
            state.adapter.activity().login(payload.username.trim(), true);
            println!(
                "{}",
                format!("[+] {} logged in", issued.session.display_name).green()
            );

            let mut response = Json(LoginResponse {
                token: issued.token.clone(),
                name: issued.session.display_name.clone(),
            })
            .into_response();
            if let Ok(cookie) = state.auth.set_cookie(&issued.token).parse::<header::HeaderValue>() {
                response.headers_mut().insert(header::SET_COOKIE, cookie);
            }
            Ok(response)
        }
        Err(AuthError::TokenGeneration) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::TokenGeneration.to_string(),
        )),
        Err(err) => {
            state.adapter.activity().login(payload.username.trim(), false);
            Err(error_response(StatusCode::UNAUTHORIZED, err.to_string()))
        }
    }
}

async fn logout(State(state): State<Arc<AppState>>) -> Response {
    let mut response = Json(serde_json::json!({ "success": true })).into_response();
    if let Ok(cookie) = state.auth.clear_cookie().parse::<header::HeaderValue>() {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

async fn get_session(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Json<SessionResponse> {
    let session = state.auth.session_from_headers(&headers);
    let message = if session.authenticated {
        None
    } else {
        Some(AuthError::MissingCredentials.to_string())
    };

    Json(SessionResponse {
        authenticated: session.authenticated,
        name: session.authenticated.then(|| session.display_name.clone()),
        title: state.title.clone(),
        message,
    })
}

async fn list_tools(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ToolInfo>>, Response> {
    require_session(&state, &headers)?;

    let tools = ToolId::ALL
        .iter()
        .map(|tool| {
            let spec = tool.spec();
            ToolInfo {
                id: *tool,
                label: spec.label,
                header: spec.messages.header,
                prompt: spec.messages.prompt,
                button: spec.messages.button,
                input: spec.input,
            }
        })
        .collect();

    Ok(Json(tools))
}

async fn run(state: &AppState, session: &Session, tool: ToolId, query: Query) -> Result<Json<InvocationResult>, Response> {
    match state.adapter.invoke(session, tool, &query).await {
        Ok(result) => Ok(Json(result)),
        Err(err) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(WarningResponse { warning: err.warning }),
        )
            .into_response()),
    }
}

async fn invoke_tool(
    State(state): State<Arc<AppState>>,
    Path(tool): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<InvokeRequest>,
) -> Result<Json<InvocationResult>, Response> {
    let session = require_session(&state, &headers)?;
    let tool = parse_tool(&tool)?;

    let query = match (payload.image_url, payload.query) {
        (Some(url), _) if tool.spec().input == InputKind::Image => Query::ImageUrl(url),
        (_, Some(text)) => Query::Text(text),
        _ => Query::Text(String::new()),
    };

    run(&state, &session, tool, query).await
}

async fn upload_tool(
    State(state): State<Arc<AppState>>,
    Path(tool): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<InvocationResult>, Response> {
    let session = require_session(&state, &headers)?;
    let tool = parse_tool(&tool)?;

    let filename = headers
        .get("x-filename")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);
    let query = Query::Upload {
        bytes: body.to_vec(),
        filename,
    };

    run(&state, &session, tool, query).await
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/session", get(get_session))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/:tool/invoke", post(invoke_tool))
        .route("/api/tools/:tool/upload", post(upload_tool))
        .route("/", get(serve_frontend))
        .fallback(serve_frontend)
        .with_state(Arc::new(state))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
}

// Single page UI, never cached so config changes show up on reload
async fn serve_frontend() -> Response {
    let mut response = Html(include_str!("../dashboard-ui/index.html")).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-cache, no-store, must-revalidate, max-age=0"),
    );
    headers.insert(header::PRAGMA, header::HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, header::HeaderValue::from_static("0"));

    response
}

pub async fn start_dashboard_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    println!("{}", format!("[+] Dashboard listening on http://{}", addr).green().bold());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("{}", "[+] Dashboard server shut down gracefully".green());

    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            println!("\n{}", "[!] Received Ctrl+C signal, shutting down...".yellow());
        },
        _ = terminate => {
            println!("\n{}", "[!] Received SIGTERM signal, shutting down...".yellow());
        },
    }
}
