use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde_json::{Value, json};
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer};

use std::{path::PathBuf, sync::Arc};

use crate::{
    ServerError, TokenSigner, approvals, auth, expenses, invites, journeys, statistics,
};
use engine::{Engine, EngineError, MAX_RECEIPT_BYTES, Principal};

/// Room for the multipart framing and text fields around a receipt.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Directory served read-only under `receipts_path`. `None` disables it.
    pub receipts_dir: Option<PathBuf>,
    pub receipts_path: String,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            receipts_dir: None,
            receipts_path: "/receipts".to_string(),
            max_body_bytes: MAX_RECEIPT_BYTES + FORM_OVERHEAD_BYTES,
        }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub tokens: Arc<TokenSigner>,
}

/// Resolve the bearer token into a [`Principal`] request extension.
async fn require_auth(
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(EngineError::Unauthorized("missing bearer token".to_string()).into());
    };
    let principal = state
        .tokens
        .verify(bearer.token())
        .ok_or_else(|| EngineError::Unauthorized("invalid or expired token".to_string()))?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

async fn require_admin(
    Extension(principal): Extension<Principal>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    if !principal.is_admin() {
        return Err(EngineError::Forbidden("admins only".to_string()).into());
    }
    Ok(next.run(request).await)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: ServerState, config: &ServerConfig) -> Router {
    let admin = Router::new()
        .route("/pending-approvals", get(approvals::pending))
        .route("/approve/bulk", post(approvals::bulk))
        .route("/approve/{kind}/{id}", post(approvals::approve))
        .route("/reject/{kind}/{id}", post(approvals::reject))
        .route("/invite", post(invites::issue))
        .route("/invites", get(invites::list))
        .route("/invite/{token}", axum::routing::delete(invites::delete))
        .route("/accounts/{id}/status", put(invites::set_status))
        .route("/overview", get(statistics::overview))
        .route_layer(middleware::from_fn(require_admin));

    let protected = Router::new()
        .route("/expenses", post(expenses::create).get(expenses::list))
        .route(
            "/expenses/{id}",
            get(expenses::get)
                .put(expenses::update)
                .delete(expenses::delete),
        )
        .route("/journeys", post(journeys::create).get(journeys::list))
        .route(
            "/journeys/{id}",
            get(journeys::get)
                .put(journeys::update)
                .delete(journeys::delete),
        )
        .route("/dashboard", get(statistics::dashboard))
        .nest("/admin", admin)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .merge(protected)
        .with_state(state);

    let mut app = Router::new().nest("/api", api);
    if let Some(dir) = &config.receipts_dir {
        app = app.nest_service(&config.receipts_path, ServeDir::new(dir));
    }

    app.layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(engine: Engine, tokens: TokenSigner, config: ServerConfig) {
    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {}: {err}", config.bind_addr);
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, tokens, config, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    tokens: TokenSigner,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        tokens: Arc::new(tokens),
    };

    axum::serve(listener, router(state, &config)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    tokens: TokenSigner,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, tokens, config, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
