// src/runtime.rs

use crate::{
    auth::api_key_auth,
    config::{Config, ServerConfig},
    error::ProxyError,
    execution::{ExecutionProxy, ExecutionRequest, Language},
    questions::{QuestionProxy, QuestionQuery},
    request_id::RequestId,
    sinks::collecting::CollectingEventSink,
};

use axum::{
    body::Body,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{HeaderValue, Request},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::Span;

/// Shared by every handler.
pub struct AppState {
    pub execution: ExecutionProxy,
    pub questions: QuestionProxy,
    pub api_key: Option<String>,
}

impl AppState {
    pub fn from_config(cfg: &Config, client: reqwest::Client) -> Self {
        Self {
            execution: ExecutionProxy::from_config(&cfg.execution, client.clone()),
            questions: QuestionProxy::from_config(&cfg.questions, client),
            api_key: cfg.server.api_key.clone(),
        }
    }
}

/* ---------------- server ---------------- */

pub async fn serve(cfg: Config, client: reqwest::Client) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_config(&cfg, client));
    let app = build_router(state, &cfg.server);

    let socket: SocketAddr = cfg.server.addr.parse()?;
    let listener = TcpListener::bind(socket).await?;

    tracing::info!("codeclub proxy listening on http://{}", socket);

    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: Arc<AppState>, server: &ServerConfig) -> Router {
    let protected = Router::new()
        .route("/api/code/execute", post(execute))
        .route("/api/code/languages", get(languages))
        .route("/api/aptitude/questions", get(questions))
        .layer(middleware::from_fn_with_state(state.clone(), api_key_auth));

    Router::new()
        .route("/api/health", get(health))
        .merge(protected)
        .with_state(state)
        .layer(cors_layer(&server.allowed_origins))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<Body>| {
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        path = %req.uri().path(),
                    )
                })
                .on_response(|res: &Response, latency: Duration, _span: &Span| {
                    tracing::info!(
                        status = res.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "request completed"
                    );
                }),
        )
}

/// Permissive when no origin is configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if parsed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(parsed)
    }
}

/* ---------------- endpoints ---------------- */

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "OK", "message": "Server is running" }))
}

async fn languages() -> impl IntoResponse {
    let languages: Vec<_> = Language::alias_table()
        .iter()
        .map(|(alias, canonical)| json!({ "alias": alias, "language": canonical }))
        .collect();

    Json(json!({ "languages": languages }))
}

async fn execute(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ExecutionRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return ProxyError::InvalidRequest(rejection.body_text()).into_response();
        }
    };

    let request_id = RequestId::new();
    let mut sink = CollectingEventSink::new();

    let result = state.execution.execute(req, &request_id, &mut sink).await;

    tracing::info!(
        request_id = %request_id,
        attempts = %sink.summary(),
        ok = result.is_ok(),
        "code execution finished"
    );

    match result {
        Ok(result) => Json(result).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn questions(
    State(state): State<Arc<AppState>>,
    query: Result<Query<QuestionQuery>, QueryRejection>,
) -> impl IntoResponse {
    let request_id = RequestId::new();
    let mut sink = CollectingEventSink::new();

    // An unreadable query string still gets a batch, with default parameters.
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            tracing::warn!(
                request_id = %request_id,
                error = %rejection.body_text(),
                "unreadable question query, using defaults"
            );
            QuestionQuery::default()
        }
    };

    let req = state.questions.request_from_query(&query);
    let batch = state.questions.get_questions(&req, &request_id, &mut sink).await;

    tracing::info!(
        request_id = %request_id,
        attempts = %sink.summary(),
        source = %batch.source,
        count = batch.questions.len(),
        "question batch served"
    );

    Json(batch)
}
