pub mod config;
pub mod telephony;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Form, Json, State};
use axum::http::{header, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, MethodRouter};
use axum::{body::Body, Router};
use ivr_agent::{CallbackInput, IvrAgent};
use ivr_core::{Route, VoiceDocument};
use ivr_observability::AppMetrics;
use ivr_storage::Store;
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::config::{ApiConfig, RecordSource};
use crate::telephony::{CallOriginator, TwilioClient};

pub use crate::config::ConfigError;
pub use crate::telephony::PlacedCall;

const MAX_BODY_BYTES: usize = 16 * 1024;
const TRIGGER_CALL_PATH: &str = "/trigger-call";

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<IvrAgent<Store>>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: Option<String>,
    pub originator: Option<Arc<dyn CallOriginator>>,
    pub record_backend: &'static str,
}

/// Provider form fields; anything else the provider posts is ignored.
#[derive(Debug, Default, Deserialize)]
struct CallbackForm {
    #[serde(rename = "Digits")]
    digits: Option<String>,
    #[serde(rename = "CallSid")]
    call_sid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProcessForm {
    simulated_text: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    record_backend: &'static str,
    metrics: ivr_observability::MetricsSnapshot,
    capabilities: HealthCapabilities,
}

#[derive(Debug, Serialize)]
struct HealthCapabilities {
    outbound_calls: bool,
    api_key_guard: bool,
}

/// Loads the record source and telephony client named by `config`. A record
/// source that cannot be opened fails startup.
pub async fn build_app(config: ApiConfig) -> Result<Router> {
    let store = match &config.record_source {
        RecordSource::JsonFile(path) => Store::json_file(path).await,
        RecordSource::Sqlite(database_url) => Store::sqlite(database_url).await,
    }
    .with_context(|| format!("failed to open record source {}", config.record_source))?;

    let originator = match config.telephony.clone() {
        Some(telephony) => {
            let client = TwilioClient::new(telephony)?;
            Some(Arc::new(client) as Arc<dyn CallOriginator>)
        }
        None => None,
    };

    Ok(build_app_with(&config, store, originator))
}

pub fn build_app_with(
    config: &ApiConfig,
    store: Store,
    originator: Option<Arc<dyn CallOriginator>>,
) -> Router {
    let metrics = AppMetrics::shared();
    let record_backend = store.backend();
    let agent = Arc::new(IvrAgent::new(
        Arc::new(store),
        metrics.clone(),
        config.demo_ids.clone(),
    ));

    build_router(ApiState {
        agent,
        metrics,
        api_key: config.api_key.clone(),
        originator,
        record_backend,
    })
}

pub fn build_router(state: ApiState) -> Router {
    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/process", post(process))
        .route(TRIGGER_CALL_PATH, get(trigger_call));

    for route in Route::ALL {
        router = router.route(route.path(), callback_route(route));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .with_state(state)
}

/// The provider may call back with GET (query string) or POST (form body).
/// A body that is not a form is treated as a callback without input.
fn callback_route(route: Route) -> MethodRouter<ApiState> {
    let handler = move |State(state): State<ApiState>, form: Option<Form<CallbackForm>>| async move {
        let form = form.map(|Form(form)| form).unwrap_or_default();
        let reply = state.agent.handle_callback(
            route,
            CallbackInput {
                digits: form.digits,
                call_sid: form.call_sid,
            },
        );
        xml_response(reply.document)
    };

    get(handler.clone()).post(handler)
}

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Server Running" }))
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        record_backend: state.record_backend,
        metrics: state.metrics.snapshot(),
        capabilities: HealthCapabilities {
            outbound_calls: state.originator.is_some(),
            api_key_guard: state.api_key.is_some(),
        },
    };
    (StatusCode::OK, Json(payload))
}

async fn process(
    State(state): State<ApiState>,
    form: Option<Form<ProcessForm>>,
) -> impl IntoResponse {
    let text = form.and_then(|Form(form)| form.simulated_text);
    let document = state.agent.process_text(text.as_deref()).await;
    xml_response(document)
}

async fn trigger_call(State(state): State<ApiState>) -> impl IntoResponse {
    let Some(originator) = state.originator.as_ref() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "error": "telephony_unavailable",
                "message": "outbound calling is not configured"
            })),
        )
            .into_response();
    };

    match originator.originate().await {
        Ok(call) => {
            state.metrics.inc_outbound_call();
            (StatusCode::OK, Json(call)).into_response()
        }
        Err(err) => {
            error!(error = ?err, "outbound call failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({
                    "error": "call_origination_failed",
                    "message": "the telephony provider rejected the call request"
                })),
            )
                .into_response()
        }
    }
}

fn xml_response(document: VoiceDocument) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, VoiceDocument::CONTENT_TYPE)],
        document.into_string(),
    )
        .into_response()
}

fn is_protected_endpoint(path: &str) -> bool {
    path == TRIGGER_CALL_PATH
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(request).await;
    };

    if request.method() == Method::OPTIONS || !is_protected_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let header_key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if constant_time_eq(header_key.as_bytes(), expected.as_bytes()) {
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "rejected request without valid x-api-key");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "unauthorized",
            "message": "missing or invalid x-api-key"
        })),
    )
        .into_response()
}

fn constant_time_eq(lhs: &[u8], rhs: &[u8]) -> bool {
    if lhs.len() != rhs.len() {
        return false;
    }
    let mut diff = 0_u8;
    for (a, b) in lhs.iter().zip(rhs.iter()) {
        diff |= a ^ b;
    }
    diff == 0
}
