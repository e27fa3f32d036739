// Cadastro Form - Web Server
// REST API with Axum: masks and CEP autofill for the registration pages

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use cadastro_form::{
    config, logging, mask, CepAutofill, ElementId, FieldKind, FormDocument, InMemoryForm,
    LogConfig, LookupBindings, LookupConfig, LookupOutcome, ViaCepClient,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

/// Shared application state
#[derive(Clone)]
struct AppState {
    autofill: Arc<CepAutofill<ViaCepClient>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn err(data: T, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.into()),
        }
    }
}

#[derive(Deserialize)]
struct MaskQuery {
    #[serde(default)]
    value: String,
}

#[derive(Serialize)]
struct MaskResponse {
    kind: String,
    value: String,
}

/// CEP lookup response (the three autofilled fields)
#[derive(Serialize, Default)]
struct CepResponse {
    outcome: String,
    street: String,
    city: String,
    state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/mask/:kind?value=... - Mask a raw field value
async fn mask_value(
    Path(kind): Path<String>,
    Query(query): Query<MaskQuery>,
) -> impl IntoResponse {
    match FieldKind::from_code(&kind) {
        Some(field) => {
            let response = MaskResponse {
                kind: field.code().to_string(),
                value: mask(field, &query.value),
            };
            (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::err(
                MaskResponse {
                    kind,
                    value: query.value,
                },
                "unknown field kind",
            )),
        )
            .into_response(),
    }
}

/// GET /api/cep/:cep - Resolve a CEP into street/city/state
async fn lookup_cep(State(state): State<AppState>, Path(cep): Path<String>) -> impl IntoResponse {
    let form = InMemoryForm::registration().with_value(ElementId::Cep, &cep);
    let outcome = state.autofill.trigger(&form).await;

    let response = CepResponse {
        outcome: outcome.code().to_string(),
        street: form.value(ElementId::Street).unwrap_or_default(),
        city: form.value(ElementId::City).unwrap_or_default(),
        state: form.value(ElementId::State).unwrap_or_default(),
        message: outcome.message().map(str::to_string),
    };

    let status = match &outcome {
        LookupOutcome::Filled(_) => StatusCode::OK,
        LookupOutcome::Rejected(_) => StatusCode::BAD_REQUEST,
        LookupOutcome::NotFound => StatusCode::NOT_FOUND,
        LookupOutcome::NetworkError(err) => {
            log::warn!("[api] GET /api/cep/{} answered 502: {}", cep, err);
            StatusCode::BAD_GATEWAY
        }
    };

    match outcome {
        LookupOutcome::Filled(_) => (status, Json(ApiResponse::ok(response))).into_response(),
        _ => {
            let error = response.message.clone().unwrap_or_default();
            (status, Json(ApiResponse::err(response, error))).into_response()
        }
    }
}

#[tokio::main]
async fn main() {
    println!("🌐 Starting Cadastro Form API Server...");

    let log_config = LogConfig::from_env().unwrap_or_else(|err| {
        eprintln!("❌ {}", err);
        std::process::exit(1);
    });
    logging::init(&log_config);

    let lookup_config = LookupConfig::from_env().unwrap_or_else(|err| {
        eprintln!("❌ {}", err);
        std::process::exit(1);
    });
    let client = ViaCepClient::new(&lookup_config).unwrap_or_else(|err| {
        eprintln!("❌ Failed to build HTTP client: {}", err);
        std::process::exit(1);
    });
    println!("✓ CEP lookup via {}", lookup_config.base_url);

    // Create shared state
    let state = AppState {
        autofill: Arc::new(CepAutofill::new(client, LookupBindings::registration())),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/mask/:kind", get(mask_value))
        .route("/cep/:cep", get(lookup_cep))
        .with_state(state);

    // Build main router
    let app = Router::new()
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new("static"))
        .layer(CorsLayer::permissive());

    // Start server
    let addr = config::server_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("❌ Failed to bind to {}: {}", addr, err);
            std::process::exit(1);
        }
    };

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/cep/01310100", addr);
    println!("\n   Press Ctrl+C to stop\n");

    if let Err(err) = axum::serve(listener, app).await {
        eprintln!("❌ Server error: {}", err);
        std::process::exit(1);
    }
}
