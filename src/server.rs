use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{delete, get, patch, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::SecurityConfig;
use crate::database::DatabaseManager;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::{AuthService, CardsService};

/// Shared per-process handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub cards: Arc<CardsService>,
    /// `None` when serving from in-memory stores.
    pub database: Option<DatabaseManager>,
    pub generation_timeout: Duration,
}

pub fn app(state: AppState, security: &SecurityConfig) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1", api_routes(state.clone()))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    match cors_layer(security) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth_public_routes())
        .merge(
            auth_routes()
                .merge(cards_routes())
                .route_layer(from_fn_with_state(state, jwt_auth_middleware)),
        )
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
}

fn auth_routes() -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/auth/me", get(auth::me_get))
        .route("/auth/password", put(auth::password_put))
}

fn cards_routes() -> Router<AppState> {
    use protected::cards;

    Router::new()
        .route("/cards/list", get(cards::cards_list))
        .route("/cards/by_id/:card_id", get(cards::card_get))
        .route("/cards/create", post(cards::cards_create))
        .route("/cards/create_multiple_cards", post(cards::cards_create_multiple))
        .route("/cards/generate_multiple_cards", post(cards::cards_generate))
        .route(
            "/cards/update/:card_id",
            patch(cards::card_patch).delete(cards::card_delete),
        )
        .route("/cards/delete/:card_id", delete(cards::card_delete))
}

/// Empty origin list allows any origin.
fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }

    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if security.cors_origins.is_empty() {
        return Some(layer.allow_origin(Any));
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    Some(layer.allow_origin(AllowOrigin::list(origins)))
}

async fn root() -> Json<Value> {
    Json(json!({
        "status": 200,
        "message": "Cards API",
        "data": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": "/health (public)",
                "public_auth": "/api/v1/auth/register, /api/v1/auth/login (public - token acquisition)",
                "auth": "/api/v1/auth/me, /api/v1/auth/password (protected)",
                "cards": "/api/v1/cards/* (protected)"
            }
        }
    }))
}

async fn health(axum::extract::State(state): axum::extract::State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let Some(database) = &state.database else {
        return (
            StatusCode::OK,
            Json(json!({
                "status": 200,
                "message": "ok",
                "data": { "timestamp": now, "database": "memory" }
            })),
        );
    };

    match database.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": 200,
                "message": "ok",
                "data": { "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": 503,
                    "message": "database unavailable",
                    "error": "SERVICE_UNAVAILABLE",
                    "data": { "timestamp": now, "database": "unavailable" }
                })),
            )
        }
    }
}
