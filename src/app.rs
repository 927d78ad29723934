use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::handlers::{chapters, health, projects, users};
use crate::middleware::{require_auth, require_staff};
use crate::state::AppState;

/// Build the full router over `state`.
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        .route("/health", get(health::health))
        .merge(user_routes(&state))
        .merge(public_project_routes())
        .merge(staff_routes(&state))
        .with_state(state)
        // Global middleware
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(cors_layer(&config.security.cors_origins));

    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn user_routes(state: &AppState) -> Router<AppState> {
    let authenticated = Router::new()
        .route("/api/user/me", get(users::me))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/api/user/register", post(users::register))
        .route("/api/user/login", post(users::login))
        .merge(authenticated)
}

fn public_project_routes() -> Router<AppState> {
    Router::new()
        .route("/api/project", get(projects::list))
        .route("/api/project/featured", get(projects::featured))
        .route("/api/project/latest", get(projects::latest))
        .route("/api/project/:slug", get(projects::show))
        .route("/api/project/:slug/chapters", get(chapters::list_for_project))
        .route("/api/chapter/:slug", get(chapters::show))
}

/// Mutations; each request re-resolves the caller and checks `is_staff`.
fn staff_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/project", post(projects::create))
        .route("/api/project/:slug", axum::routing::put(projects::update).delete(projects::delete))
        .route("/api/project/:slug/chapters", post(chapters::create))
        .route("/api/chapter/:slug", axum::routing::put(chapters::update).delete(chapters::delete))
        .route_layer(from_fn_with_state(state.clone(), require_staff))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
