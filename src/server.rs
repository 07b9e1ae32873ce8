use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_http::validate_request::ValidateRequestHeaderLayer;

use crate::state::SharedState;

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Primary dashboard router: monitor control, progress, artifacts.
pub fn build_router(state: SharedState) -> Router {
    let auth = state.config.auth.clone();

    let router = Router::new()
        .route("/api/status", get(crate::routes::status::get_status))
        .route("/api/start-test", post(crate::routes::control::start_test))
        .route("/api/stop-test", post(crate::routes::control::stop_test))
        .route("/api/results", get(crate::routes::artifacts::get_results))
        .route(
            "/api/screenshots",
            get(crate::routes::artifacts::list_screenshots),
        )
        .route("/ws", get(crate::routes::ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state);

    apply_auth(router, auth)
}

/// Job server router: ad-hoc flow suites per region and environment.
pub fn build_job_router(state: SharedState) -> Router {
    let auth = state.config.auth.clone();

    let router = Router::new()
        .route("/api/run-tests", post(crate::routes::jobs::run_tests))
        .route(
            "/api/test-status/{job_id}",
            get(crate::routes::jobs::job_status),
        )
        .route(
            "/api/test-results/{job_id}",
            get(crate::routes::jobs::job_results),
        )
        .route(
            "/api/test-results/{job_id}/download",
            get(crate::routes::jobs::job_download),
        )
        .route("/api/trivia", get(crate::routes::jobs::trivia))
        .route("/api/health", get(crate::routes::jobs::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state);

    apply_auth(router, auth)
}

/// Wrap the router in shared basic auth when credentials are configured.
fn apply_auth(router: Router, auth: Option<(String, String)>) -> Router {
    match auth {
        Some((user, pass)) => router.layer(ValidateRequestHeaderLayer::basic(&user, &pass)),
        None => router,
    }
}
