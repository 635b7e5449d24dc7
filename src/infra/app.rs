use axum::{
    Router,
    http::{HeaderValue, Method, Request, header},
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::Span;
use uuid::Uuid;

use crate::adapters::{self, http::app_state::AppState};

/// Full service router: subscription routes under `/api`, CORS for the web
/// client, hardening headers and one tracing span per request.
pub fn create_app(app_state: AppState) -> Router {
    let cors = subscription_cors(app_state.config.cors_origin.clone());

    Router::new()
        .nest("/api", adapters::http::routes::router())
        .with_state(app_state)
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
}

// Only reads and the two write actions (subscribe, cancel) are exposed.
fn subscription_cors(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

fn request_span<B>(request: &Request<B>) -> Span {
    tracing::info_span!(
        "http-request",
        method = %request.method(),
        uri = %request.uri(),
        version = ?request.version(),
        request_id = %Uuid::new_v4()
    )
}
