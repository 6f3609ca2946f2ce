use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::routes::{subscribe_routes, system_routes};
use crate::state::AppState;

/// Build the complete Axum application:
/// - /subscribe (join / leave the mailing list)
/// - /system    (alive + version)
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(subscribe_routes::routes(state))
        .nest("/system", system_routes::routes())
        // Logging middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
