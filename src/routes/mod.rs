pub mod likes;
pub mod medias;
pub mod tweets;
pub mod users;

use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The bare success envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct Success {
    pub result: bool,
}

impl Success {
    pub fn ok() -> Self {
        Self { result: true }
    }
}

/// Build the full application router: API routes, uploaded-image serving,
/// permissive CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let uploads_dir = state.config.uploads_path().clone();

    Router::new()
        .merge(tweets::router())
        .merge(likes::router())
        .merge(users::router())
        .merge(medias::router())
        .nest_service("/images", ServeDir::new(uploads_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
