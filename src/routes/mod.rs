use std::path::Path;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

use crate::AlarmService;

mod alarms;
mod error;
mod health;
mod payload;

// ---

/// Full application router. When `static_dir` is given, unmatched paths are
/// served from it so the front end and the API share one origin.
pub fn router(service: AlarmService, static_dir: Option<&Path>) -> Router {
    // ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(alarms::router())
        .merge(health::router())
        .with_state(service);

    let app = match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    };

    app.layer(cors)
}
