use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};

/// Build the Axum router: health endpoint plus the channel routers.
pub fn build_router(channel_routers: Vec<Router>) -> Router {
    let mut app = Router::new().route("/api/health", get(health));
    for router in channel_routers {
        app = app.merge(router);
    }
    app
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "kunstbot",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
