use axum::response::Json;
use serde_json::{Value, json};

/// Liveness check for the login callback listener.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "oauth-callback",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
