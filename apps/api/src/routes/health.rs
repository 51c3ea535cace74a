use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version and which providers
/// have credentials.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "career-assistant",
        "providers": {
            "openai": state.config.openai_api_key.is_some(),
            "anthropic": state.config.anthropic_api_key.is_some(),
        }
    }))
}
