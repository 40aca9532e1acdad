// Plain HTTP routes that sit next to the WebSocket endpoint.

use axum::Json;

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
