/// Health endpoints
use crate::state::AppState;
use actix_web::{web, HttpResponse};

/// `GET /health` - store round trip
pub async fn health_summary(state: web::Data<AppState>) -> HttpResponse {
    match state.store.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "geo-message-service",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "error": e.to_string(),
                "service": "geo-message-service",
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }))
        }
    }
}

/// `GET /health/live`
pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "alive": true }))
}
