//! Prometheus metrics for geo-message-service.
//!
//! Collectors for the retrieval paths and an HTTP handler for `/metrics`.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Retrievals by mode (bounding_box, user_id) and outcome (ok, invalid, unavailable, timeout).
    pub static ref GEO_MESSAGE_QUERIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "geo_message_queries_total",
        "Message retrievals segmented by mode and outcome",
        &["mode", "outcome"]
    )
    .expect("failed to register geo_message_queries_total");

    pub static ref GEO_MESSAGE_QUERY_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "geo_message_query_duration_seconds",
        "Message retrieval duration segmented by mode",
        &["mode"]
    )
    .expect("failed to register geo_message_query_duration_seconds");

    /// Rows pulled from the store per bounding-box retrieval, by pushed dimension.
    pub static ref GEO_MESSAGE_CANDIDATES_SCANNED: HistogramVec = register_histogram_vec!(
        "geo_message_candidates_scanned",
        "Candidate rows fetched per bounding-box retrieval segmented by pushed dimension",
        &["dimension"],
        vec![1.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0, 10000.0]
    )
    .expect("failed to register geo_message_candidates_scanned");

    /// Rows dropped by the residual filter, by pushed dimension.
    pub static ref GEO_MESSAGE_RESIDUAL_DISCARDS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "geo_message_residual_discards_total",
        "Candidate rows discarded by the in-memory residual filter",
        &["dimension"]
    )
    .expect("failed to register geo_message_residual_discards_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
