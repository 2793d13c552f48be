/// Geo Message Service Library
///
/// Stores location-tagged photo/caption messages and answers two read
/// queries over them: every message inside a latitude/longitude rectangle,
/// and every message of one user. The backing store is only trusted to
/// evaluate one range predicate per query, so rectangle lookups are planned
/// as a single-coordinate range scan plus an in-memory residual filter.
///
/// # Modules
///
/// - `models`: Message and bounding box types
/// - `db`: Store capability trait and its PostgreSQL / in-memory adapters
/// - `services`: Query planning, retrieval and message editing
/// - `handlers`: HTTP request handlers and route table
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result, ValidationError};
pub use state::AppState;
