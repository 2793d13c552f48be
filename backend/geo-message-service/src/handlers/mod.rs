/// HTTP request handlers and route table
pub mod health;
pub mod messages;

pub use health::{health_summary, liveness_check};
pub use messages::{
    create_message, delete_message, get_messages_in_box, get_user_messages, update_message,
};

use crate::error::AppError;
use actix_web::web;

/// Registers every route of the service. Shared by `main` and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .route("/health", web::get().to(health_summary))
    .route("/health/live", web::get().to(liveness_check))
    .route("/metrics", web::get().to(crate::metrics::serve_metrics))
    .service(
        web::scope("/messages")
            .service(web::resource("").route(web::get().to(get_messages_in_box)))
            .service(
                web::resource("/{user_id}")
                    .route(web::get().to(get_user_messages))
                    .route(web::post().to(create_message)),
            )
            .service(
                web::resource("/{user_id}/{message_id}")
                    .route(web::put().to(update_message))
                    .route(web::delete().to(delete_message)),
            ),
    );
}
