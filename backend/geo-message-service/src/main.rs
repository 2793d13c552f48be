use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use geo_message_service::config::{Config, StoreBackend};
use geo_message_service::db::{self, InMemoryMessageStore, PgMessageStore};
use geo_message_service::{handlers, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    match config.database.backend {
        StoreBackend::Postgres => {
            let pool = db::create_pool(&config.database)
                .await
                .context("create database pool")?;
            if config.database.run_migrations {
                db::run_migrations(&pool)
                    .await
                    .context("run database migrations")?;
                tracing::info!("Database migrations applied");
            }
            Ok(AppState::new(
                Arc::new(PgMessageStore::new(pool)),
                &config.retrieval,
            ))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory message store; data is lost on restart");
            Ok(AppState::new(
                Arc::new(InMemoryMessageStore::new()),
                &config.retrieval,
            ))
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Geo Message Service
///
/// Serves geo-tagged photo/caption messages to the mobile client.
///
/// # Routes
///
/// - `GET /messages` - messages inside a bounding box
/// - `GET /messages/{user_id}` - a user's messages
/// - `POST|PUT|DELETE /messages/{user_id}[/{message_id}]` - message edits
/// - `/health`, `/health/live`, `/metrics`
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env()
        .map_err(anyhow::Error::msg)
        .context("load configuration")?;

    tracing::info!("Starting geo-message-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!(
        store = ?config.database.backend,
        push_strategy = ?config.retrieval.push_strategy,
        overfetch_factor = config.retrieval.overfetch_factor,
        max_records_ceiling = config.retrieval.max_records_ceiling,
        legacy_inband_errors = config.retrieval.legacy_inband_errors,
        "Retrieval settings"
    );

    let state = web::Data::new(build_state(&config).await?);

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("bind {}", bind_address))?
    .workers(config.app.workers)
    .disable_signals()
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, stopping HTTP server");
        handle.stop(true).await;
    });

    server.await.context("http server")?;
    tracing::info!("geo-message-service stopped");
    Ok(())
}
