//! Application bootstrapper
//!
//! Handles all initialization and setup for the clinic portal backend.

use std::sync::Arc;
use std::time::Duration;

use axum::{http::HeaderValue, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::CONFIG;
use crate::db;
use crate::endpoints;
use crate::services::push::{DeliveryDefaults, Dispatcher, PushTransport, WebPushTransport};
use crate::services::scheduler::{self, MedicationReminderTask, PeriodicTask};
use crate::state::AppState;

/// Bootstrap and run the application
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting clinic portal backend v{}", env!("CARGO_PKG_VERSION"));

    let state = init_services().await?;

    start_background_tasks(&state);

    let app = create_app(state);

    serve(app).await
}

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("clinic_portal={}", CONFIG.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(false))
        .init();
}

/// Initialize all application services
async fn init_services() -> anyhow::Result<AppState> {
    // Connect and run migrations
    let conn = db::connect().await?;
    tracing::info!("Database connection established");

    let dispatcher = init_push(&conn);
    let public_key = dispatcher
        .as_ref()
        .and_then(|_| CONFIG.push.vapid.as_ref())
        .map(|vapid| vapid.public_key.clone());

    Ok(AppState::new(conn, dispatcher, public_key))
}

/// Build the push dispatcher when a VAPID key pair is configured
fn init_push(conn: &db::DbConn) -> Option<Arc<Dispatcher>> {
    let Some(vapid) = CONFIG.push.vapid.as_ref() else {
        tracing::warn!(
            "PORTAL_VAPID_PUBLIC_KEY/PORTAL_VAPID_PRIVATE_KEY not set - push notifications disabled"
        );
        return None;
    };

    match WebPushTransport::new(
        vapid,
        CONFIG.push.ttl_secs,
        Duration::from_secs(CONFIG.push.timeout_secs),
    ) {
        Ok(transport) => {
            let transport: Arc<dyn PushTransport> = Arc::new(transport);
            tracing::info!("Web push transport initialized");
            Some(Arc::new(Dispatcher::new(
                conn.clone(),
                transport,
                DeliveryDefaults::from_config(&CONFIG.push),
            )))
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize web push: {}. Push notifications will be unavailable.",
                e
            );
            None
        }
    }
}

/// Start periodic tasks
fn start_background_tasks(state: &AppState) {
    if !CONFIG.reminders.enabled {
        tracing::info!("Medication reminders disabled");
        return;
    }

    let sweep = match state.reminder_sweep() {
        Ok(sweep) => Arc::new(sweep),
        Err(_) => {
            tracing::info!("Push not configured - medication reminder task not started");
            return;
        }
    };

    let tasks: Vec<Box<dyn PeriodicTask>> = vec![Box::new(MedicationReminderTask::new(
        sweep,
        Duration::from_secs(CONFIG.reminders.interval_secs),
    ))];

    scheduler::start_scheduler(tasks);
}

/// Create the main application router
fn create_app(state: AppState) -> Router {
    endpoints::create_router(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&CONFIG.server.allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the HTTP server
async fn serve(app: Router) -> anyhow::Result<()> {
    let addr = format!("{}:{}", CONFIG.server.host, CONFIG.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
