use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;
mod state;

use notification_cell::{LogSink, NotificationSink, NotificationWorker, QueuedNotifier, RetryPolicy, WebhookSink};
use shared_config::AppConfig;
use shared_utils::clock::SystemClock;

use crate::state::{identity_resolver, AppServices};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Scheduling API server");

    // Load configuration
    let config = AppConfig::from_env();

    // Notification delivery runs beside the server
    let sink: Arc<dyn NotificationSink> = match &config.notification_webhook_url {
        Some(url) => {
            info!("Delivering notifications to {}", url);
            Arc::new(WebhookSink::new(url.clone()))
        }
        None => Arc::new(LogSink),
    };
    let (notifier, receiver) = QueuedNotifier::channel();
    let worker = NotificationWorker::new(receiver, sink, RetryPolicy::from_config(&config));
    tokio::spawn(worker.run());

    let services = AppServices::build(
        &config,
        identity_resolver(&config)?,
        Arc::new(notifier),
        Arc::new(SystemClock),
    )?;

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(&services)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
