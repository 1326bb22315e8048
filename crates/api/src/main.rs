use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use messenger_api::config::ServerConfig;
use messenger_api::notifications::NotificationRouter;
use messenger_api::router::build_app_router;
use messenger_api::state::AppState;
use messenger_api::ws;
use messenger_events::{EmailConfig, EventBus, Mailer};
use messenger_widget::geo::HttpLocationResolver;
use messenger_widget::store::PgStore;
use messenger_widget::{BackgroundTasks, Messenger, WidgetConfig};

type StartupResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> StartupResult<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "messenger_api=debug,messenger_widget=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let widget_config = WidgetConfig::from_env();
    tracing::info!(mode = ?widget_config.deploy_mode, "Loaded widget configuration");

    // --- Database ---
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;

    let pool = messenger_db::create_pool(&database_url).await?;
    tracing::info!("Database connection pool created");

    messenger_db::health_check(&pool).await?;
    tracing::info!("Database health check passed");

    messenger_db::run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    // --- WebSocket manager + heartbeat ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let router_cancel = CancellationToken::new();
    let notification_router = NotificationRouter::new(Arc::clone(&ws_manager));
    let router_handle = tokio::spawn(
        notification_router.run(event_bus.subscribe(), router_cancel.clone()),
    );
    tracing::info!("Notification router started");

    // --- Email ---
    let mailer = EmailConfig::from_env().map(|email_config| {
        tracing::info!(service = %email_config.service, "Outbound email enabled");
        Arc::new(Mailer::new(email_config))
    });

    // --- Messenger ---
    let tasks = BackgroundTasks::new();
    let resolver = HttpLocationResolver::new(&widget_config)?;
    let messenger = Arc::new(Messenger::new(
        Arc::new(PgStore::new(pool)),
        Arc::clone(&event_bus) as _,
        Arc::new(resolver),
        tasks.clone(),
    ));

    // --- App state + router ---
    let state = AppState {
        messenger,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        event_bus,
        mailer,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(config.host.parse()?, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    let drained = tasks.shutdown(widget_config.task_drain_timeout()).await;
    tracing::info!(drained, "Background tasks stopped");

    router_cancel.cancel();
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let _ = tokio::time::timeout(shutdown_timeout, router_handle).await;
    tracing::info!("Notification router stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
