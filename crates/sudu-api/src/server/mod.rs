//! Server setup and initialization
//!
//! Opens the credential store, wires the service context, starts the
//! background tasks and serves HTTP until a shutdown signal arrives.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sudu_bot::{BotHandler, BotPoller};
use sudu_common::{AppConfig, AppError};
use sudu_db::{
    create_pool, ensure_schema, PgEmailTokenRepository, PgOneTimeCodeRepository,
    PgPendingRegistrationRepository, PgPool, PgUserRepository,
};
use sudu_notify::{Notifier, TelegramClient};
use sudu_service::{AuthSettings, ExpirySweeper, ServiceContext, ServiceContextBuilder};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::middleware::apply_middleware;
use crate::routes::create_router;
use crate::state::AppState;

/// How long background tasks get to finish after the server stops
const BACKGROUND_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let config = state.config();
    let router = apply_middleware(
        create_router(),
        &config.cors,
        config.app.env.is_production(),
        Duration::from_secs(config.api.request_timeout_secs),
    );
    router.with_state(state)
}

/// Wire the Postgres repositories and the notifier into a service context
pub fn create_service_context(
    pool: &PgPool,
    notifier: Notifier,
    config: &AppConfig,
) -> Result<ServiceContext, AppError> {
    ServiceContextBuilder::new()
        .user_repo(Arc::new(PgUserRepository::new(pool.clone())))
        .email_token_repo(Arc::new(PgEmailTokenRepository::new(pool.clone())))
        .code_repo(Arc::new(PgOneTimeCodeRepository::new(pool.clone())))
        .pending_repo(Arc::new(PgPendingRegistrationRepository::new(pool.clone())))
        .notifier(Arc::new(notifier))
        .settings(AuthSettings::from_config(config))
        .build()
        .map_err(|e| AppError::Config(e.to_string()))
}

/// Start the expiry sweeper and, when configured, the bot poller
pub fn spawn_background_tasks(
    ctx: &ServiceContext,
    telegram: Option<TelegramClient>,
    config: &AppConfig,
    shutdown: &watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let mut tasks = Vec::new();

    let sweeper = ExpirySweeper::new(
        ctx.clone(),
        Duration::from_secs(config.sweep.interval_secs.max(1)),
    );
    tasks.push(tokio::spawn(sweeper.run(shutdown.clone())));

    match telegram {
        Some(client) if config.telegram.polling => {
            let poller = BotPoller::new(
                client,
                BotHandler::new(ctx.clone()),
                config.telegram.poll_timeout_secs,
            );
            tasks.push(tokio::spawn(poller.run(shutdown.clone())));
        }
        Some(_) => info!("Telegram polling disabled, bot commands are not handled"),
        None => {}
    }

    tasks
}

/// Run the HTTP server until `shutdown_signal` resolves
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(anyhow::anyhow!("Server error: {e}")))
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .api
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid API_HOST/API_PORT: {e}")))?;

    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&sudu_db::DatabaseConfig::from(&config.database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    ensure_schema(&pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    let notifier = Notifier::from_config(&config).map_err(|e| AppError::Config(e.to_string()))?;
    let telegram = notifier.telegram().cloned();
    let ctx = create_service_context(&pool, notifier, &config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let tasks = spawn_background_tasks(&ctx, telegram, &config, &shutdown_rx);

    let app = create_app(AppState::new(ctx, config));
    let served = run_server(app, addr).await;

    info!("Stopping background tasks...");
    // Receivers also stop when the sender is dropped
    let _ = shutdown_tx.send(true);
    for task in tasks {
        if tokio::time::timeout(BACKGROUND_SHUTDOWN_GRACE, task)
            .await
            .is_err()
        {
            warn!("Background task did not stop in time");
        }
    }

    pool.close().await;
    info!("Shutdown complete");

    served
}

/// Resolves on Ctrl-C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
