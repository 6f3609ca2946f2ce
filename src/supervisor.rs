use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task;

use crate::app;
use crate::config::AppConfig;
use crate::errors::WatchError;
use crate::poller::poll_loop;
use crate::services::mail_service::MailjetMailer;
use crate::services::page_service::StatusPage;
use crate::services::trigger_service::NotificationTrigger;
use crate::state::{AppState, SubscriberRegistry};

/// Wire everything together and run until the HTTP server stops.
///
/// The poll loop is cancelled however the server ends; a server failure is
/// returned to the caller after the loop has wound down.
pub async fn run(cfg: AppConfig) -> Result<(), WatchError> {
    //
    // ────────────────────────────────────────────────────────
    //  Shared registry (seeded from config)
    // ────────────────────────────────────────────────────────
    //
    let registry = Arc::new(SubscriberRegistry::with_subscribers(
        cfg.initial_subscribers(),
    ));
    if !registry.is_empty() {
        tracing::info!("Seeded mailing list with {} subscribers", registry.len());
    }

    //
    // ────────────────────────────────────────────────────────
    //  Start poll loop
    // ────────────────────────────────────────────────────────
    //
    let page = StatusPage::new(cfg.status_page_url.clone(), cfg.fetch_timeout())?;
    let mailer = Arc::new(MailjetMailer::new(&cfg)?);
    let trigger = NotificationTrigger::new(
        registry.clone(),
        mailer,
        cfg.unavailable_text.clone(),
    );

    let (cancel_tx, cancel_rx) = oneshot::channel();
    let poller = task::spawn(poll_loop(page, trigger, cfg.poll_interval(), cancel_rx));

    //
    // ────────────────────────────────────────────────────────
    //  Serve HTTP until shutdown or failure
    // ────────────────────────────────────────────────────────
    //
    let app = app::build_app(AppState::new(registry));
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let served = serve(addr, app).await;

    // The loop may already be gone if it panicked; nothing to signal then.
    let _ = cancel_tx.send(());
    if let Err(e) = poller.await {
        tracing::warn!("Poll loop ended abnormally: {}", e);
    }
    tracing::info!("Exiting poll loop task");

    served
}

async fn serve(addr: SocketAddr, app: Router) -> Result<(), WatchError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| WatchError::Bind { addr, source })?;

    tracing::info!("Starting server on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(WatchError::Server)
}

/// Completes on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::warn!("Shutdown signal received, stopping server…");
}
