/*****************************************************************************************
 *
 *  trialwatch – Free-trial availability watcher
 *  --------------------------------------------
 *
 *  Polls the status page, emails the mailing list when sign-ups reopen.
 *
 *****************************************************************************************/

mod app;
mod config;
mod errors;
mod poller;
mod routes;
mod services;
mod state;
mod supervisor;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::FmtSubscriber;

use crate::config::AppConfig;

#[tokio::main]
async fn main() {
    //
    // ────────────────────────────────────────────────────────
    //  Load configuration (.env first, if present)
    // ────────────────────────────────────────────────────────
    //
    let dotenv = dotenvy::dotenv();

    let cfg = match AppConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            init_logging("info");
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    //
    // ────────────────────────────────────────────────────────
    //  Configure logging
    // ────────────────────────────────────────────────────────
    //
    init_logging(&cfg.log_level);

    match dotenv {
        Ok(path) => tracing::info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
    }

    tracing::info!("Starting trialwatch…");
    tracing::info!("Loaded configuration: {:?}", cfg);

    //
    // ────────────────────────────────────────────────────────
    //  Run until the server stops
    // ────────────────────────────────────────────────────────
    //
    if let Err(e) = supervisor::run(cfg).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    tracing::info!("Goodbye.");
}

fn init_logging(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
    }
}
