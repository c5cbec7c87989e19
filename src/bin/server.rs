//! advperm REST API Server
//!
//! Run with: cargo run --features server --bin advperm-server
//!
//! Endpoints:
//!   GET    /health                     - Health check
//!   GET    /rules                      - List rules with display values
//!   POST   /rules                      - Create rule
//!   GET    /rules/:id                  - Get rule
//!   PUT    /rules/:id                  - Update rule
//!   DELETE /rules/:id                  - Delete rule
//!   GET    /rules/:id/display[/:field] - Display values
//!   GET    /rules/:id/users            - Users the members resolve to
//!   GET    /rules/:id/links            - List-view links
//!   GET    /modules/:tabid/cache       - Cached active rules of a module
//!   GET    /updater                    - Queued permission recalculations
//!   GET    /updater/:module            - Whether a module has a recalculation queued
//!   GET    /mail/check-config          - Mail configuration check

use std::sync::Arc;

use advperm::server::{init_logger, router, AppState};
use advperm::{cache, init_with, Config, MailSettingsCheck, Services, StaticDirectory};

const MAIL_SETTINGS: &[&str] = &["OSSMAIL_DEFAULT_HOST", "OSSMAIL_SMTP_SERVER", "OSSMAIL_SMTP_PORT"];

#[tokio::main]
async fn main() {
    let config = Config::from_env();
    init_logger(&config.log_level);

    if let Err(e) = init_with(&config) {
        tracing::error!(error = %e, path = %config.db_path, "failed to initialize store");
        std::process::exit(1);
    }

    let directory = match config.directory_path.as_deref() {
        Some(path) => match StaticDirectory::load(path) {
            Ok(d) => d,
            Err(e) => {
                tracing::error!(error = %e, path, "failed to load directory");
                std::process::exit(1);
            }
        },
        None => {
            tracing::warn!("ADVPERM_DIRECTORY not set, names and members will not resolve");
            StaticDirectory::default()
        }
    };
    let services = Services::from_shared(Arc::new(directory));

    if let Err(e) = cache::reload(services.directory.as_ref()) {
        tracing::error!(error = %e, "failed to build permission cache");
        std::process::exit(1);
    }

    let app = router(AppState::new(services, MailSettingsCheck::from_env(MAIL_SETTINGS)));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!("advperm-server v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server stopped");
    }
}
