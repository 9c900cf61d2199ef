pub mod db;
pub mod error;
pub mod http;
pub mod matching;
mod migrations;
pub mod seed;
pub mod services;
pub mod state;
pub mod store;
pub mod types;

use std::path::Path;

use db::MappingDb;
use state::{AppState, Config};

/// Startup options that are not part of the config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Load the embedded demo dataset into an empty database.
    pub seed_demo: bool,
}

/// Open the database, seed it if asked to, and serve HTTP until Ctrl-C.
pub async fn run(config: Config, options: RunOptions) -> Result<(), String> {
    let db_path = config.database_path()?;
    let db = MappingDb::open_at(db_path).map_err(|e| format!("Failed to open database: {e}"))?;

    seed_if_empty(&db, &config, options)?;

    let bind_address = config.bind_address.clone();
    let app = http::router(AppState::new(db, config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", bind_address, e))?;
    log::info!("Listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("Server error: {e}"))
}

/// Apply the configured seed file, or the demo dataset, to an empty database.
fn seed_if_empty(db: &MappingDb, config: &Config, options: RunOptions) -> Result<(), String> {
    if !db.is_empty().map_err(|e| e.to_string())? {
        return Ok(());
    }

    let seed = match (&config.seed_path, options.seed_demo) {
        (Some(path), _) => seed::load_seed_file(Path::new(path))?,
        (None, true) => seed::demo_seed()?,
        (None, false) => {
            log::warn!("Database is empty and no seed is configured");
            return Ok(());
        }
    };

    let summary = seed::apply_seed(db, &seed).map_err(|e| format!("Seeding failed: {e}"))?;
    log::info!(
        "Seeded {} employees, {} reports, {} rules",
        summary.employees,
        summary.reports,
        summary.rules
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}
