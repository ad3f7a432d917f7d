//! # lab-desk Binary
//!
//! The entry point that assembles the helpdesk based on compile-time features.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use ld_api::handlers::AppState;
use ld_api::middleware::{cors_policy, security_headers, standard_middleware};
use ld_config::Settings;
use ld_core::clock::Clock;
use ld_core::desk::HelpDesk;
use ld_core::urgency::UrgencyMonitor;

// Feature-gated imports: storage is chosen at compile time
#[cfg(feature = "db-sqlite")]
use ld_db_sqlite::SqliteStore;

#[cfg(all(feature = "store-memory", not(feature = "db-sqlite")))]
use ld_store_memory::MemoryStore;

#[cfg(not(any(feature = "db-sqlite", feature = "store-memory")))]
compile_error!("enable a storage feature: `db-sqlite` or `store-memory`");

/// Periodically logs the tickets that have aged past the urgency threshold.
/// Escalation itself stays a resolver action.
fn spawn_urgency_sweep(urgency: UrgencyMonitor, clock: Arc<dyn Clock>, every: Duration) {
    actix_web::rt::spawn(async move {
        let mut ticker = actix_web::rt::time::interval(every);
        loop {
            ticker.tick().await;
            match urgency.sweep(clock.now()).await {
                Ok(ids) if !ids.is_empty() => {
                    log::info!("{} tickets eligible for escalation: {:?}", ids.len(), ids);
                }
                Ok(_) => {}
                Err(e) => log::error!("urgency sweep failed: {e}"),
            }
        }
    });
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // `.env` before the logger so RUST_LOG from it is honored, and the logger
    // before settings so nothing they report is lost.
    let dotenv = ld_config::load_dotenv();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    match dotenv {
        Ok(Some(path)) => log::debug!("environment loaded from {}", path.display()),
        Ok(None) => {}
        Err(e) => log::warn!("ignoring unreadable .env file: {e}"),
    }
    let settings = Settings::load()?;

    // 1. Initialize Storage Implementation
    #[cfg(feature = "db-sqlite")]
    let store = Arc::new(SqliteStore::new(&settings.database.url).await?);

    #[cfg(all(feature = "store-memory", not(feature = "db-sqlite")))]
    let store = Arc::new(MemoryStore::new());

    // 2. Assemble the engine (dynamic dispatch over the storage ports)
    let desk = HelpDesk::new(store.clone(), store, settings.engine_policy()?);
    log::info!(
        "urgency threshold {}s, sweep every {}s",
        desk.urgency.threshold().num_seconds(),
        settings.policy.sweep_interval_secs
    );

    // 3. Background sweep
    spawn_urgency_sweep(
        desk.urgency.clone(),
        desk.clock().clone(),
        Duration::from_secs(settings.policy.sweep_interval_secs),
    );

    let state = web::Data::new(AppState { desk });
    let (host, port) = settings.bind_address();
    log::info!("lab-desk starting on http://{host}:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(security_headers())
            .wrap(cors_policy())
            .wrap(standard_middleware())
            .configure(ld_api::configure_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
