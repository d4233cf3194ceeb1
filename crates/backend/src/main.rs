pub mod domain;
pub mod handlers;
pub mod routes;
pub mod shared;
pub mod system;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use shared::config::{self, StorageBackend};
use shared::data::memory_store::MemoryStore;
use shared::data::sea_orm_store::SeaOrmStore;
use shared::data::store::CartridgeStore;
use system::app_state::AppState;

async fn open_store(config: &config::Config) -> anyhow::Result<Arc<dyn CartridgeStore>> {
    match config.storage.backend {
        StorageBackend::Sqlite => {
            let db_path = config::get_database_path(config);
            let conn = shared::data::db::initialize_database(&db_path.to_string_lossy())
                .await
                .map_err(|e| anyhow::anyhow!("db init failed: {e}"))?;
            Ok(Arc::new(SeaOrmStore::new(conn)))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    system::tracing::initialize()?;

    let config = config::load_config()?;
    let store = open_store(&config).await?;

    if config.storage.seed_demo_data {
        let report = system::initialization::seed_demo_data(store.as_ref()).await?;
        tracing::info!(
            "Demo data seeded: {} created, {} skipped",
            report.created,
            report.skipped
        );
    }

    let app = routes::configure_routes(AppState::new(store));

    let addr: SocketAddr = config.server.bind_address().parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Cartridge tracker listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
