//! An inventory item manager with a REST API.

use inventory_manager::{
    app,
    domain::item::item_repository::PgItemRepository,
    infra::{config, database, logging, state::AppState},
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    let _guard = logging::init_logging("./logs");

    let config = config::load_config()?;
    let db = database::init_db(&config.database);
    database::migrate(&db).await?;

    let state = AppState::new(PgItemRepository::new(db), config.inventory);
    let listener = TcpListener::bind(format!(
        "{}:{}",
        config.server.http_address, config.server.http_port
    ))
    .await?;
    app::run_app(listener, state, config.server).await?;

    Ok(())
}
