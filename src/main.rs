mod logger;
mod modules;
mod shared;

use shared::config::Configs;
use shared::db::pg_pool;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logger::start_log();

    let configs = Configs::load_from_file("config.toml")?;
    let pool = pg_pool()?;

    let api = modules::api::start_api(pool, configs).await;
    if let Err(err) = api.await {
        log::error!("La API terminó de forma inesperada: {}", err);
    }

    Ok(())
}
