//! # Schema Migration Tool
//!
//! Opens the configured database, applies pending migrations and reports
//! the schema state. Run it before starting anything that serves traffic.
//!
//! ## Usage
//! ```bash
//! # Default database (./spot.db)
//! cargo run -p spot-service --bin spot-migrate
//!
//! # Custom location, verbose
//! SPOT_DATABASE_PATH=./data/spot.db RUST_LOG=debug cargo run -p spot-service --bin spot-migrate
//! ```

use spot_db::migrations::migration_status;
use spot_service::telemetry::init_tracing;
use spot_service::{Shop, ShopConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ShopConfig::load()?;
    init_tracing(&config.log_filter);

    info!(path = %config.database_path.display(), "Migrating Spot Commerce database");

    // Connecting runs every pending migration
    let shop = Shop::connect(config).await?;

    let (total, applied) = migration_status(shop.db().pool()).await?;
    info!(total, applied, "Migration status");

    if !shop.db().health_check().await {
        error!("Database failed health check after migration");
        shop.db().close().await;
        return Err("database health check failed".into());
    }

    let products = shop.db().products().count().await?;
    info!(active_products = products, "Database ready");

    shop.db().close().await;
    Ok(())
}
