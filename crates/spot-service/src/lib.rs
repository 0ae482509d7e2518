//! # spot-service: Cart, Checkout and Orders for Spot Commerce
//!
//! The layer callers talk to. It owns transaction boundaries, lock ordering,
//! retry on contention and the error taxonomy.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Spot Commerce Request Flow                        │
//! │                                                                         │
//! │  HTTP / IPC layer (resolves the current UserId)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  spot-service (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   Shop ──┬── CartService      get / add / update / remove /     │   │
//! │  │          │                    clear                             │   │
//! │  │          ├── CheckoutEngine   selected lines → paid order       │   │
//! │  │          └── OrderService     history, single order             │   │
//! │  │                                                                 │   │
//! │  │   RetryPolicy · ShopError · ShopConfig · init_tracing           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                         │                                       │
//! │       ▼                         ▼                                       │
//! │  spot-core (planning, views)   spot-db (SQLite, row locks)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use spot_service::{Shop, ShopConfig};
//! use spot_core::UserId;
//!
//! let shop = Shop::connect(ShopConfig::load()?).await?;
//! let alice = UserId::new("alice");
//!
//! let cart = shop.cart().add_item(&alice, &product_id, 2).await?;
//! let ids: Vec<String> = cart.items.iter().map(|l| l.id.clone()).collect();
//! let order = shop.checkout().checkout(&alice, &ids).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod orders;
pub mod retry;
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use cart::CartService;
pub use checkout::CheckoutEngine;
pub use config::{ConfigError, ShopConfig};
pub use error::{ErrorBody, ErrorCode, ShopError, ShopResult};
pub use orders::OrderService;
pub use retry::{BackoffStrategy, RetryPolicy};

use spot_db::Database;
use tracing::info;

// =============================================================================
// Shop
// =============================================================================

/// Entry point bundling one database with the service configuration.
///
/// Cheap to clone. Services are created per call and share the pool.
#[derive(Debug, Clone)]
pub struct Shop {
    db: Database,
    config: ShopConfig,
}

impl Shop {
    /// Opens the database described by `config` and runs migrations.
    pub async fn connect(config: ShopConfig) -> ShopResult<Self> {
        config
            .validate()
            .map_err(|e| ShopError::Internal(e.to_string()))?;

        let db = Database::new(config.db_config()).await?;
        info!(path = %config.database_path.display(), "Shop connected");

        Ok(Shop::new(db, config))
    }

    /// Wraps an already-open database.
    pub fn new(db: Database, config: ShopConfig) -> Self {
        Shop { db, config }
    }

    pub fn cart(&self) -> CartService {
        CartService::new(
            self.db.clone(),
            self.config.retry_policy(),
            self.config.validate_stock_on_update,
        )
    }

    pub fn checkout(&self) -> CheckoutEngine {
        CheckoutEngine::new(self.db.clone(), self.config.retry_policy())
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.db.clone())
    }

    /// Direct database access (catalog maintenance, diagnostics).
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }
}
