//! # Service Error Type
//!
//! The error taxonomy every cart, checkout and order operation returns.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Spot Commerce                          │
//! │                                                                         │
//! │  ValidationError ──► CoreError ──┐                                     │
//! │                                   ├──► ShopError ──► ErrorBody (JSON)  │
//! │  sqlx::Error ─────► DbError ─────┘        │                            │
//! │                                            │                            │
//! │                                            ├── code()        NOT_FOUND │
//! │                                            ├── status_code() 404       │
//! │                                            └── is_retriable()          │
//! │                                                                         │
//! │  Transient is the only retriable kind. The retry policy replays the    │
//! │  whole transaction; every other kind aborts it and surfaces.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! ```json
//! {
//!   "code": "INSUFFICIENT_STOCK",
//!   "message": "Insufficient stock for product Y: requested 10, available 3",
//!   "productId": "Y",
//!   "requested": 10,
//!   "available": 3
//! }
//! ```

use serde::Serialize;
use spot_core::{CoreError, ValidationError};
use spot_db::DbError;
use thiserror::Error;
use ts_rs::TS;

/// Errors returned by spot-service operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShopError {
    /// Malformed, empty or ownership-mismatched input. Not retriable as-is.
    #[error("{0}")]
    InvalidRequest(String),

    /// Referenced cart, product or order does not exist for this user.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Not enough stock. Carries everything the caller needs to react.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// A unique constraint or a guarded write lost to another writer.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Lock contention or pool timeout. Safe to retry unmodified.
    #[error("Temporarily unavailable: {0}")]
    Transient(String),

    /// Anything else. Details are logged, not returned.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorCode {
    /// 400
    InvalidRequest,
    /// 404
    NotFound,
    /// 409
    InsufficientStock,
    /// 409
    Conflict,
    /// 503
    Transient,
    /// 500
    Internal,
}

/// Serialisable error body for HTTP or IPC callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub requested: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub available: Option<i64>,
}

impl ShopError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ShopError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ShopError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            ShopError::NotFound { .. } => ErrorCode::NotFound,
            ShopError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            ShopError::Conflict(_) => ErrorCode::Conflict,
            ShopError::Transient(_) => ErrorCode::Transient,
            ShopError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// HTTP status for this error. Both 409s are told apart by `code()`.
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::InvalidRequest(_) => 400,
            ShopError::NotFound { .. } => 404,
            ShopError::InsufficientStock { .. } | ShopError::Conflict(_) => 409,
            ShopError::Transient(_) => 503,
            ShopError::Internal(_) => 500,
        }
    }

    /// True only for lock contention and pool timeouts.
    pub fn is_retriable(&self) -> bool {
        matches!(self, ShopError::Transient(_))
    }

    pub fn body(&self) -> ErrorBody {
        let (product_id, requested, available) = match self {
            ShopError::InsufficientStock {
                product_id,
                requested,
                available,
            } => (Some(product_id.clone()), Some(*requested), Some(*available)),
            _ => (None, None, None),
        };

        ErrorBody {
            code: self.code(),
            message: self.to_string(),
            product_id,
            requested,
            available,
        }
    }
}

/// Converts database errors to service errors.
impl From<DbError> for ShopError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ShopError::NotFound { entity, id },
            DbError::UniqueViolation { field, value } => {
                ShopError::Conflict(format!("{} '{}' already exists", field, value))
            }
            DbError::CheckViolation { message } => {
                tracing::warn!("Check constraint rejected write: {}", message);
                ShopError::Conflict("Write rejected by a data constraint".to_string())
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ShopError::InvalidRequest("Invalid reference".to_string())
            }
            DbError::Busy(message) => ShopError::Transient(message),
            DbError::PoolExhausted => ShopError::Transient("Database pool exhausted".to_string()),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ShopError::Internal("Database connection failed".to_string())
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ShopError::Internal("Database migration failed".to_string())
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ShopError::Internal("Database operation failed".to_string())
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ShopError::Internal("Database operation failed".to_string())
            }
        }
    }
}

/// `tx.commit()` and friends return raw sqlx errors.
impl From<sqlx::Error> for ShopError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

/// Converts core errors to service errors.
impl From<CoreError> for ShopError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ShopError::not_found("Product", id),
            CoreError::OrderNotFound(id) => ShopError::not_found("Order", id),
            CoreError::CartNotFound => ShopError::not_found("Cart", "current user"),
            CoreError::InsufficientStock {
                product_id,
                requested,
                available,
            } => ShopError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            // Same message whether the line is missing or someone else's
            CoreError::CartItemNotFound(_) => {
                ShopError::InvalidRequest("Cart item not found".to_string())
            }
            e @ (CoreError::ProductInactive(_)
            | CoreError::NothingSelected
            | CoreError::NoValidItems
            | CoreError::CartTooLarge { .. }) => ShopError::InvalidRequest(e.to_string()),
            CoreError::Validation(e) => ShopError::InvalidRequest(e.to_string()),
        }
    }
}

impl From<ValidationError> for ShopError {
    fn from(err: ValidationError) -> Self {
        ShopError::InvalidRequest(err.to_string())
    }
}

/// Convenience type alias for Results with ShopError.
pub type ShopResult<T> = Result<T, ShopError>;

// =============================================================================
// Unit Tests
// =============================================================================
