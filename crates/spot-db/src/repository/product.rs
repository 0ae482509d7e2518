//! # Product Repository
//!
//! Database operations for products: catalog reads and writes, and the
//! lock/decrement pair used by checkout.
//!
//! ## Locking Without `SELECT ... FOR UPDATE`
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a product row gets locked                        │
//! │                                                                         │
//! │  BEGIN (deferred, holds nothing yet)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE products SET stock = stock WHERE id = 'p1' RETURNING ...       │
//! │       │                                                                 │
//! │       ├── another writer active? wait up to busy_timeout               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Write lock held. The read snapshot starts now, so the returned        │
//! │  row is the latest committed stock and nobody can change it until      │
//! │  COMMIT / ROLLBACK.                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Repeat for 'p2', 'p3', ... in ascending id order                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use spot_core::Product;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found (active or not)
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, title, description, image_url,
                price_cents, stock, is_active,
                created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products ordered by title.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, title, description, image_url,
                price_cents, stock, is_active,
                created_at, updated_at
            FROM products
            WHERE is_active = 1
            ORDER BY title
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::UniqueViolation)` - id already exists
    /// * `Err(DbError::CheckViolation)` - negative price or stock
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, title = %product.title, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, title, description, image_url,
                price_cents, stock, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Updates an existing product's catalog fields and stock.
    ///
    /// Placed orders are unaffected: their items hold snapshots.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                title = ?2,
                description = ?3,
                image_url = ?4,
                price_cents = ?5,
                stock = ?6,
                is_active = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Existing cart lines and order items keep referencing it.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_active = 0, updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Locks the given products inside `tx` and returns their current rows.
    ///
    /// Ids are locked in ascending order regardless of the order passed in;
    /// duplicates are locked once. A missing id fails with `NotFound` and the
    /// caller's transaction should be dropped.
    pub async fn lock_for_update(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        ids: &[String],
    ) -> DbResult<Vec<Product>> {
        let mut ordered: Vec<&String> = ids.iter().collect();
        ordered.sort();
        ordered.dedup();

        debug!(count = ordered.len(), "Locking products");

        let mut locked = Vec::with_capacity(ordered.len());
        for id in ordered {
            let product = sqlx::query_as::<_, Product>(
                r#"
                UPDATE products SET stock = stock
                WHERE id = ?1
                RETURNING
                    id, title, description, image_url,
                    price_cents, stock, is_active,
                    created_at, updated_at
                "#,
            )
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id.as_str()))?;

            locked.push(product);
        }

        Ok(locked)
    }

    /// Decrements stock inside `tx`.
    ///
    /// Guarded by `stock >= quantity`: returns `Ok(false)` and changes
    /// nothing when the row no longer has enough stock.
    pub async fn decrement_stock(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        debug!(id = %id, quantity = quantity, "Decrementing stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?2, updated_at = ?3
            WHERE id = ?1 AND stock >= ?2
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use spot_core::Money;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db().await;
        let mug = Product::new("Mug", Money::from_cents(1000), 5).with_image_url("mug.png");

        db.products().insert(&mug).await.unwrap();
        let found = db.products().get_by_id(&mug.id).await.unwrap().unwrap();

        assert_eq!(found.title, "Mug");
        assert_eq!(found.price_cents, 1000);
        assert_eq!(found.stock, 5);
        assert!(found.is_active);
        assert_eq!(found.image_url.as_deref(), Some("mug.png"));

        assert!(db.products().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_negative_stock_rejected_by_schema() {
        let db = db().await;
        let bad = Product::new("Broken", Money::from_cents(100), -1);

        let err = db.products().insert(&bad).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_listing() {
        let db = db().await;
        let a = Product::new("Alpha", Money::from_cents(100), 1);
        let b = Product::new("Beta", Money::from_cents(100), 1);
        db.products().insert(&a).await.unwrap();
        db.products().insert(&b).await.unwrap();

        db.products().soft_delete(&a.id).await.unwrap();

        let listed = db.products().list_active(10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, b.id);
        assert_eq!(db.products().count().await.unwrap(), 1);

        let still_there = db.products().get_by_id(&a.id).await.unwrap().unwrap();
        assert!(!still_there.is_active);
    }

    #[tokio::test]
    async fn test_lock_returns_rows_in_ascending_order() {
        let db = db().await;
        let mut a = Product::new("A", Money::from_cents(100), 1);
        a.id = "b-product".to_string();
        let mut b = Product::new("B", Money::from_cents(100), 1);
        b.id = "a-product".to_string();
        db.products().insert(&a).await.unwrap();
        db.products().insert(&b).await.unwrap();

        let mut tx = db.begin().await.unwrap();
        let ids = vec![a.id.clone(), b.id.clone(), a.id.clone()];
        let locked = db.products().lock_for_update(&mut tx, &ids).await.unwrap();
        tx.commit().await.unwrap();

        let order: Vec<&str> = locked.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, vec!["a-product", "b-product"]);
    }

    #[tokio::test]
    async fn test_lock_missing_product_is_not_found() {
        let db = db().await;

        let mut tx = db.begin().await.unwrap();
        let err = db
            .products()
            .lock_for_update(&mut tx, &["nope".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_decrement_guard() {
        let db = db().await;
        let p = Product::new("Pen", Money::from_cents(150), 3);
        db.products().insert(&p).await.unwrap();

        let mut tx = db.begin().await.unwrap();
        assert!(db.products().decrement_stock(&mut tx, &p.id, 2).await.unwrap());
        assert!(!db.products().decrement_stock(&mut tx, &p.id, 2).await.unwrap());
        tx.commit().await.unwrap();

        let after = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 1);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let db = db().await;
        let p = Product::new("Cup", Money::from_cents(500), 4);
        db.products().insert(&p).await.unwrap();

        {
            let mut tx = db.begin().await.unwrap();
            db.products().decrement_stock(&mut tx, &p.id, 4).await.unwrap();
        }

        let after = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 4);
    }
}
