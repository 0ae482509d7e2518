//! # Repository Module
//!
//! Database repository implementations for Spot Commerce.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two kinds of repository method                       │
//! │                                                                         │
//! │  Pool methods (&self, ...)                                             │
//! │  └── one statement, autocommit: reads, catalog writes, single deletes  │
//! │                                                                         │
//! │  Transaction methods (&self, tx: &mut Transaction<'_, Sqlite>, ...)    │
//! │  └── run on the caller's transaction; spot-service decides where it    │
//! │      begins, what it locks first and when it commits                   │
//! │                                                                         │
//! │  CheckoutEngine                                                        │
//! │       │  let mut tx = db.begin().await?;                               │
//! │       │  db.products().lock_for_update(&mut tx, &ids)                  │
//! │       │  db.orders().insert_order(&mut tx, &order)                     │
//! │       │  db.carts().delete_items(&mut tx, &lines)                      │
//! │       ▼  tx.commit().await?;                                           │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog rows, locking, stock
//! - [`CartRepository`](cart::CartRepository) - Carts and cart lines
//! - [`OrderRepository`](order::OrderRepository) - Orders and snapshotted items

pub mod cart;
pub mod order;
pub mod product;
