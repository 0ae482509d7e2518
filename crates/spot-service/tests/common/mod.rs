//! Shared fixtures for spot-service integration tests.
//!
//! Each test gets its own file-backed SQLite database in a temp directory so
//! several pooled connections can contend for locks like they do in
//! production.

#![allow(dead_code)]

use std::ops::Deref;

use spot_core::{CartView, Money, Product, UserId};
use spot_service::{Shop, ShopConfig};
use tempfile::TempDir;

/// A shop on a throwaway database. The directory lives as long as this.
pub struct TestShop {
    shop: Shop,
    _dir: TempDir,
}

impl Deref for TestShop {
    type Target = Shop;

    fn deref(&self) -> &Shop {
        &self.shop
    }
}

impl TestShop {
    pub fn shop(&self) -> Shop {
        self.shop.clone()
    }
}

pub async fn test_shop() -> TestShop {
    test_shop_with(|_| {}).await
}

pub async fn test_shop_with(adjust: impl FnOnce(&mut ShopConfig)) -> TestShop {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ShopConfig::for_path(dir.path().join("shop.db"));
    config.retry_backoff_ms = 5;
    adjust(&mut config);

    let shop = Shop::connect(config).await.unwrap();
    TestShop { shop, _dir: dir }
}

pub async fn seed_product(shop: &Shop, title: &str, price_cents: i64, stock: i64) -> Product {
    let product = Product::new(title, Money::from_cents(price_cents), stock)
        .with_image_url(format!("https://img.example/{}.png", title.to_lowercase()));
    shop.db().products().insert(&product).await.unwrap()
}

pub async fn stock_of(shop: &Shop, product_id: &str) -> i64 {
    shop.db()
        .products()
        .get_by_id(product_id)
        .await
        .unwrap()
        .unwrap()
        .stock
}

pub async fn set_stock(shop: &Shop, product_id: &str, stock: i64) {
    let mut product = shop.db().products().get_by_id(product_id).await.unwrap().unwrap();
    product.stock = stock;
    shop.db().products().update(&product).await.unwrap();
}

pub async fn set_price(shop: &Shop, product_id: &str, price_cents: i64) {
    let mut product = shop.db().products().get_by_id(product_id).await.unwrap().unwrap();
    product.price_cents = price_cents;
    shop.db().products().update(&product).await.unwrap();
}

pub fn line_ids(view: &CartView) -> Vec<String> {
    view.items.iter().map(|line| line.id.clone()).collect()
}

pub fn user(name: &str) -> UserId {
    UserId::new(name)
}
