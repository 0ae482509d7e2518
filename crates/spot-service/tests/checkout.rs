//! Checkout behaviour against a real SQLite database.

mod common;

use common::{line_ids, seed_product, set_price, set_stock, stock_of, test_shop, user};
use spot_core::{Money, OrderStatus};
use spot_service::ShopError;

#[tokio::test]
async fn test_checkout_single_line() {
    let shop = test_shop().await;
    let alice = user("alice");
    let x = seed_product(&shop, "Lamp", 1000, 5).await;

    let cart = shop.cart().add_item(&alice, &x.id, 2).await.unwrap();
    let order = shop.checkout().checkout(&alice, &line_ids(&cart)).await.unwrap();

    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.total, Money::from_cents(2000));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].product_id, x.id);
    assert_eq!(order.items[0].unit_price, Money::from_cents(1000));
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.items[0].line_total, Money::from_cents(2000));

    assert_eq!(stock_of(&shop, &x.id).await, 3);

    let cart = shop.cart().get_cart(&alice).await.unwrap();
    assert!(cart.is_empty());
    assert!(cart.id.is_some(), "cart row survives checkout");
}

#[tokio::test]
async fn test_insufficient_stock_changes_nothing() {
    let shop = test_shop().await;
    let alice = user("alice");
    let y = seed_product(&shop, "Chair", 2500, 10).await;

    let cart = shop.cart().add_item(&alice, &y.id, 10).await.unwrap();
    set_stock(&shop, &y.id, 3).await;

    let err = shop
        .checkout()
        .checkout(&alice, &line_ids(&cart))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ShopError::InsufficientStock {
            product_id: y.id.clone(),
            requested: 10,
            available: 3,
        }
    );
    assert_eq!(err.status_code(), 409);

    assert_eq!(stock_of(&shop, &y.id).await, 3);
    let after = shop.cart().get_cart(&alice).await.unwrap();
    assert_eq!(after.items.len(), 1);
    assert_eq!(after.items[0].quantity, 10);

    let history = shop.orders().list_orders(&alice, 0, 10).await.unwrap();
    assert_eq!(history.total_elements, 0);
}

#[tokio::test]
async fn test_one_short_line_rejects_the_whole_checkout() {
    let shop = test_shop().await;
    let alice = user("alice");
    let plenty = seed_product(&shop, "Pen", 150, 50).await;
    let scarce = seed_product(&shop, "Ink", 900, 4).await;

    shop.cart().add_item(&alice, &plenty.id, 5).await.unwrap();
    let cart = shop.cart().add_item(&alice, &scarce.id, 4).await.unwrap();
    set_stock(&shop, &scarce.id, 1).await;

    let err = shop
        .checkout()
        .checkout(&alice, &line_ids(&cart))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ShopError::InsufficientStock { ref product_id, .. } if *product_id == scarce.id
    ));

    assert_eq!(stock_of(&shop, &plenty.id).await, 50);
    assert_eq!(stock_of(&shop, &scarce.id).await, 1);
    assert_eq!(shop.cart().get_cart(&alice).await.unwrap().items.len(), 2);
}

#[tokio::test]
async fn test_total_is_sum_of_snapshots() {
    let shop = test_shop().await;
    let alice = user("alice");
    let mug = seed_product(&shop, "Mug", 1299, 10).await;
    let tea = seed_product(&shop, "Tea", 450, 10).await;

    shop.cart().add_item(&alice, &mug.id, 3).await.unwrap();
    let cart = shop.cart().add_item(&alice, &tea.id, 2).await.unwrap();

    let order = shop.checkout().checkout(&alice, &line_ids(&cart)).await.unwrap();

    let sum: Money = order
        .items
        .iter()
        .map(|item| item.unit_price.multiply_quantity(item.quantity))
        .sum();
    assert_eq!(order.total, sum);
    assert_eq!(order.total, Money::from_cents(1299 * 3 + 450 * 2));
}

#[tokio::test]
async fn test_price_snapshot_survives_catalog_change() {
    let shop = test_shop().await;
    let alice = user("alice");
    let mug = seed_product(&shop, "Mug", 1000, 10).await;

    let cart = shop.cart().add_item(&alice, &mug.id, 1).await.unwrap();
    let order = shop.checkout().checkout(&alice, &line_ids(&cart)).await.unwrap();

    set_price(&shop, &mug.id, 5000).await;

    let stored = shop.orders().get_order(&alice, &order.id).await.unwrap();
    assert_eq!(stored.items[0].unit_price, Money::from_cents(1000));
    assert_eq!(stored.items[0].title, "Mug");
    assert_eq!(stored.total, Money::from_cents(1000));
}

#[tokio::test]
async fn test_unselected_lines_stay_in_cart() {
    let shop = test_shop().await;
    let alice = user("alice");
    let a = seed_product(&shop, "Apple", 100, 10).await;
    let b = seed_product(&shop, "Banana", 200, 10).await;

    shop.cart().add_item(&alice, &a.id, 1).await.unwrap();
    let cart = shop.cart().add_item(&alice, &b.id, 1).await.unwrap();
    let apple_line = cart
        .items
        .iter()
        .find(|line| line.product_id == a.id)
        .unwrap()
        .id
        .clone();

    let order = shop.checkout().checkout(&alice, &[apple_line]).await.unwrap();
    assert_eq!(order.items.len(), 1);

    let left = shop.cart().get_cart(&alice).await.unwrap();
    assert_eq!(left.items.len(), 1);
    assert_eq!(left.items[0].product_id, b.id);
    assert_eq!(stock_of(&shop, &b.id).await, 10);
}

#[tokio::test]
async fn test_foreign_and_unknown_ids_are_ignored() {
    let shop = test_shop().await;
    let alice = user("alice");
    let bob = user("bob");
    let lamp = seed_product(&shop, "Lamp", 1000, 10).await;

    let alice_cart = shop.cart().add_item(&alice, &lamp.id, 1).await.unwrap();
    let bob_cart = shop.cart().add_item(&bob, &lamp.id, 2).await.unwrap();

    let mut selection = line_ids(&alice_cart);
    selection.extend(line_ids(&bob_cart));
    selection.push("no-such-line".to_string());

    let order = shop.checkout().checkout(&alice, &selection).await.unwrap();
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 1);

    assert_eq!(stock_of(&shop, &lamp.id).await, 9);
    assert_eq!(shop.cart().get_cart(&bob).await.unwrap().items.len(), 1);
}

#[tokio::test]
async fn test_selection_with_only_foreign_ids_is_invalid() {
    let shop = test_shop().await;
    let alice = user("alice");
    let bob = user("bob");
    let lamp = seed_product(&shop, "Lamp", 1000, 10).await;

    shop.cart().add_item(&alice, &lamp.id, 1).await.unwrap();
    let bob_cart = shop.cart().add_item(&bob, &lamp.id, 1).await.unwrap();

    let err = shop
        .checkout()
        .checkout(&alice, &line_ids(&bob_cart))
        .await
        .unwrap_err();
    assert_eq!(err, ShopError::InvalidRequest("No valid items found for checkout".into()));
    assert_eq!(stock_of(&shop, &lamp.id).await, 10);
}

#[tokio::test]
async fn test_empty_selection_is_invalid() {
    let shop = test_shop().await;
    let alice = user("alice");
    let lamp = seed_product(&shop, "Lamp", 1000, 10).await;
    shop.cart().add_item(&alice, &lamp.id, 1).await.unwrap();

    let err = shop.checkout().checkout(&alice, &[]).await.unwrap_err();
    assert_eq!(err, ShopError::InvalidRequest("No items selected for checkout".into()));
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_checkout_without_cart_is_not_found() {
    let shop = test_shop().await;

    let err = shop
        .checkout()
        .checkout(&user("nobody"), &["line-1".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, ShopError::NotFound { ref entity, .. } if entity == "Cart"));
}

#[tokio::test]
async fn test_duplicate_ids_count_once() {
    let shop = test_shop().await;
    let alice = user("alice");
    let lamp = seed_product(&shop, "Lamp", 1000, 10).await;

    let cart = shop.cart().add_item(&alice, &lamp.id, 3).await.unwrap();
    let id = cart.items[0].id.clone();

    let order = shop
        .checkout()
        .checkout(&alice, &[id.clone(), id.clone(), id])
        .await
        .unwrap();

    assert_eq!(order.items.len(), 1);
    assert_eq!(order.total, Money::from_cents(3000));
    assert_eq!(stock_of(&shop, &lamp.id).await, 7);
}

#[tokio::test]
async fn test_second_checkout_of_same_lines_is_invalid() {
    let shop = test_shop().await;
    let alice = user("alice");
    let lamp = seed_product(&shop, "Lamp", 1000, 10).await;

    let cart = shop.cart().add_item(&alice, &lamp.id, 2).await.unwrap();
    let ids = line_ids(&cart);

    shop.checkout().checkout(&alice, &ids).await.unwrap();
    let err = shop.checkout().checkout(&alice, &ids).await.unwrap_err();

    assert!(matches!(err, ShopError::InvalidRequest(_)));
    assert_eq!(stock_of(&shop, &lamp.id).await, 8);
}

#[tokio::test]
async fn test_lock_contention_surfaces_as_transient() {
    let shop = common::test_shop_with(|config| {
        config.busy_timeout_ms = 50;
        config.checkout_max_attempts = 2;
        config.retry_backoff_ms = 0;
    })
    .await;
    let alice = user("alice");
    let lamp = seed_product(&shop, "Lamp", 1000, 10).await;
    let cart = shop.cart().add_item(&alice, &lamp.id, 1).await.unwrap();

    // Another writer holds the database lock for the whole attempt budget
    let mut held = shop.db().begin().await.unwrap();
    shop.db()
        .products()
        .lock_for_update(&mut held, &[lamp.id.clone()])
        .await
        .unwrap();

    let err = shop
        .checkout()
        .checkout(&alice, &line_ids(&cart))
        .await
        .unwrap_err();
    assert!(matches!(err, ShopError::Transient(_)), "got {err:?}");
    assert!(err.is_retriable());
    assert_eq!(err.status_code(), 503);

    held.rollback().await.unwrap();

    assert_eq!(stock_of(&shop, &lamp.id).await, 10);
    let order = shop.checkout().checkout(&alice, &line_ids(&cart)).await.unwrap();
    assert_eq!(order.total, Money::from_cents(1000));
}
