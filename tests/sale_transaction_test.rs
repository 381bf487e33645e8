mod common;

use assert_matches::assert_matches;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use uuid::Uuid;

use backoffice_api::entities::{order, order_item, OrderStatus};
use backoffice_api::errors::ServiceError;
use backoffice_api::services::orders::{CreateOrderRequest, OrderLineRequest};

fn cart(lines: Vec<(Uuid, i32)>) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_id: None,
        items: lines
            .into_iter()
            .map(|(product_id, quantity)| OrderLineRequest {
                product_id,
                quantity,
            })
            .collect(),
        seller_custom_id: Some("SEL-1".into()),
        platform: Some("web".into()),
    }
}

#[tokio::test]
async fn sale_decrements_stock_and_totals_line_items() {
    let ctx = common::setup().await;
    let p1 = common::seed_product(&ctx.db, "SKU-1", dec!(5.00), dec!(10.00), 8).await;
    let p2 = common::seed_product(&ctx.db, "SKU-2", dec!(7.00), dec!(14.00), 3).await;

    let detail = ctx
        .services
        .orders
        .create_order(ctx.actor, cart(vec![(p1.id, 2), (p2.id, 1)]))
        .await
        .expect("sale commits");

    assert_eq!(detail.order.status, OrderStatus::Completed);
    assert_eq!(detail.order.total_amount, dec!(34.00));
    assert_eq!(detail.items.len(), 2);

    assert_eq!(common::stock_of(&ctx.db, p1.id).await, 6);
    assert_eq!(common::stock_of(&ctx.db, p2.id).await, 2);

    // total equals the sum of quantity * price_at_sale
    let summed: Decimal = detail.items.iter().map(|i| i.line_total).sum();
    assert_eq!(summed, detail.order.total_amount);
}

#[tokio::test]
async fn price_at_sale_is_frozen_against_catalog_edits() {
    let ctx = common::setup().await;
    let p1 = common::seed_product(&ctx.db, "SKU-1", dec!(5.00), dec!(10.00), 8).await;

    let detail = ctx
        .services
        .orders
        .create_order(ctx.actor, cart(vec![(p1.id, 2)]))
        .await
        .expect("sale commits");

    common::set_sell_price(&ctx.db, p1.id, dec!(99.00)).await;

    let refetched = ctx
        .services
        .orders
        .get_order(detail.order.id)
        .await
        .expect("order exists");

    assert_eq!(refetched.items[0].price_at_sale, dec!(10.00));
    assert_eq!(refetched.order.total_amount, dec!(20.00));
}

#[tokio::test]
async fn oversold_line_fails_and_leaves_stock_untouched() {
    let ctx = common::setup().await;
    let p1 = common::seed_product(&ctx.db, "SKU-1", dec!(5.00), dec!(10.00), 4).await;

    let err = ctx
        .services
        .orders
        .create_order(ctx.actor, cart(vec![(p1.id, 5)]))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InsufficientStock(_));
    assert_eq!(common::stock_of(&ctx.db, p1.id).await, 4);
}

#[tokio::test]
async fn failing_line_rolls_back_earlier_lines() {
    let ctx = common::setup().await;
    let p1 = common::seed_product(&ctx.db, "SKU-1", dec!(5.00), dec!(10.00), 8).await;
    let p2 = common::seed_product(&ctx.db, "SKU-2", dec!(7.00), dec!(14.00), 1).await;

    let err = ctx
        .services
        .orders
        .create_order(ctx.actor, cart(vec![(p1.id, 2), (p2.id, 2)]))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InsufficientStock(_));

    // The p1 decrement from the first line must not survive the rollback,
    // and no order or line rows may be observable.
    assert_eq!(common::stock_of(&ctx.db, p1.id).await, 8);
    assert_eq!(common::stock_of(&ctx.db, p2.id).await, 1);

    let orders = order::Entity::find().all(&*ctx.db).await.unwrap();
    assert!(orders.is_empty());
    let items = order_item::Entity::find().all(&*ctx.db).await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn unknown_product_fails_with_not_found() {
    let ctx = common::setup().await;

    let err = ctx
        .services
        .orders
        .create_order(ctx.actor, cart(vec![(Uuid::new_v4(), 1)]))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn empty_cart_commits_a_zero_total_order() {
    let ctx = common::setup().await;

    let detail = ctx
        .services
        .orders
        .create_order(ctx.actor, cart(vec![]))
        .await
        .expect("empty cart is accepted");

    assert_eq!(detail.order.total_amount, Decimal::ZERO);
    assert!(detail.items.is_empty());
}
