mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;

use backoffice_api::errors::ServiceError;
use backoffice_api::services::orders::{CreateOrderRequest, OrderLineRequest};
use uuid::Uuid;

fn last_unit_cart(product_id: Uuid) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_id: None,
        items: vec![OrderLineRequest {
            product_id,
            quantity: 1,
        }],
        seller_custom_id: None,
        platform: None,
    }
}

#[tokio::test]
async fn back_to_back_sales_of_the_last_unit() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx.db, "SKU-C", dec!(5.00), dec!(10.00), 1).await;

    ctx.services
        .orders
        .create_order(ctx.actor, last_unit_cart(product.id))
        .await
        .expect("first sale wins the unit");

    let err = ctx
        .services
        .orders
        .create_order(ctx.actor, last_unit_cart(product.id))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InsufficientStock(_));
    assert_eq!(common::stock_of(&ctx.db, product.id).await, 0);
}

#[tokio::test]
async fn simultaneous_sales_of_the_last_unit_serialize() {
    // On SQLite the single-connection pool serializes the two units of
    // work; on Postgres the row lock taken by the ledger does. Either
    // way the check-then-decrement sequence must not interleave.
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx.db, "SKU-C", dec!(5.00), dec!(10.00), 1).await;

    let first = {
        let svc = ctx.services.orders.clone();
        let actor = ctx.actor;
        let cart = last_unit_cart(product.id);
        tokio::spawn(async move { svc.create_order(actor, cart).await })
    };
    let second = {
        let svc = ctx.services.orders.clone();
        let actor = ctx.actor;
        let cart = last_unit_cart(product.id);
        tokio::spawn(async move { svc.create_order(actor, cart).await })
    };

    let results = [
        first.await.expect("task completes"),
        second.await.expect("task completes"),
    ];

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one sale may win the last unit");

    let losing_error = results
        .into_iter()
        .find_map(Result::err)
        .expect("one sale must lose");
    assert_matches!(losing_error, ServiceError::InsufficientStock(_));

    assert_eq!(common::stock_of(&ctx.db, product.id).await, 0);
}

#[tokio::test]
async fn interleaved_sales_and_restocks_never_drive_stock_negative() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx.db, "SKU-C", dec!(5.00), dec!(10.00), 2).await;

    // Alternate oversized sales (which must fail) with small restocks and
    // valid sales; after every step the committed counter stays >= 0.
    for round in 0..6 {
        let sale = ctx
            .services
            .orders
            .create_order(
                ctx.actor,
                CreateOrderRequest {
                    customer_id: None,
                    items: vec![OrderLineRequest {
                        product_id: product.id,
                        quantity: if round % 2 == 0 { 1 } else { 100 },
                    }],
                    seller_custom_id: None,
                    platform: None,
                },
            )
            .await;

        if round % 2 == 1 {
            assert_matches!(sale.unwrap_err(), ServiceError::InsufficientStock(_));
        } else {
            sale.expect("in-stock sale commits");
        }

        let stock = common::stock_of(&ctx.db, product.id).await;
        assert!(stock >= 0, "stock went negative: {stock}");

        ctx.services
            .purchases
            .create_purchase(
                ctx.actor,
                backoffice_api::services::purchases::CreatePurchaseRequest {
                    supplier_id: None,
                    invoice_number: format!("INV-{round}"),
                    items: vec![backoffice_api::services::purchases::PurchaseLineRequest {
                        product_id: product.id,
                        quantity: 1,
                        unit_cost: dec!(5.00),
                    }],
                },
            )
            .await
            .expect("restock commits");
    }

    assert!(common::stock_of(&ctx.db, product.id).await >= 0);
}
