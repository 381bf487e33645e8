mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use uuid::Uuid;

use backoffice_api::entities::return_entity;
use backoffice_api::entities::{ProductCondition, ReturnDisposition};
use backoffice_api::errors::ServiceError;
use backoffice_api::services::orders::{CreateOrderRequest, OrderLineRequest};
use backoffice_api::services::returns::CreateReturnRequest;

/// Seeds a product with the given stock and a completed order selling
/// `sold_qty` of it; returns (product_id, order_id) with the product's
/// post-sale stock at `stock - sold_qty`.
async fn seed_sale(ctx: &common::TestCtx, stock: i32, sold_qty: i32) -> (Uuid, Uuid) {
    let product = common::seed_product(&ctx.db, "SKU-R", dec!(5.00), dec!(10.00), stock).await;

    let detail = ctx
        .services
        .orders
        .create_order(
            ctx.actor,
            CreateOrderRequest {
                customer_id: None,
                items: vec![OrderLineRequest {
                    product_id: product.id,
                    quantity: sold_qty,
                }],
                seller_custom_id: Some("SEL-1".into()),
                platform: Some("web".into()),
            },
        )
        .await
        .expect("sale commits");

    (product.id, detail.order.id)
}

fn return_request(
    order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    disposition: ReturnDisposition,
    condition: ProductCondition,
) -> CreateReturnRequest {
    CreateReturnRequest {
        order_id,
        product_id,
        quantity,
        reason: Some("customer request".into()),
        disposition,
        condition,
        refund_amount: None,
        seller_id: Some("SEL-1".into()),
        platform: Some("web".into()),
    }
}

#[tokio::test]
async fn good_refund_restocks_the_quantity() {
    let ctx = common::setup().await;
    let (product_id, order_id) = seed_sale(&ctx, 13, 3).await;
    assert_eq!(common::stock_of(&ctx.db, product_id).await, 10);

    let response = ctx
        .services
        .returns
        .create_return(
            ctx.actor,
            return_request(
                order_id,
                product_id,
                3,
                ReturnDisposition::Refund,
                ProductCondition::Good,
            ),
        )
        .await
        .expect("return commits");

    assert!(response.restocked);
    assert_eq!(common::stock_of(&ctx.db, product_id).await, 13);
}

#[tokio::test]
async fn non_resellable_combinations_leave_stock_untouched() {
    let ctx = common::setup().await;
    let (product_id, order_id) = seed_sale(&ctx, 13, 3).await;
    assert_eq!(common::stock_of(&ctx.db, product_id).await, 10);

    let combinations = [
        (ReturnDisposition::Refund, ProductCondition::Damaged),
        (ReturnDisposition::Refund, ProductCondition::NotDelivered),
        (ReturnDisposition::Replaced, ProductCondition::Good),
        (ReturnDisposition::Replaced, ProductCondition::Damaged),
        (ReturnDisposition::Replaced, ProductCondition::NotDelivered),
    ];

    for (disposition, condition) in combinations {
        let response = ctx
            .services
            .returns
            .create_return(
                ctx.actor,
                return_request(order_id, product_id, 3, disposition, condition),
            )
            .await
            .expect("return commits");

        assert!(!response.restocked, "{disposition:?}/{condition:?}");
        assert_eq!(common::stock_of(&ctx.db, product_id).await, 10);
    }
}

#[tokio::test]
async fn unknown_order_fails_and_persists_nothing() {
    let ctx = common::setup().await;
    let product = common::seed_product(&ctx.db, "SKU-R", dec!(5.00), dec!(10.00), 10).await;

    let err = ctx
        .services
        .returns
        .create_return(
            ctx.actor,
            return_request(
                Uuid::new_v4(),
                product.id,
                1,
                ReturnDisposition::Refund,
                ProductCondition::Good,
            ),
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::NotFound(_));
    assert_eq!(common::stock_of(&ctx.db, product.id).await, 10);

    let returns = return_entity::Entity::find().all(&*ctx.db).await.unwrap();
    assert!(returns.is_empty());
}

#[tokio::test]
async fn unknown_product_fails_and_persists_nothing() {
    let ctx = common::setup().await;
    let (_, order_id) = seed_sale(&ctx, 10, 2).await;

    let err = ctx
        .services
        .returns
        .create_return(
            ctx.actor,
            return_request(
                order_id,
                Uuid::new_v4(),
                1,
                ReturnDisposition::Replaced,
                ProductCondition::Damaged,
            ),
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::NotFound(_));
    let returns = return_entity::Entity::find().all(&*ctx.db).await.unwrap();
    assert!(returns.is_empty());
}

#[tokio::test]
async fn returned_quantity_is_not_capped_by_the_sold_quantity() {
    // The source system never validated a return against the remaining
    // returnable quantity; that gap is preserved deliberately.
    let ctx = common::setup().await;
    let (product_id, order_id) = seed_sale(&ctx, 10, 2).await;

    let response = ctx
        .services
        .returns
        .create_return(
            ctx.actor,
            return_request(
                order_id,
                product_id,
                5,
                ReturnDisposition::Refund,
                ProductCondition::Good,
            ),
        )
        .await
        .expect("over-return is accepted");

    assert!(response.restocked);
    assert_eq!(common::stock_of(&ctx.db, product_id).await, 13);
}
