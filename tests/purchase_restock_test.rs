mod common;

use assert_matches::assert_matches;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use uuid::Uuid;

use backoffice_api::entities::purchase;
use backoffice_api::errors::ServiceError;
use backoffice_api::services::purchases::{CreatePurchaseRequest, PurchaseLineRequest};

fn invoice(lines: Vec<(Uuid, i32, Decimal)>) -> CreatePurchaseRequest {
    CreatePurchaseRequest {
        supplier_id: None,
        invoice_number: "INV-100".into(),
        items: lines
            .into_iter()
            .map(|(product_id, quantity, unit_cost)| PurchaseLineRequest {
                product_id,
                quantity,
                unit_cost,
            })
            .collect(),
    }
}

#[tokio::test]
async fn restock_increments_stock_and_totals_cost() {
    let ctx = common::setup().await;
    let p1 = common::seed_product(&ctx.db, "SKU-1", dec!(10.00), dec!(20.00), 0).await;
    let p2 = common::seed_product(&ctx.db, "SKU-2", dec!(7.00), dec!(14.00), 3).await;

    let detail = ctx
        .services
        .purchases
        .create_purchase(
            ctx.actor,
            invoice(vec![(p1.id, 5, dec!(10.00)), (p2.id, 2, dec!(7.00))]),
        )
        .await
        .expect("purchase commits");

    assert_eq!(detail.purchase.total_cost, dec!(64.00));
    assert_eq!(common::stock_of(&ctx.db, p1.id).await, 5);
    assert_eq!(common::stock_of(&ctx.db, p2.id).await, 5);

    let summed: Decimal = detail.items.iter().map(|i| i.line_cost).sum();
    assert_eq!(summed, detail.purchase.total_cost);
}

#[tokio::test]
async fn unknown_product_rolls_back_the_whole_invoice() {
    let ctx = common::setup().await;
    let p1 = common::seed_product(&ctx.db, "SKU-1", dec!(10.00), dec!(20.00), 0).await;

    let err = ctx
        .services
        .purchases
        .create_purchase(
            ctx.actor,
            invoice(vec![(p1.id, 5, dec!(10.00)), (Uuid::new_v4(), 1, dec!(1.00))]),
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::NotFound(_));

    // The first line's increment must not survive.
    assert_eq!(common::stock_of(&ctx.db, p1.id).await, 0);
    let purchases = purchase::Entity::find().all(&*ctx.db).await.unwrap();
    assert!(purchases.is_empty());
}

#[tokio::test]
async fn blank_invoice_number_is_rejected() {
    let ctx = common::setup().await;

    let mut request = invoice(vec![]);
    request.invoice_number = "".into();

    let err = ctx
        .services
        .purchases
        .create_purchase(ctx.actor, request)
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::ValidationError(_));
}
