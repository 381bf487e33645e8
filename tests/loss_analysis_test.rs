mod common;

use assert_matches::assert_matches;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use backoffice_api::entities::{ClaimStatus, ProductCondition, ReturnDisposition};
use backoffice_api::errors::ServiceError;
use backoffice_api::services::loss_analysis::{CreateReturnAnalysisRequest, NetPosition, UpdateClaimStatusRequest};
use backoffice_api::services::orders::{CreateOrderRequest, OrderLineRequest};
use backoffice_api::services::returns::CreateReturnRequest;

/// Seeds product -> sale -> return, yielding the order id the analysis
/// hangs off.
async fn seed_return(
    ctx: &common::TestCtx,
    disposition: ReturnDisposition,
    condition: ProductCondition,
) -> Uuid {
    let product = common::seed_product(&ctx.db, "SKU-L", dec!(20.00), dec!(50.00), 10).await;

    let order = ctx
        .services
        .orders
        .create_order(
            ctx.actor,
            CreateOrderRequest {
                customer_id: None,
                items: vec![OrderLineRequest {
                    product_id: product.id,
                    quantity: 1,
                }],
                seller_custom_id: Some("SEL-9".into()),
                platform: Some("marketplace".into()),
            },
        )
        .await
        .expect("sale commits")
        .order;

    ctx.services
        .returns
        .create_return(
            ctx.actor,
            CreateReturnRequest {
                order_id: order.id,
                product_id: product.id,
                quantity: 1,
                reason: None,
                disposition,
                condition,
                refund_amount: None,
                seller_id: Some("SEL-9".into()),
                platform: Some("marketplace".into()),
            },
        )
        .await
        .expect("return commits");

    order.id
}

fn analysis_request(order_id: Uuid) -> CreateReturnAnalysisRequest {
    CreateReturnAnalysisRequest {
        order_id,
        packaging_loss: Some(dec!(5.00)),
        shipping_loss: Some(dec!(10.00)),
        product_loss: Some(dec!(50.00)),
        replacement_shipping_loss: Some(dec!(8.00)),
        is_compensated: false,
        compensation_amount: None,
        claim_status: None,
    }
}

#[tokio::test]
async fn damaged_replacement_sums_all_four_components() {
    let ctx = common::setup().await;
    let order_id = seed_return(&ctx, ReturnDisposition::Replaced, ProductCondition::Damaged).await;

    let mut request = analysis_request(order_id);
    request.is_compensated = true;
    request.compensation_amount = Some(dec!(20.00));

    let analysis = ctx
        .services
        .loss_analysis
        .create_analysis(ctx.actor, request)
        .await
        .expect("analysis commits");

    assert_eq!(analysis.total_loss, dec!(73.00));
    assert_eq!(analysis.net_loss, dec!(53.00));
    assert_eq!(analysis.net_position, NetPosition::Loss(dec!(53.00)));
    assert_eq!(analysis.claim_status, ClaimStatus::Pending);
    // Channel metadata is joined in from the return.
    assert_eq!(analysis.seller_id.as_deref(), Some("SEL-9"));
    assert_eq!(analysis.platform.as_deref(), Some("marketplace"));
}

#[tokio::test]
async fn good_return_only_loses_handling_costs() {
    let ctx = common::setup().await;
    let order_id = seed_return(&ctx, ReturnDisposition::Refund, ProductCondition::Good).await;

    let analysis = ctx
        .services
        .loss_analysis
        .create_analysis(ctx.actor, analysis_request(order_id))
        .await
        .expect("analysis commits");

    // Product and replacement-shipping inputs are not part of this
    // scenario and must not be stored or counted.
    assert_eq!(analysis.total_loss, dec!(15.00));
    assert_eq!(analysis.product_loss, Decimal::ZERO);
    assert_eq!(analysis.replacement_shipping_loss, Decimal::ZERO);
}

#[tokio::test]
async fn undelivered_product_loss_defaults_to_the_sale_price_snapshot() {
    let ctx = common::setup().await;
    let order_id =
        seed_return(&ctx, ReturnDisposition::Refund, ProductCondition::NotDelivered).await;

    let mut request = analysis_request(order_id);
    request.product_loss = None;
    request.replacement_shipping_loss = None;

    let analysis = ctx
        .services
        .loss_analysis
        .create_analysis(ctx.actor, request)
        .await
        .expect("analysis commits");

    // price_at_sale of the order line is 50.00
    assert_eq!(analysis.product_loss, dec!(50.00));
    assert_eq!(analysis.total_loss, dec!(65.00));
}

#[tokio::test]
async fn operator_entered_product_loss_wins_over_the_default() {
    let ctx = common::setup().await;
    let order_id =
        seed_return(&ctx, ReturnDisposition::Refund, ProductCondition::NotDelivered).await;

    let mut request = analysis_request(order_id);
    request.product_loss = Some(dec!(42.00));

    let analysis = ctx
        .services
        .loss_analysis
        .create_analysis(ctx.actor, request)
        .await
        .expect("analysis commits");

    assert_eq!(analysis.product_loss, dec!(42.00));
}

#[tokio::test]
async fn rejecting_a_claim_zeroes_compensation_and_restores_the_loss() {
    let ctx = common::setup().await;
    let order_id = seed_return(&ctx, ReturnDisposition::Replaced, ProductCondition::Damaged).await;

    let mut request = analysis_request(order_id);
    request.is_compensated = true;
    request.compensation_amount = Some(dec!(30.00));

    let analysis = ctx
        .services
        .loss_analysis
        .create_analysis(ctx.actor, request)
        .await
        .expect("analysis commits");
    assert_eq!(analysis.net_loss, dec!(43.00));

    let updated = ctx
        .services
        .loss_analysis
        .update_claim_status(
            ctx.actor,
            analysis.id,
            UpdateClaimStatusRequest {
                claim_status: ClaimStatus::Rejected,
            },
        )
        .await
        .expect("rejection applies");

    assert_eq!(updated.claim_status, ClaimStatus::Rejected);
    assert_eq!(updated.compensation_amount, Decimal::ZERO);
    assert_eq!(updated.net_loss, dec!(73.00));
}

#[tokio::test]
async fn resolved_claims_are_terminal() {
    let ctx = common::setup().await;
    let order_id = seed_return(&ctx, ReturnDisposition::Replaced, ProductCondition::Damaged).await;

    let mut request = analysis_request(order_id);
    request.is_compensated = true;
    request.compensation_amount = Some(dec!(20.00));

    let analysis = ctx
        .services
        .loss_analysis
        .create_analysis(ctx.actor, request)
        .await
        .expect("analysis commits");

    let approved = ctx
        .services
        .loss_analysis
        .update_claim_status(
            ctx.actor,
            analysis.id,
            UpdateClaimStatusRequest {
                claim_status: ClaimStatus::Approved,
            },
        )
        .await
        .expect("approval applies");
    assert_eq!(approved.compensation_amount, dec!(20.00));
    assert_eq!(approved.net_loss, dec!(53.00));

    let err = ctx
        .services
        .loss_analysis
        .update_claim_status(
            ctx.actor,
            analysis.id,
            UpdateClaimStatusRequest {
                claim_status: ClaimStatus::Rejected,
            },
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn over_compensation_surfaces_as_a_recovery() {
    let ctx = common::setup().await;
    let order_id = seed_return(&ctx, ReturnDisposition::Replaced, ProductCondition::Damaged).await;

    let mut request = analysis_request(order_id);
    request.is_compensated = true;
    request.compensation_amount = Some(dec!(100.00));

    let analysis = ctx
        .services
        .loss_analysis
        .create_analysis(ctx.actor, request)
        .await
        .expect("analysis commits");

    assert_eq!(analysis.net_loss, dec!(-27.00));
    assert_eq!(analysis.net_position, NetPosition::Recovered(dec!(27.00)));
}

#[tokio::test]
async fn one_analysis_per_order() {
    let ctx = common::setup().await;
    let order_id = seed_return(&ctx, ReturnDisposition::Refund, ProductCondition::Good).await;

    ctx.services
        .loss_analysis
        .create_analysis(ctx.actor, analysis_request(order_id))
        .await
        .expect("first analysis commits");

    let err = ctx
        .services
        .loss_analysis
        .create_analysis(ctx.actor, analysis_request(order_id))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn analysis_requires_a_recorded_return() {
    let ctx = common::setup().await;

    let err = ctx
        .services
        .loss_analysis
        .create_analysis(ctx.actor, analysis_request(Uuid::new_v4()))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn compensation_on_a_resalable_return_is_rejected() {
    let ctx = common::setup().await;
    let order_id = seed_return(&ctx, ReturnDisposition::Refund, ProductCondition::Good).await;

    let mut request = analysis_request(order_id);
    request.is_compensated = true;
    request.compensation_amount = Some(dec!(5.00));

    let err = ctx
        .services
        .loss_analysis
        .create_analysis(ctx.actor, request)
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
async fn claim_verdict_at_creation_is_only_honored_for_undelivered_returns() {
    let ctx = common::setup().await;
    let order_id = seed_return(&ctx, ReturnDisposition::Refund, ProductCondition::Damaged).await;

    let mut request = analysis_request(order_id);
    request.is_compensated = true;
    request.compensation_amount = Some(dec!(10.00));
    request.claim_status = Some(ClaimStatus::Approved);

    let err = ctx
        .services
        .loss_analysis
        .create_analysis(ctx.actor, request)
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
async fn pending_claims_listing_only_shows_compensated_pending_records() {
    let ctx = common::setup().await;
    let order_id = seed_return(&ctx, ReturnDisposition::Replaced, ProductCondition::Damaged).await;

    let mut request = analysis_request(order_id);
    request.is_compensated = true;
    request.compensation_amount = Some(dec!(20.00));

    let analysis = ctx
        .services
        .loss_analysis
        .create_analysis(ctx.actor, request)
        .await
        .expect("analysis commits");

    let pending = ctx.services.loss_analysis.list_pending_claims().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, analysis.id);

    ctx.services
        .loss_analysis
        .update_claim_status(
            ctx.actor,
            analysis.id,
            UpdateClaimStatusRequest {
                claim_status: ClaimStatus::Approved,
            },
        )
        .await
        .expect("approval applies");

    let pending = ctx.services.loss_analysis.list_pending_claims().await.unwrap();
    assert!(pending.is_empty());
}
