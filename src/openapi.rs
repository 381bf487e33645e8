use utoipa::OpenApi;

use crate::entities::{product, ClaimStatus, OrderStatus, ProductCondition, ReturnDisposition};
use crate::errors::ErrorResponse;
use crate::services::{
    expenses::{CreateExpenseRequest, ExpenseResponse},
    loss_analysis::{
        CreateReturnAnalysisRequest, NetPosition, ReturnAnalysisResponse, UpdateClaimStatusRequest,
    },
    orders::{
        CreateOrderRequest, OrderDetailResponse, OrderItemResponse, OrderLineRequest,
        OrderListResponse, OrderResponse,
    },
    purchases::{
        CreatePurchaseRequest, PurchaseDetailResponse, PurchaseItemResponse, PurchaseLineRequest,
        PurchaseListResponse, PurchaseResponse,
    },
    reports::{ChannelFilter, FilterOptions, SalesStats, SoldItem, TopProduct},
    returns::{CreateReturnRequest, ReturnListResponse, ReturnResponse},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Back-Office API",
        description = "Retail back-office transaction engine: point of sale, restocking, returns and return-loss reconciliation",
    ),
    paths(
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::purchases::create_purchase,
        crate::handlers::purchases::list_purchases,
        crate::handlers::purchases::get_purchase,
        crate::handlers::returns::create_return,
        crate::handlers::returns::list_returns,
        crate::handlers::returns::get_return,
        crate::handlers::return_analyses::create_return_analysis,
        crate::handlers::return_analyses::list_return_analyses,
        crate::handlers::return_analyses::list_pending_claims,
        crate::handlers::return_analyses::update_claim_status,
        crate::handlers::products::list_products,
        crate::handlers::products::list_low_stock_products,
        crate::handlers::expenses::create_expense,
        crate::handlers::expenses::list_expenses,
        crate::handlers::expenses::delete_expense,
        crate::handlers::reports::stats,
        crate::handlers::reports::sold_items,
        crate::handlers::reports::filter_options,
    ),
    components(schemas(
        ErrorResponse,
        OrderStatus,
        ReturnDisposition,
        ProductCondition,
        ClaimStatus,
        NetPosition,
        product::Model,
        CreateOrderRequest,
        OrderLineRequest,
        OrderResponse,
        OrderItemResponse,
        OrderDetailResponse,
        OrderListResponse,
        CreatePurchaseRequest,
        PurchaseLineRequest,
        PurchaseResponse,
        PurchaseItemResponse,
        PurchaseDetailResponse,
        PurchaseListResponse,
        CreateReturnRequest,
        ReturnResponse,
        ReturnListResponse,
        CreateReturnAnalysisRequest,
        UpdateClaimStatusRequest,
        ReturnAnalysisResponse,
        CreateExpenseRequest,
        ExpenseResponse,
        ChannelFilter,
        SalesStats,
        TopProduct,
        SoldItem,
        FilterOptions,
    )),
    tags(
        (name = "orders", description = "Point-of-sale transactions"),
        (name = "purchases", description = "Restocking transactions"),
        (name = "returns", description = "Return transactions"),
        (name = "return-analyses", description = "Return-loss reconciliation and claims"),
        (name = "products", description = "Read-only catalog projections"),
        (name = "expenses", description = "Miscellaneous expenses"),
        (name = "reports", description = "Read-only aggregates"),
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// The resolved OpenAPI document.
    pub fn openapi_spec() -> utoipa::openapi::OpenApi {
        <Self as OpenApi>::openapi()
    }
}
