use axum::{
    extract::{Query, State},
    response::Json,
};

use crate::auth::AuthUser;
use crate::entities::product;
use crate::errors::ServiceError;
use crate::services::stock;
use crate::{ApiResponse, AppState, ListQuery, PaginatedResponse};

/// List catalog products with their current stock
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Products retrieved", body = ApiResponse<PaginatedResponse<product::Model>>),
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<product::Model>>>, ServiceError> {
    let (items, total) = stock::list_products(&*state.db, query.page, query.limit).await?;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page: query.page,
        limit: query.limit,
    })))
}

/// List products at or below their low-stock alert level
#[utoipa::path(
    get,
    path = "/api/v1/products/low-stock",
    responses(
        (status = 200, description = "Low-stock products retrieved", body = ApiResponse<Vec<product::Model>>),
    ),
    tag = "products"
)]
pub async fn list_low_stock_products(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<ApiResponse<Vec<product::Model>>>, ServiceError> {
    let products = stock::low_stock_products(&*state.db).await?;
    Ok(Json(ApiResponse::success(products)))
}
