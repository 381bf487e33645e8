use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::auth::{AuthUser, Role};
use crate::errors::ServiceError;
use crate::services::orders::{CreateOrderRequest, OrderDetailResponse, OrderListResponse};
use crate::{ApiResponse, AppState, ListQuery};

/// Create an order (point of sale)
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order committed", body = ApiResponse<OrderDetailResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderDetailResponse>>), ServiceError> {
    auth_user.require_any(&[Role::Admin, Role::Employee])?;

    let created = state
        .services
        .orders
        .create_order(auth_user.user_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// List orders
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<OrderListResponse>),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<OrderListResponse>>, ServiceError> {
    auth_user.require_any(&[Role::Admin, Role::Watcher, Role::Employee])?;

    let result = state
        .services
        .orders
        .list_orders(query.page, query.limit)
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// Get a single order with its items
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order retrieved", body = ApiResponse<OrderDetailResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderDetailResponse>>, ServiceError> {
    auth_user.require_any(&[Role::Admin, Role::Watcher, Role::Employee])?;

    let order = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}
