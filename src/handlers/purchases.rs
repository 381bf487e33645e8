use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::auth::{AuthUser, Role};
use crate::errors::ServiceError;
use crate::services::purchases::{
    CreatePurchaseRequest, PurchaseDetailResponse, PurchaseListResponse,
};
use crate::{ApiResponse, AppState, ListQuery};

/// Record a restocking purchase
#[utoipa::path(
    post,
    path = "/api/v1/purchases",
    request_body = CreatePurchaseRequest,
    responses(
        (status = 201, description = "Purchase committed", body = ApiResponse<PurchaseDetailResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse),
    ),
    tag = "purchases"
)]
pub async fn create_purchase(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreatePurchaseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PurchaseDetailResponse>>), ServiceError> {
    auth_user.require_any(&[Role::Admin, Role::Employee])?;

    let created = state
        .services
        .purchases
        .create_purchase(auth_user.user_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// List purchases
#[utoipa::path(
    get,
    path = "/api/v1/purchases",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Purchases retrieved", body = ApiResponse<PurchaseListResponse>),
    ),
    tag = "purchases"
)]
pub async fn list_purchases(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PurchaseListResponse>>, ServiceError> {
    auth_user.require_any(&[Role::Admin, Role::Watcher, Role::Employee])?;

    let result = state
        .services
        .purchases
        .list_purchases(query.page, query.limit)
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// Get a single purchase with its invoice lines
#[utoipa::path(
    get,
    path = "/api/v1/purchases/{id}",
    params(("id" = Uuid, Path, description = "Purchase id")),
    responses(
        (status = 200, description = "Purchase retrieved", body = ApiResponse<PurchaseDetailResponse>),
        (status = 404, description = "Purchase not found", body = crate::errors::ErrorResponse),
    ),
    tag = "purchases"
)]
pub async fn get_purchase(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PurchaseDetailResponse>>, ServiceError> {
    auth_user.require_any(&[Role::Admin, Role::Watcher, Role::Employee])?;

    let purchase = state.services.purchases.get_purchase(id).await?;
    Ok(Json(ApiResponse::success(purchase)))
}
