use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::auth::{AuthUser, Role};
use crate::errors::ServiceError;
use crate::services::returns::{CreateReturnRequest, ReturnListResponse, ReturnResponse};
use crate::{ApiResponse, AppState, ListQuery};

/// Record a return
#[utoipa::path(
    post,
    path = "/api/v1/returns",
    request_body = CreateReturnRequest,
    responses(
        (status = 201, description = "Return recorded", body = ApiResponse<ReturnResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order or product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "returns"
)]
pub async fn create_return(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateReturnRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReturnResponse>>), ServiceError> {
    auth_user.require_any(&[Role::Admin, Role::Employee])?;

    let created = state
        .services
        .returns
        .create_return(auth_user.user_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// List returns
#[utoipa::path(
    get,
    path = "/api/v1/returns",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Returns retrieved", body = ApiResponse<ReturnListResponse>),
    ),
    tag = "returns"
)]
pub async fn list_returns(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<ReturnListResponse>>, ServiceError> {
    auth_user.require_any(&[Role::Admin, Role::Watcher, Role::Employee])?;

    let result = state
        .services
        .returns
        .list_returns(query.page, query.limit)
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// Get a single return
#[utoipa::path(
    get,
    path = "/api/v1/returns/{id}",
    params(("id" = Uuid, Path, description = "Return id")),
    responses(
        (status = 200, description = "Return retrieved", body = ApiResponse<ReturnResponse>),
        (status = 404, description = "Return not found", body = crate::errors::ErrorResponse),
    ),
    tag = "returns"
)]
pub async fn get_return(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReturnResponse>>, ServiceError> {
    auth_user.require_any(&[Role::Admin, Role::Watcher, Role::Employee])?;

    let record = state.services.returns.get_return(id).await?;
    Ok(Json(ApiResponse::success(record)))
}
