use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::auth::{AuthUser, Role};
use crate::errors::ServiceError;
use crate::services::loss_analysis::{
    CreateReturnAnalysisRequest, ReturnAnalysisResponse, UpdateClaimStatusRequest,
};
use crate::{ApiResponse, AppState};

/// Record the loss reconciliation for an order's return
#[utoipa::path(
    post,
    path = "/api/v1/return-analyses",
    request_body = CreateReturnAnalysisRequest,
    responses(
        (status = 201, description = "Analysis recorded", body = ApiResponse<ReturnAnalysisResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "No return recorded for order", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already analyzed", body = crate::errors::ErrorResponse),
    ),
    tag = "return-analyses"
)]
pub async fn create_return_analysis(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateReturnAnalysisRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReturnAnalysisResponse>>), ServiceError> {
    auth_user.require_any(&[Role::Admin, Role::Employee])?;

    let created = state
        .services
        .loss_analysis
        .create_analysis(auth_user.user_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// List all return analyses
#[utoipa::path(
    get,
    path = "/api/v1/return-analyses",
    responses(
        (status = 200, description = "Analyses retrieved", body = ApiResponse<Vec<ReturnAnalysisResponse>>),
    ),
    tag = "return-analyses"
)]
pub async fn list_return_analyses(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<Vec<ReturnAnalysisResponse>>>, ServiceError> {
    auth_user.require_any(&[Role::Admin, Role::Watcher, Role::Employee])?;

    let analyses = state.services.loss_analysis.list_analyses().await?;
    Ok(Json(ApiResponse::success(analyses)))
}

/// List compensated analyses whose claim is still pending
#[utoipa::path(
    get,
    path = "/api/v1/return-analyses/pending-claims",
    responses(
        (status = 200, description = "Pending claims retrieved", body = ApiResponse<Vec<ReturnAnalysisResponse>>),
    ),
    tag = "return-analyses"
)]
pub async fn list_pending_claims(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<Vec<ReturnAnalysisResponse>>>, ServiceError> {
    auth_user.require_any(&[Role::Admin, Role::Watcher, Role::Employee])?;

    let claims = state.services.loss_analysis.list_pending_claims().await?;
    Ok(Json(ApiResponse::success(claims)))
}

/// Resolve a pending compensation claim
#[utoipa::path(
    put,
    path = "/api/v1/return-analyses/{id}/status",
    params(("id" = Uuid, Path, description = "Analysis id")),
    request_body = UpdateClaimStatusRequest,
    responses(
        (status = 200, description = "Claim resolved", body = ApiResponse<ReturnAnalysisResponse>),
        (status = 404, description = "Analysis not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Claim already resolved", body = crate::errors::ErrorResponse),
    ),
    tag = "return-analyses"
)]
pub async fn update_claim_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateClaimStatusRequest>,
) -> Result<Json<ApiResponse<ReturnAnalysisResponse>>, ServiceError> {
    auth_user.require_any(&[Role::Admin])?;

    let updated = state
        .services
        .loss_analysis
        .update_claim_status(auth_user.user_id, id, request)
        .await?;

    Ok(Json(ApiResponse::success(updated)))
}
