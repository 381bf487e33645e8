use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::auth::{AuthUser, Role};
use crate::errors::ServiceError;
use crate::services::expenses::{CreateExpenseRequest, ExpenseResponse};
use crate::{ApiResponse, AppState};

/// Record a miscellaneous expense
#[utoipa::path(
    post,
    path = "/api/v1/expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense recorded", body = ApiResponse<ExpenseResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
    ),
    tag = "expenses"
)]
pub async fn create_expense(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ExpenseResponse>>), ServiceError> {
    auth_user.require_any(&[Role::Admin, Role::Employee])?;

    let created = state
        .services
        .expenses
        .create_expense(auth_user.user_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// List miscellaneous expenses
#[utoipa::path(
    get,
    path = "/api/v1/expenses",
    responses(
        (status = 200, description = "Expenses retrieved", body = ApiResponse<Vec<ExpenseResponse>>),
    ),
    tag = "expenses"
)]
pub async fn list_expenses(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<Vec<ExpenseResponse>>>, ServiceError> {
    auth_user.require_any(&[Role::Admin, Role::Watcher, Role::Employee])?;

    let expenses = state.services.expenses.list_expenses().await?;
    Ok(Json(ApiResponse::success(expenses)))
}

/// Delete a miscellaneous expense
#[utoipa::path(
    delete,
    path = "/api/v1/expenses/{id}",
    params(("id" = Uuid, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Expense deleted", body = ApiResponse<String>),
        (status = 404, description = "Expense not found", body = crate::errors::ErrorResponse),
    ),
    tag = "expenses"
)]
pub async fn delete_expense(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<String>>, ServiceError> {
    auth_user.require_any(&[Role::Admin])?;

    state
        .services
        .expenses
        .delete_expense(auth_user.user_id, id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Expense deleted successfully".to_string(),
    )))
}
