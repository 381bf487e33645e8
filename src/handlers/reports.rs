use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::auth::{AuthUser, Role};
use crate::errors::ServiceError;
use crate::services::reports::{ChannelFilter, FilterOptions, SalesStats, SoldItem};
use crate::{ApiResponse, AppState};

const REPORT_ROLES: &[Role] = &[Role::Admin, Role::ReportViewer, Role::Watcher];

#[derive(Debug, Deserialize)]
pub struct SoldItemsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Dashboard totals, optionally filtered by sales channel
#[utoipa::path(
    get,
    path = "/api/v1/reports/stats",
    params(
        ("seller_id" = Option<String>, Query, description = "Filter sales-side figures by seller channel code"),
        ("platform" = Option<String>, Query, description = "Filter sales-side figures by platform tag"),
    ),
    responses(
        (status = 200, description = "Stats computed", body = ApiResponse<SalesStats>),
    ),
    tag = "reports"
)]
pub async fn stats(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filter): Query<ChannelFilter>,
) -> Result<Json<ApiResponse<SalesStats>>, ServiceError> {
    auth_user.require_any(REPORT_ROLES)?;

    let stats = state.services.reports.stats(filter).await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// Per-product sales figures over a date window
#[utoipa::path(
    get,
    path = "/api/v1/reports/sold-items",
    params(
        ("start_date" = Option<NaiveDate>, Query, description = "Window start (inclusive)"),
        ("end_date" = Option<NaiveDate>, Query, description = "Window end (inclusive)"),
    ),
    responses(
        (status = 200, description = "Sold items computed", body = ApiResponse<Vec<SoldItem>>),
    ),
    tag = "reports"
)]
pub async fn sold_items(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<SoldItemsQuery>,
) -> Result<Json<ApiResponse<Vec<SoldItem>>>, ServiceError> {
    auth_user.require_any(REPORT_ROLES)?;

    let items = state
        .services
        .reports
        .sold_items(query.start_date, query.end_date)
        .await?;
    Ok(Json(ApiResponse::success(items)))
}

/// Channel values available for report filters
#[utoipa::path(
    get,
    path = "/api/v1/reports/filters",
    responses(
        (status = 200, description = "Filter options retrieved", body = ApiResponse<FilterOptions>),
    ),
    tag = "reports"
)]
pub async fn filter_options(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<FilterOptions>>, ServiceError> {
    auth_user.require_any(REPORT_ROLES)?;

    let options = state.services.reports.filter_options().await?;
    Ok(Json(ApiResponse::success(options)))
}
