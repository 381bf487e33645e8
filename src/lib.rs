//! Retail back-office engine.
//!
//! The core is the inventory-consistent transaction engine (sales,
//! restocking, returns) plus the return-loss reconciliation engine; the
//! HTTP layer in [`handlers`] is a thin role-gated surface over it.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use std::sync::Arc;

use axum::{extract::State, response::Json, routing::get, routing::post, routing::put, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use utoipa_swagger_ui::SwaggerUi;

use handlers::AppServices;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: AppServices,
}

/// Common query parameters for list endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

/// Uniform success envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    // A ping that fails shows up as "degraded" rather than a 500; the
    // process itself is still alive.
    let db_ok = state.db.ping().await.is_ok();
    Json(json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "database": db_ok,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Builds the full application router.
pub fn app_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/orders",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route("/orders/:id", get(handlers::orders::get_order))
        .route(
            "/purchases",
            post(handlers::purchases::create_purchase).get(handlers::purchases::list_purchases),
        )
        .route("/purchases/:id", get(handlers::purchases::get_purchase))
        .route(
            "/returns",
            post(handlers::returns::create_return).get(handlers::returns::list_returns),
        )
        .route("/returns/:id", get(handlers::returns::get_return))
        .route(
            "/return-analyses",
            post(handlers::return_analyses::create_return_analysis)
                .get(handlers::return_analyses::list_return_analyses),
        )
        .route(
            "/return-analyses/pending-claims",
            get(handlers::return_analyses::list_pending_claims),
        )
        .route(
            "/return-analyses/:id/status",
            put(handlers::return_analyses::update_claim_status),
        )
        .route("/products", get(handlers::products::list_products))
        .route(
            "/products/low-stock",
            get(handlers::products::list_low_stock_products),
        )
        .route(
            "/expenses",
            post(handlers::expenses::create_expense).get(handlers::expenses::list_expenses),
        )
        .route("/expenses/:id", axum::routing::delete(handlers::expenses::delete_expense))
        .route("/reports/stats", get(handlers::reports::stats))
        .route("/reports/sold-items", get(handlers::reports::sold_items))
        .route("/reports/filters", get(handlers::reports::filter_options));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .merge(
            SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi_spec()),
        )
        .with_state(state)
}
