use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Financial reconciliation of a return, one per order.
///
/// Append-only except for the claim lifecycle: `claim_status`,
/// `compensation_amount` and `net_loss` may change once, when the claim
/// leaves `Pending`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "return_analyses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub order_id: Uuid,
    pub packaging_loss: Decimal,
    pub shipping_loss: Decimal,
    pub product_loss: Decimal,
    pub replacement_shipping_loss: Decimal,
    pub is_compensated: bool,
    pub compensation_amount: Decimal,
    pub total_loss: Decimal,
    pub net_loss: Decimal,
    pub claim_status: ClaimStatus,
    pub analysis_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Platform-compensation claim lifecycle. `Approved` and `Rejected` are
/// terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
