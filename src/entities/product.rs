use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Catalog row owning the authoritative stock counter.
///
/// `current_stock_qty` is only ever mutated through the stock ledger, under
/// a row lock, inside a sale/restock/return unit of work.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate, ToSchema)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(min = 1, max = 64, message = "SKU must be between 1 and 64 characters"))]
    pub sku: String,

    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,

    pub description: Option<String>,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub current_stock_qty: i32,
    pub low_stock_alert_level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
    #[sea_orm(has_many = "super::purchase_item::Entity")]
    PurchaseItem,
    #[sea_orm(has_many = "super::return_entity::Entity")]
    Return,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl Related<super::purchase_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseItem.def()
    }
}

impl Related<super::return_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Return.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the counter has fallen to (or below) its alert level.
    pub fn is_low_stock(&self) -> bool {
        self.current_stock_qty <= self.low_stock_alert_level
    }
}
