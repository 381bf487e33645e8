use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Recorded return event: an immutable financial fact.
///
/// Whether the returned quantity goes back into sellable stock is decided
/// by the restock policy on `(disposition, condition)` at creation time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "returns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub reason: Option<String>,
    pub disposition: ReturnDisposition,
    pub condition: ProductCondition,
    pub refund_amount: Option<Decimal>,
    pub seller_id: Option<String>,
    pub platform: Option<String>,
    pub return_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// How the return was resolved commercially.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ReturnDisposition {
    #[sea_orm(string_value = "refund")]
    Refund,
    #[sea_orm(string_value = "replaced")]
    Replaced,
}

/// Physical/delivery state of the returned item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ProductCondition {
    #[sea_orm(string_value = "good")]
    Good,
    #[sea_orm(string_value = "damaged")]
    Damaged,
    /// Customer received the wrong item or nothing at all.
    #[sea_orm(string_value = "not_delivered")]
    NotDelivered,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Restock policy: only a refunded item that came back in good
    /// condition is resellable. A damaged or never-delivered unit is not,
    /// and a replacement consumes new stock elsewhere.
    pub fn restocks_inventory(&self) -> bool {
        restock_policy(self.disposition, self.condition)
    }
}

/// The single place the restock rule lives.
pub fn restock_policy(disposition: ReturnDisposition, condition: ProductCondition) -> bool {
    matches!(
        (disposition, condition),
        (ReturnDisposition::Refund, ProductCondition::Good)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(ReturnDisposition::Refund, ProductCondition::Good => true; "good refund restocks")]
    #[test_case(ReturnDisposition::Refund, ProductCondition::Damaged => false; "damaged refund does not")]
    #[test_case(ReturnDisposition::Refund, ProductCondition::NotDelivered => false; "undelivered refund does not")]
    #[test_case(ReturnDisposition::Replaced, ProductCondition::Good => false; "good replacement does not")]
    #[test_case(ReturnDisposition::Replaced, ProductCondition::Damaged => false; "damaged replacement does not")]
    #[test_case(ReturnDisposition::Replaced, ProductCondition::NotDelivered => false; "undelivered replacement does not")]
    fn restock_policy_matrix(disposition: ReturnDisposition, condition: ProductCondition) -> bool {
        restock_policy(disposition, condition)
    }
}
