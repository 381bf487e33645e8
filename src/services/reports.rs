use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::{
    db::DbPool,
    entities::misc_expense,
    entities::order::{self, OrderStatus},
    entities::order_item,
    entities::product,
    entities::purchase,
    errors::ServiceError,
};

/// Channel filter applied to sales-side aggregates.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ChannelFilter {
    pub seller_id: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TopProduct {
    pub name: String,
    pub total_sold: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SalesStats {
    /// Completed-order revenue under the channel filter.
    pub sales: Decimal,
    /// Margin over buy price for the same orders.
    pub profit: Decimal,
    /// Restocking spend. Purchases carry no channel columns, so this stays
    /// global even when a filter is applied.
    pub purchases: Decimal,
    /// Miscellaneous expenses; global for the same reason.
    pub misc_expenses: Decimal,
    pub top_products: Vec<TopProduct>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SoldItem {
    pub sku: String,
    pub product_name: String,
    pub units_sold: i64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FilterOptions {
    pub sellers: Vec<String>,
    pub platforms: Vec<String>,
}

#[derive(Debug, FromQueryResult)]
struct SumRow {
    total: Option<Decimal>,
}

#[derive(Debug, FromQueryResult)]
struct TopProductRow {
    name: String,
    total_sold: Option<i64>,
}

#[derive(Debug, FromQueryResult)]
struct SoldItemRow {
    sku: String,
    name: String,
    units_sold: Option<i64>,
    revenue: Option<Decimal>,
}

/// Read-only projections over committed orders, purchases and expenses.
///
/// Never writes; all figures come from state the transaction services have
/// already committed.
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Dashboard totals. Sales-side figures honor the channel filter;
    /// purchase and expense totals are global only.
    #[instrument(skip(self))]
    pub async fn stats(&self, filter: ChannelFilter) -> Result<SalesStats, ServiceError> {
        let db = &*self.db;

        // Total sales over completed orders.
        let mut sales_query = order::Entity::find()
            .select_only()
            .column_as(
                SimpleExpr::from(Func::sum(Expr::col((
                    order::Entity,
                    order::Column::TotalAmount,
                )))),
                "total",
            )
            .filter(order::Column::Status.eq(OrderStatus::Completed));
        sales_query = apply_channel_filter(sales_query, &filter);

        let sales = sales_query
            .into_model::<SumRow>()
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .and_then(|r| r.total)
            .unwrap_or(Decimal::ZERO);

        // Profit: (price_at_sale - buy_price) * quantity over the same orders.
        let margin_expr = Expr::col((order_item::Entity, order_item::Column::PriceAtSale))
            .sub(Expr::col((product::Entity, product::Column::BuyPrice)));
        let profit_expr = SimpleExpr::from(Func::sum(margin_expr.mul(Expr::col((
            order_item::Entity,
            order_item::Column::Quantity,
        )))));

        let mut profit_query = order_item::Entity::find()
            .select_only()
            .column_as(profit_expr, "total")
            .join(JoinType::InnerJoin, order_item::Relation::Product.def())
            .join(JoinType::InnerJoin, order_item::Relation::Order.def())
            .filter(order::Column::Status.eq(OrderStatus::Completed));
        profit_query = apply_channel_filter(profit_query, &filter);

        let profit = profit_query
            .into_model::<SumRow>()
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .and_then(|r| r.total)
            .unwrap_or(Decimal::ZERO);

        // Purchases and miscellaneous expenses carry no channel metadata.
        let purchases = purchase::Entity::find()
            .select_only()
            .column_as(
                SimpleExpr::from(Func::sum(Expr::col((
                    purchase::Entity,
                    purchase::Column::TotalCost,
                )))),
                "total",
            )
            .into_model::<SumRow>()
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .and_then(|r| r.total)
            .unwrap_or(Decimal::ZERO);

        let misc_expenses = misc_expense::Entity::find()
            .select_only()
            .column_as(
                SimpleExpr::from(Func::sum(Expr::col((
                    misc_expense::Entity,
                    misc_expense::Column::Amount,
                )))),
                "total",
            )
            .into_model::<SumRow>()
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .and_then(|r| r.total)
            .unwrap_or(Decimal::ZERO);

        // Top five products by units sold under the filter.
        let units_expr = SimpleExpr::from(Func::sum(Expr::col((
            order_item::Entity,
            order_item::Column::Quantity,
        ))));

        let mut top_query = order_item::Entity::find()
            .select_only()
            .column_as(product::Column::Name, "name")
            .column_as(units_expr.clone(), "total_sold")
            .join(JoinType::InnerJoin, order_item::Relation::Product.def())
            .join(JoinType::InnerJoin, order_item::Relation::Order.def())
            .filter(order::Column::Status.eq(OrderStatus::Completed));
        top_query = apply_channel_filter(top_query, &filter);

        let top_products = top_query
            .group_by(product::Column::Name)
            .order_by_desc(units_expr)
            .limit(5)
            .into_model::<TopProductRow>()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|row| TopProduct {
                name: row.name,
                total_sold: row.total_sold.unwrap_or(0),
            })
            .collect();

        Ok(SalesStats {
            sales,
            profit,
            purchases,
            misc_expenses,
            top_products,
        })
    }

    /// Per-product units and revenue over completed orders in the window.
    #[instrument(skip(self))]
    pub async fn sold_items(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<SoldItem>, ServiceError> {
        let db = &*self.db;

        let units_expr = SimpleExpr::from(Func::sum(Expr::col((
            order_item::Entity,
            order_item::Column::Quantity,
        ))));
        let revenue_expr = SimpleExpr::from(Func::sum(
            Expr::col((order_item::Entity, order_item::Column::Quantity)).mul(Expr::col((
                order_item::Entity,
                order_item::Column::PriceAtSale,
            ))),
        ));

        let mut query = order_item::Entity::find()
            .select_only()
            .column_as(product::Column::Sku, "sku")
            .column_as(product::Column::Name, "name")
            .column_as(units_expr, "units_sold")
            .column_as(revenue_expr.clone(), "revenue")
            .join(JoinType::InnerJoin, order_item::Relation::Product.def())
            .join(JoinType::InnerJoin, order_item::Relation::Order.def())
            .filter(order::Column::Status.eq(OrderStatus::Completed));

        if let Some(from) = from {
            let start = from.and_time(NaiveTime::MIN).and_utc();
            query = query.filter(order::Column::OrderDate.gte(start));
        }
        if let Some(to) = to {
            // Inclusive end date: anything before the following midnight.
            if let Some(next) = to.succ_opt() {
                let end = next.and_time(NaiveTime::MIN).and_utc();
                query = query.filter(order::Column::OrderDate.lt(end));
            }
        }

        let rows = query
            .group_by(product::Column::Sku)
            .group_by(product::Column::Name)
            .order_by_desc(revenue_expr)
            .into_model::<SoldItemRow>()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(rows
            .into_iter()
            .map(|row| SoldItem {
                sku: row.sku,
                product_name: row.name,
                units_sold: row.units_sold.unwrap_or(0),
                total_revenue: row.revenue.unwrap_or(Decimal::ZERO),
            })
            .collect())
    }

    /// Distinct channel values observed on orders, for report filter
    /// dropdowns. Seller/supplier CRUD lives outside this service, so the
    /// lookup is derived from committed orders.
    #[instrument(skip(self))]
    pub async fn filter_options(&self) -> Result<FilterOptions, ServiceError> {
        let db = &*self.db;

        let sellers: Vec<String> = order::Entity::find()
            .select_only()
            .column(order::Column::SellerCustomId)
            .filter(order::Column::SellerCustomId.is_not_null())
            .distinct()
            .into_tuple()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let platforms: Vec<String> = order::Entity::find()
            .select_only()
            .column(order::Column::Platform)
            .filter(order::Column::Platform.is_not_null())
            .distinct()
            .into_tuple()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(FilterOptions { sellers, platforms })
    }
}

fn apply_channel_filter<E: EntityTrait>(
    mut query: sea_orm::Select<E>,
    filter: &ChannelFilter,
) -> sea_orm::Select<E> {
    if let Some(seller_id) = &filter.seller_id {
        query = query.filter(order::Column::SellerCustomId.eq(seller_id.as_str()));
    }
    if let Some(platform) = &filter.platform {
        query = query.filter(order::Column::Platform.eq(platform.as_str()));
    }
    query
}
