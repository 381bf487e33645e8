use std::sync::Arc;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use prometheus::IntCounter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::order::{self, Entity as OrderEntity, OrderStatus},
    entities::order_item::{self, Entity as OrderItemEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::activity_log::ActivityLogger,
    services::stock::StockLedger,
};

lazy_static! {
    static ref ORDER_CREATIONS: IntCounter =
        IntCounter::new("orders_created_total", "Total number of orders created")
            .expect("metric can be created");
    static ref ORDER_CREATION_FAILURES: IntCounter = IntCounter::new(
        "order_creation_failures_total",
        "Total number of failed order creations"
    )
    .expect("metric can be created");
}

/// A single cart line in a point-of-sale request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_id: Option<Uuid>,
    /// An empty cart is accepted and commits a zero-total order.
    #[validate]
    pub items: Vec<OrderLineRequest>,
    pub seller_custom_id: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub seller_custom_id: Option<String>,
    pub platform: Option<String>,
    pub order_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price_at_sale: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderDetailResponse {
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

struct SaleOutcome {
    order: order::Model,
    items: Vec<order_item::Model>,
    low_stock: Vec<(Uuid, i32, i32)>,
}

/// Point-of-sale transaction service.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    activity: Arc<ActivityLogger>,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, activity: Arc<ActivityLogger>) -> Self {
        Self {
            db,
            event_sender,
            activity,
        }
    }

    /// Converts a cart into a committed order.
    ///
    /// Runs as one unit of work: every line reserves stock at the ledger,
    /// snapshots the current sell price into `price_at_sale` and
    /// accumulates the total. Any line failure (unknown product,
    /// insufficient stock) rolls the whole transaction back.
    #[instrument(skip(self, request), fields(employee_id = %employee_id, lines = request.items.len()))]
    pub async fn create_order(
        &self,
        employee_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<OrderDetailResponse, ServiceError> {
        request.validate().map_err(|e| {
            ORDER_CREATION_FAILURES.inc();
            ServiceError::ValidationError(e.to_string())
        })?;

        let items = request.items.clone();
        let customer_id = request.customer_id;
        let seller_custom_id = request.seller_custom_id.clone();
        let platform = request.platform.clone();

        let outcome = self
            .db
            .transaction::<_, SaleOutcome, ServiceError>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let order_id = Uuid::new_v4();
                    let mut total_amount = Decimal::ZERO;
                    let mut item_models = Vec::with_capacity(items.len());
                    let mut low_stock = Vec::new();

                    for line in &items {
                        let product =
                            StockLedger::reserve(txn, line.product_id, line.quantity).await?;

                        total_amount += product.sell_price * Decimal::from(line.quantity);

                        if product.is_low_stock() {
                            low_stock.push((
                                product.id,
                                product.current_stock_qty,
                                product.low_stock_alert_level,
                            ));
                        }

                        item_models.push(order_item::Model {
                            id: Uuid::new_v4(),
                            order_id,
                            product_id: line.product_id,
                            quantity: line.quantity,
                            price_at_sale: product.sell_price,
                        });
                    }

                    let order = order::ActiveModel {
                        id: Set(order_id),
                        employee_id: Set(employee_id),
                        customer_id: Set(customer_id),
                        status: Set(OrderStatus::Completed),
                        total_amount: Set(total_amount),
                        seller_custom_id: Set(seller_custom_id),
                        platform: Set(platform),
                        order_date: Set(now),
                        created_at: Set(now),
                        updated_at: Set(Some(now)),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    for item in &item_models {
                        order_item::ActiveModel {
                            id: Set(item.id),
                            order_id: Set(item.order_id),
                            product_id: Set(item.product_id),
                            quantity: Set(item.quantity),
                            price_at_sale: Set(item.price_at_sale),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    }

                    Ok(SaleOutcome {
                        order,
                        items: item_models,
                        low_stock,
                    })
                })
            })
            .await
            .map_err(|e| {
                ORDER_CREATION_FAILURES.inc();
                match e {
                    TransactionError::Connection(db_err) => {
                        error!(error = %db_err, "sale transaction failed to run");
                        ServiceError::DatabaseError(db_err)
                    }
                    TransactionError::Transaction(service_err) => service_err,
                }
            })?;

        ORDER_CREATIONS.inc();
        info!(
            order_id = %outcome.order.id,
            total = %outcome.order.total_amount,
            "order committed"
        );

        self.activity
            .record(
                employee_id,
                "Created Order",
                format!(
                    "Order {} for {}",
                    outcome.order.id, outcome.order.total_amount
                ),
            )
            .await;

        self.event_sender
            .publish(Event::OrderCompleted {
                order_id: outcome.order.id,
                total_amount: outcome.order.total_amount,
            })
            .await;

        for (product_id, current_qty, alert_level) in &outcome.low_stock {
            self.event_sender
                .publish(Event::LowStock {
                    product_id: *product_id,
                    current_qty: *current_qty,
                    alert_level: *alert_level,
                })
                .await;
        }

        Ok(detail_response(outcome.order, outcome.items))
    }

    /// Retrieves an order with its line items.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderDetailResponse, ServiceError> {
        let db = &*self.db;

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {order_id} not found")))?;

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(detail_response(order, items))
    }

    /// Lists order headers, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let db = &*self.db;

        let paginator = OrderEntity::find()
            .order_by_desc(order::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let orders = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok(OrderListResponse {
            orders: orders.into_iter().map(header_response).collect(),
            total,
            page,
            per_page,
        })
    }
}

fn header_response(model: order::Model) -> OrderResponse {
    OrderResponse {
        id: model.id,
        employee_id: model.employee_id,
        customer_id: model.customer_id,
        status: model.status,
        total_amount: model.total_amount,
        seller_custom_id: model.seller_custom_id,
        platform: model.platform,
        order_date: model.order_date,
        created_at: model.created_at,
    }
}

fn detail_response(order: order::Model, items: Vec<order_item::Model>) -> OrderDetailResponse {
    OrderDetailResponse {
        order: header_response(order),
        items: items
            .into_iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id,
                quantity: item.quantity,
                line_total: item.line_total(),
                price_at_sale: item.price_at_sale,
            })
            .collect(),
    }
}
