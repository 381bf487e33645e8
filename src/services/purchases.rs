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
    entities::purchase::{self, Entity as PurchaseEntity},
    entities::purchase_item::{self, Entity as PurchaseItemEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::activity_log::ActivityLogger,
    services::stock::StockLedger,
};

lazy_static! {
    static ref PURCHASE_CREATIONS: IntCounter = IntCounter::new(
        "purchases_created_total",
        "Total number of purchases recorded"
    )
    .expect("metric can be created");
    static ref PURCHASE_CREATION_FAILURES: IntCounter = IntCounter::new(
        "purchase_creation_failures_total",
        "Total number of failed purchase recordings"
    )
    .expect("metric can be created");
}

/// One invoice line of a restocking delivery.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PurchaseLineRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    pub unit_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseRequest {
    pub supplier_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Invoice number is required"))]
    pub invoice_number: String,
    #[validate]
    pub items: Vec<PurchaseLineRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseResponse {
    pub id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub invoice_number: String,
    pub total_cost: Decimal,
    pub purchase_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseItemResponse {
    pub product_id: Uuid,
    pub quantity: i32,
    pub cost_price: Decimal,
    pub line_cost: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseDetailResponse {
    pub purchase: PurchaseResponse,
    pub items: Vec<PurchaseItemResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseListResponse {
    pub purchases: Vec<PurchaseResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Restocking transaction service; the buy-side mirror of `OrderService`.
#[derive(Clone)]
pub struct PurchaseService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    activity: Arc<ActivityLogger>,
}

impl PurchaseService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, activity: Arc<ActivityLogger>) -> Self {
        Self {
            db,
            event_sender,
            activity,
        }
    }

    /// Converts a supplier invoice into incremented stock and a committed
    /// purchase, atomically. There is no sufficiency check on the way in;
    /// incrementing cannot violate the non-negative stock invariant.
    #[instrument(skip(self, request), fields(employee_id = %employee_id, invoice = %request.invoice_number))]
    pub async fn create_purchase(
        &self,
        employee_id: Uuid,
        request: CreatePurchaseRequest,
    ) -> Result<PurchaseDetailResponse, ServiceError> {
        request.validate().map_err(|e| {
            PURCHASE_CREATION_FAILURES.inc();
            ServiceError::ValidationError(e.to_string())
        })?;

        let items = request.items.clone();
        let supplier_id = request.supplier_id;
        let invoice_number = request.invoice_number.clone();

        let (purchase, item_models) = self
            .db
            .transaction::<_, (purchase::Model, Vec<purchase_item::Model>), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let now = Utc::now();
                        let purchase_id = Uuid::new_v4();
                        let mut total_cost = Decimal::ZERO;
                        let mut item_models = Vec::with_capacity(items.len());

                        for line in &items {
                            StockLedger::restore(txn, line.product_id, line.quantity).await?;

                            total_cost += line.unit_cost * Decimal::from(line.quantity);

                            item_models.push(purchase_item::Model {
                                id: Uuid::new_v4(),
                                purchase_id,
                                product_id: line.product_id,
                                quantity: line.quantity,
                                cost_price: line.unit_cost,
                            });
                        }

                        let purchase = purchase::ActiveModel {
                            id: Set(purchase_id),
                            supplier_id: Set(supplier_id),
                            invoice_number: Set(invoice_number),
                            total_cost: Set(total_cost),
                            purchase_date: Set(now),
                            created_at: Set(now),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                        for item in &item_models {
                            purchase_item::ActiveModel {
                                id: Set(item.id),
                                purchase_id: Set(item.purchase_id),
                                product_id: Set(item.product_id),
                                quantity: Set(item.quantity),
                                cost_price: Set(item.cost_price),
                            }
                            .insert(txn)
                            .await
                            .map_err(ServiceError::db_error)?;
                        }

                        Ok((purchase, item_models))
                    })
                },
            )
            .await
            .map_err(|e| {
                PURCHASE_CREATION_FAILURES.inc();
                match e {
                    TransactionError::Connection(db_err) => {
                        error!(error = %db_err, "restock transaction failed to run");
                        ServiceError::DatabaseError(db_err)
                    }
                    TransactionError::Transaction(service_err) => service_err,
                }
            })?;

        PURCHASE_CREATIONS.inc();
        info!(
            purchase_id = %purchase.id,
            total_cost = %purchase.total_cost,
            "purchase committed"
        );

        self.activity
            .record(
                employee_id,
                "Created Purchase",
                format!(
                    "Purchase {} (Inv: {}) for {}",
                    purchase.id, purchase.invoice_number, purchase.total_cost
                ),
            )
            .await;

        self.event_sender
            .publish(Event::PurchaseReceived {
                purchase_id: purchase.id,
                total_cost: purchase.total_cost,
            })
            .await;

        Ok(detail_response(purchase, item_models))
    }

    /// Retrieves a purchase with its invoice lines.
    #[instrument(skip(self), fields(purchase_id = %purchase_id))]
    pub async fn get_purchase(
        &self,
        purchase_id: Uuid,
    ) -> Result<PurchaseDetailResponse, ServiceError> {
        let db = &*self.db;

        let purchase = PurchaseEntity::find_by_id(purchase_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase {purchase_id} not found")))?;

        let items = PurchaseItemEntity::find()
            .filter(purchase_item::Column::PurchaseId.eq(purchase_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(detail_response(purchase, items))
    }

    /// Lists purchase headers, newest first.
    #[instrument(skip(self))]
    pub async fn list_purchases(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<PurchaseListResponse, ServiceError> {
        let db = &*self.db;

        let paginator = PurchaseEntity::find()
            .order_by_desc(purchase::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let purchases = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok(PurchaseListResponse {
            purchases: purchases.into_iter().map(header_response).collect(),
            total,
            page,
            per_page,
        })
    }
}

fn header_response(model: purchase::Model) -> PurchaseResponse {
    PurchaseResponse {
        id: model.id,
        supplier_id: model.supplier_id,
        invoice_number: model.invoice_number,
        total_cost: model.total_cost,
        purchase_date: model.purchase_date,
    }
}

fn detail_response(
    purchase: purchase::Model,
    items: Vec<purchase_item::Model>,
) -> PurchaseDetailResponse {
    PurchaseDetailResponse {
        purchase: header_response(purchase),
        items: items
            .into_iter()
            .map(|item| PurchaseItemResponse {
                product_id: item.product_id,
                quantity: item.quantity,
                line_cost: item.line_cost(),
                cost_price: item.cost_price,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn blank_invoice_numbers_fail_validation() {
        let request = CreatePurchaseRequest {
            supplier_id: None,
            invoice_number: "".into(),
            items: vec![],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn line_cost_multiplies_quantity_by_unit_cost() {
        let item = purchase_item::Model {
            id: Uuid::new_v4(),
            purchase_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity: 5,
            cost_price: dec!(10.00),
        };
        assert_eq!(item.line_cost(), dec!(50.00));
    }
}
