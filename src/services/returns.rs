use std::sync::Arc;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use prometheus::IntCounter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, Set, TransactionError,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::order::Entity as OrderEntity,
    entities::product::Entity as ProductEntity,
    entities::return_entity::{self, Entity as ReturnEntity, ProductCondition, ReturnDisposition},
    errors::ServiceError,
    events::{Event, EventSender},
    services::activity_log::ActivityLogger,
    services::stock::StockLedger,
};

lazy_static! {
    static ref RETURN_CREATIONS: IntCounter =
        IntCounter::new("returns_created_total", "Total number of returns recorded")
            .expect("metric can be created");
    static ref RETURN_CREATION_FAILURES: IntCounter = IntCounter::new(
        "return_creation_failures_total",
        "Total number of failed return recordings"
    )
    .expect("metric can be created");
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateReturnRequest {
    pub order_id: Uuid,
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    pub reason: Option<String>,
    pub disposition: ReturnDisposition,
    pub condition: ProductCondition,
    pub refund_amount: Option<Decimal>,
    pub seller_id: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReturnResponse {
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
    /// Whether this return put its quantity back into sellable stock.
    pub restocked: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReturnListResponse {
    pub returns: Vec<ReturnResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Return transaction service.
#[derive(Clone)]
pub struct ReturnService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    activity: Arc<ActivityLogger>,
}

impl ReturnService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, activity: Arc<ActivityLogger>) -> Self {
        Self {
            db,
            event_sender,
            activity,
        }
    }

    /// Records a return and conditionally reverses the sale's stock effect.
    ///
    /// The return row is persisted for every accepted request; the stock
    /// ledger is touched only when the restock policy says the unit is
    /// resellable (refund of an item that came back in good condition).
    /// The quantity is deliberately not checked against the original order
    /// line; the source system accepts over-returns and that behavior is
    /// preserved.
    #[instrument(skip(self, request), fields(order_id = %request.order_id, product_id = %request.product_id))]
    pub async fn create_return(
        &self,
        employee_id: Uuid,
        request: CreateReturnRequest,
    ) -> Result<ReturnResponse, ServiceError> {
        request.validate().map_err(|e| {
            RETURN_CREATION_FAILURES.inc();
            ServiceError::ValidationError(e.to_string())
        })?;

        let req = request.clone();

        let (record, restocked) = self
            .db
            .transaction::<_, (return_entity::Model, bool), ServiceError>(move |txn| {
                Box::pin(async move {
                    OrderEntity::find_by_id(req.order_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Order {} not found", req.order_id))
                        })?;

                    let restock = return_entity::restock_policy(req.disposition, req.condition);

                    if restock {
                        StockLedger::restore(txn, req.product_id, req.quantity).await?;
                    } else {
                        // Still a hard reference: the product must exist even
                        // when no stock moves.
                        ProductEntity::find_by_id(req.product_id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "Product {} not found",
                                    req.product_id
                                ))
                            })?;
                    }

                    let now = Utc::now();
                    let record = return_entity::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        order_id: Set(req.order_id),
                        product_id: Set(req.product_id),
                        quantity: Set(req.quantity),
                        reason: Set(req.reason),
                        disposition: Set(req.disposition),
                        condition: Set(req.condition),
                        refund_amount: Set(req.refund_amount),
                        seller_id: Set(req.seller_id),
                        platform: Set(req.platform),
                        return_date: Set(now),
                        created_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    Ok((record, restock))
                })
            })
            .await
            .map_err(|e| {
                RETURN_CREATION_FAILURES.inc();
                match e {
                    TransactionError::Connection(db_err) => {
                        error!(error = %db_err, "return transaction failed to run");
                        ServiceError::DatabaseError(db_err)
                    }
                    TransactionError::Transaction(service_err) => service_err,
                }
            })?;

        RETURN_CREATIONS.inc();
        info!(return_id = %record.id, restocked, "return committed");

        self.activity
            .record(
                employee_id,
                "Recorded Return",
                format!(
                    "Return {} on order {} ({:?}/{:?})",
                    record.id, record.order_id, record.disposition, record.condition
                ),
            )
            .await;

        self.event_sender
            .publish(Event::ReturnRecorded {
                return_id: record.id,
                restocked,
            })
            .await;

        Ok(to_response(record, restocked))
    }

    /// Retrieves a single return.
    #[instrument(skip(self), fields(return_id = %return_id))]
    pub async fn get_return(&self, return_id: Uuid) -> Result<ReturnResponse, ServiceError> {
        let record = ReturnEntity::find_by_id(return_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Return {return_id} not found")))?;

        let restocked = record.restocks_inventory();
        Ok(to_response(record, restocked))
    }

    /// Lists returns, newest first.
    #[instrument(skip(self))]
    pub async fn list_returns(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<ReturnListResponse, ServiceError> {
        let paginator = ReturnEntity::find()
            .order_by_desc(return_entity::Column::ReturnDate)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let returns = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok(ReturnListResponse {
            returns: returns
                .into_iter()
                .map(|r| {
                    let restocked = r.restocks_inventory();
                    to_response(r, restocked)
                })
                .collect(),
            total,
            page,
            per_page,
        })
    }
}

fn to_response(model: return_entity::Model, restocked: bool) -> ReturnResponse {
    ReturnResponse {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        reason: model.reason,
        disposition: model.disposition,
        condition: model.condition,
        refund_amount: model.refund_amount,
        seller_id: model.seller_id,
        platform: model.platform,
        return_date: model.return_date,
        restocked,
    }
}
