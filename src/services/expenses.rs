use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, ModelTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::misc_expense::{self, Entity as ExpenseEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::activity_log::ActivityLogger,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateExpenseRequest {
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpenseResponse {
    pub id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub added_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Miscellaneous expenses: simple append/list/delete facts that feed the
/// global cost totals in reporting.
#[derive(Clone)]
pub struct ExpenseService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    activity: Arc<ActivityLogger>,
}

impl ExpenseService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, activity: Arc<ActivityLogger>) -> Self {
        Self {
            db,
            event_sender,
            activity,
        }
    }

    #[instrument(skip(self, request), fields(employee_id = %employee_id))]
    pub async fn create_expense(
        &self,
        employee_id: Uuid,
        request: CreateExpenseRequest,
    ) -> Result<ExpenseResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "expense amount must be positive".to_string(),
            ));
        }

        let model = misc_expense::ActiveModel {
            id: Set(Uuid::new_v4()),
            description: Set(request.description),
            amount: Set(request.amount),
            date: Set(request.date),
            added_by: Set(Some(employee_id)),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .map_err(ServiceError::db_error)?;

        info!(expense_id = %model.id, amount = %model.amount, "expense recorded");

        self.activity
            .record(
                employee_id,
                "Added Expense",
                format!("Added expense: {} for {}", model.description, model.amount),
            )
            .await;

        self.event_sender
            .publish(Event::ExpenseRecorded {
                expense_id: model.id,
                amount: model.amount,
            })
            .await;

        Ok(to_response(model))
    }

    #[instrument(skip(self))]
    pub async fn list_expenses(&self) -> Result<Vec<ExpenseResponse>, ServiceError> {
        let expenses = ExpenseEntity::find()
            .order_by_desc(misc_expense::Column::Date)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(expenses.into_iter().map(to_response).collect())
    }

    #[instrument(skip(self), fields(expense_id = %expense_id))]
    pub async fn delete_expense(
        &self,
        employee_id: Uuid,
        expense_id: Uuid,
    ) -> Result<(), ServiceError> {
        let expense = ExpenseEntity::find_by_id(expense_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Expense {expense_id} not found")))?;

        let description = expense.description.clone();
        expense
            .delete(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        self.activity
            .record(
                employee_id,
                "Deleted Expense",
                format!("Deleted expense: {description}"),
            )
            .await;

        Ok(())
    }
}

fn to_response(model: misc_expense::Model) -> ExpenseResponse {
    ExpenseResponse {
        id: model.id,
        description: model.description,
        amount: model.amount,
        date: model.date,
        added_by: model.added_by,
        created_at: model.created_at,
    }
}
