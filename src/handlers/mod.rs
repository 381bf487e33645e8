pub mod expenses;
pub mod orders;
pub mod products;
pub mod purchases;
pub mod return_analyses;
pub mod returns;
pub mod reports;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    activity_log::ActivityLogger, expenses::ExpenseService, loss_analysis::LossAnalysisService,
    orders::OrderService, purchases::PurchaseService, reports::ReportService,
    returns::ReturnService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub purchases: Arc<PurchaseService>,
    pub returns: Arc<ReturnService>,
    pub loss_analysis: Arc<LossAnalysisService>,
    pub expenses: Arc<ExpenseService>,
    pub reports: Arc<ReportService>,
    pub activity: Arc<ActivityLogger>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let activity = Arc::new(ActivityLogger::new(db.clone()));

        Self {
            orders: Arc::new(OrderService::new(
                db.clone(),
                event_sender.clone(),
                activity.clone(),
            )),
            purchases: Arc::new(PurchaseService::new(
                db.clone(),
                event_sender.clone(),
                activity.clone(),
            )),
            returns: Arc::new(ReturnService::new(
                db.clone(),
                event_sender.clone(),
                activity.clone(),
            )),
            loss_analysis: Arc::new(LossAnalysisService::new(
                db.clone(),
                event_sender.clone(),
                activity.clone(),
            )),
            expenses: Arc::new(ExpenseService::new(
                db.clone(),
                event_sender,
                activity.clone(),
            )),
            reports: Arc::new(ReportService::new(db)),
            activity,
        }
    }
}
