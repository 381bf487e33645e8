use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use tracing::warn;
use uuid::Uuid;

use crate::{db::DbPool, entities::activity_log};

/// Fire-and-forget audit sink.
///
/// Core operations call `record` after their unit of work commits; an
/// insert failure is logged on the tracing channel and otherwise ignored,
/// so a broken audit table can never fail a sale.
#[derive(Clone)]
pub struct ActivityLogger {
    db: Arc<DbPool>,
}

impl ActivityLogger {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn record(&self, user_id: Uuid, action: &str, description: String) {
        let entry = activity_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            action_type: Set(action.to_string()),
            description: Set(description),
            created_at: Set(Utc::now()),
        };

        if let Err(e) = entry.insert(&*self.db).await {
            warn!(error = %e, action, "failed to write activity log entry");
        }
    }
}
