//! In-process domain events.
//!
//! Transactions publish an event after their unit of work commits; the
//! processor consumes them on a detached task. Delivery is best-effort:
//! a full or closed channel is logged and ignored, it never fails the
//! operation that produced the event.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::ClaimStatus;

/// Events emitted by the transaction engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCompleted {
        order_id: Uuid,
        total_amount: Decimal,
    },
    PurchaseReceived {
        purchase_id: Uuid,
        total_cost: Decimal,
    },
    ReturnRecorded {
        return_id: Uuid,
        restocked: bool,
    },
    ClaimResolved {
        analysis_id: Uuid,
        status: ClaimStatus,
    },
    LowStock {
        product_id: Uuid,
        current_qty: i32,
        alert_level: i32,
    },
    ExpenseRecorded {
        expense_id: Uuid,
        amount: Decimal,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {e}"))
    }

    /// Best-effort publish used on post-commit paths.
    pub async fn publish(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "dropping domain event");
        }
    }
}

/// Consumes events until every sender is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderCompleted {
                order_id,
                total_amount,
            } => {
                info!(order_id = %order_id, total = %total_amount, "order completed");
            }
            Event::PurchaseReceived {
                purchase_id,
                total_cost,
            } => {
                info!(purchase_id = %purchase_id, total = %total_cost, "purchase received");
            }
            Event::ReturnRecorded {
                return_id,
                restocked,
            } => {
                info!(return_id = %return_id, restocked, "return recorded");
            }
            Event::ClaimResolved {
                analysis_id,
                status,
            } => {
                info!(analysis_id = %analysis_id, status = ?status, "claim resolved");
            }
            Event::LowStock {
                product_id,
                current_qty,
                alert_level,
            } => {
                warn!(
                    product_id = %product_id,
                    current_qty,
                    alert_level,
                    "product at or below low-stock alert level"
                );
            }
            Event::ExpenseRecorded { expense_id, amount } => {
                info!(expense_id = %expense_id, amount = %amount, "expense recorded");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn publish_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        // Must not panic or error out.
        EventSender::new(tx)
            .publish(Event::OrderCompleted {
                order_id: Uuid::new_v4(),
                total_amount: dec!(10.00),
            })
            .await;
    }
}
