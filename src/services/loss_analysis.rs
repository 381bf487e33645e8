use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionError,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::order_item,
    entities::return_analysis::{self, ClaimStatus, Entity as ReturnAnalysisEntity},
    entities::return_entity::{self, Entity as ReturnEntity, ProductCondition, ReturnDisposition},
    errors::ServiceError,
    events::{Event, EventSender},
    services::activity_log::ActivityLogger,
};

/// Operator-entered cost figures, before scenario classification.
#[derive(Debug, Clone, Copy, Default)]
pub struct LossInputs {
    pub packaging: Decimal,
    pub shipping: Decimal,
    pub product: Decimal,
    pub replacement_shipping: Decimal,
}

/// The six return scenarios, collapsed to five variants (a resalable item
/// costs the same whether it was refunded or replaced).
///
/// Each variant carries exactly the cost components that apply to it, so
/// adding a component to the wrong scenario is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossScenario {
    /// Good × (Refund | Replaced): only the handling costs are lost.
    Resalable { packaging: Decimal, shipping: Decimal },
    /// Damaged × Refund: the product itself is written off.
    DamagedRefund {
        packaging: Decimal,
        shipping: Decimal,
        product: Decimal,
    },
    /// Damaged × Replaced: a second shipment goes out on our account.
    DamagedReplacement {
        packaging: Decimal,
        shipping: Decimal,
        product: Decimal,
        replacement_shipping: Decimal,
    },
    /// NotDelivered × Refund: wrong or missing item, money back.
    UndeliveredRefund {
        packaging: Decimal,
        shipping: Decimal,
        product: Decimal,
    },
    /// NotDelivered × Replaced: wrong or missing item, reshipped.
    UndeliveredReplacement {
        packaging: Decimal,
        shipping: Decimal,
        product: Decimal,
        replacement_shipping: Decimal,
    },
}

impl LossScenario {
    /// Classifies a return and keeps the cost components its scenario uses;
    /// everything else in `inputs` is discarded.
    pub fn classify(
        condition: ProductCondition,
        disposition: ReturnDisposition,
        inputs: LossInputs,
    ) -> Self {
        match (condition, disposition) {
            (ProductCondition::Good, _) => LossScenario::Resalable {
                packaging: inputs.packaging,
                shipping: inputs.shipping,
            },
            (ProductCondition::Damaged, ReturnDisposition::Refund) => LossScenario::DamagedRefund {
                packaging: inputs.packaging,
                shipping: inputs.shipping,
                product: inputs.product,
            },
            (ProductCondition::Damaged, ReturnDisposition::Replaced) => {
                LossScenario::DamagedReplacement {
                    packaging: inputs.packaging,
                    shipping: inputs.shipping,
                    product: inputs.product,
                    replacement_shipping: inputs.replacement_shipping,
                }
            }
            (ProductCondition::NotDelivered, ReturnDisposition::Refund) => {
                LossScenario::UndeliveredRefund {
                    packaging: inputs.packaging,
                    shipping: inputs.shipping,
                    product: inputs.product,
                }
            }
            (ProductCondition::NotDelivered, ReturnDisposition::Replaced) => {
                LossScenario::UndeliveredReplacement {
                    packaging: inputs.packaging,
                    shipping: inputs.shipping,
                    product: inputs.product,
                    replacement_shipping: inputs.replacement_shipping,
                }
            }
        }
    }

    /// Sum of the components this scenario recognizes.
    pub fn total_loss(&self) -> Decimal {
        match *self {
            LossScenario::Resalable {
                packaging,
                shipping,
            } => packaging + shipping,
            LossScenario::DamagedRefund {
                packaging,
                shipping,
                product,
            }
            | LossScenario::UndeliveredRefund {
                packaging,
                shipping,
                product,
            } => packaging + shipping + product,
            LossScenario::DamagedReplacement {
                packaging,
                shipping,
                product,
                replacement_shipping,
            }
            | LossScenario::UndeliveredReplacement {
                packaging,
                shipping,
                product,
                replacement_shipping,
            } => packaging + shipping + product + replacement_shipping,
        }
    }

    /// Whether the platform can be asked to compensate this loss at all.
    pub fn claim_eligible(&self) -> bool {
        !matches!(self, LossScenario::Resalable { .. })
    }

    /// Whether an explicit claim verdict can be picked when the record is
    /// created (wrong/undelivered product is always disputable).
    pub fn claim_disputable(&self) -> bool {
        matches!(
            self,
            LossScenario::UndeliveredRefund { .. } | LossScenario::UndeliveredReplacement { .. }
        )
    }

    /// Whether the product itself counts towards the loss, i.e. whether a
    /// `product` component exists on this variant.
    pub fn includes_product_loss(&self) -> bool {
        !matches!(self, LossScenario::Resalable { .. })
    }

    /// The components as they are persisted: zero for everything the
    /// scenario does not recognize.
    pub fn components(&self) -> LossInputs {
        match *self {
            LossScenario::Resalable {
                packaging,
                shipping,
            } => LossInputs {
                packaging,
                shipping,
                ..Default::default()
            },
            LossScenario::DamagedRefund {
                packaging,
                shipping,
                product,
            }
            | LossScenario::UndeliveredRefund {
                packaging,
                shipping,
                product,
            } => LossInputs {
                packaging,
                shipping,
                product,
                ..Default::default()
            },
            LossScenario::DamagedReplacement {
                packaging,
                shipping,
                product,
                replacement_shipping,
            }
            | LossScenario::UndeliveredReplacement {
                packaging,
                shipping,
                product,
                replacement_shipping,
            } => LossInputs {
                packaging,
                shipping,
                product,
                replacement_shipping,
            },
        }
    }
}

/// Compensation as entered by the operator.
#[derive(Debug, Clone, Copy)]
pub struct CompensationTerms {
    pub is_compensated: bool,
    pub amount: Decimal,
}

impl CompensationTerms {
    /// The amount that actually offsets the loss: zero unless the
    /// compensation flag is set.
    pub fn effective_amount(&self) -> Decimal {
        if self.is_compensated {
            self.amount
        } else {
            Decimal::ZERO
        }
    }
}

/// `net_loss = total_loss - effective compensation`. May be negative when
/// compensation exceeded the loss; see [`NetPosition`] for how that is
/// surfaced.
pub fn net_loss(total_loss: Decimal, compensation: &CompensationTerms) -> Decimal {
    total_loss - compensation.effective_amount()
}

/// Signed `net_loss` folded into an explicit outcome, so an
/// over-compensated return reads as a recovery instead of a negative loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum NetPosition {
    Loss(Decimal),
    BreakEven,
    Recovered(Decimal),
}

impl NetPosition {
    pub fn from_net_loss(net: Decimal) -> Self {
        if net > Decimal::ZERO {
            NetPosition::Loss(net)
        } else if net < Decimal::ZERO {
            NetPosition::Recovered(-net)
        } else {
            NetPosition::BreakEven
        }
    }
}

/// Result of a claim transition: the status plus the amounts as they must
/// be persisted with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimResolution {
    pub status: ClaimStatus,
    pub compensation_amount: Decimal,
    pub net_loss: Decimal,
}

/// The claim lifecycle as a pure transition function.
///
/// `Pending -> Approved` keeps the amounts as entered. `Pending ->
/// Rejected` zeroes the compensation and restores the full loss: a
/// rejected claim pays nothing. `Approved` and `Rejected` are terminal.
pub fn resolve_claim(
    current: ClaimStatus,
    requested: ClaimStatus,
    compensation_amount: Decimal,
    total_loss: Decimal,
) -> Result<ClaimResolution, ServiceError> {
    match (current, requested) {
        (ClaimStatus::Pending, ClaimStatus::Approved) => Ok(ClaimResolution {
            status: ClaimStatus::Approved,
            compensation_amount,
            net_loss: total_loss - compensation_amount,
        }),
        (ClaimStatus::Pending, ClaimStatus::Rejected) => Ok(ClaimResolution {
            status: ClaimStatus::Rejected,
            compensation_amount: Decimal::ZERO,
            net_loss: total_loss,
        }),
        (ClaimStatus::Pending, ClaimStatus::Pending) => Err(ServiceError::InvalidOperation(
            "claim is already pending".to_string(),
        )),
        (current, requested) => Err(ServiceError::InvalidOperation(format!(
            "claim status {current:?} is terminal; cannot move to {requested:?}"
        ))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateReturnAnalysisRequest {
    pub order_id: Uuid,
    pub packaging_loss: Option<Decimal>,
    pub shipping_loss: Option<Decimal>,
    /// For undelivered scenarios this defaults to the order line's
    /// `price_at_sale` when left unset.
    pub product_loss: Option<Decimal>,
    pub replacement_shipping_loss: Option<Decimal>,
    #[serde(default)]
    pub is_compensated: bool,
    pub compensation_amount: Option<Decimal>,
    /// Only honored for disputable (undelivered) scenarios.
    pub claim_status: Option<ClaimStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReturnAnalysisResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub packaging_loss: Decimal,
    pub shipping_loss: Decimal,
    pub product_loss: Decimal,
    pub replacement_shipping_loss: Decimal,
    pub is_compensated: bool,
    pub compensation_amount: Decimal,
    pub total_loss: Decimal,
    pub net_loss: Decimal,
    pub net_position: NetPosition,
    pub claim_status: ClaimStatus,
    pub analysis_date: DateTime<Utc>,
    /// Channel metadata carried over from the underlying return.
    pub seller_id: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateClaimStatusRequest {
    pub claim_status: ClaimStatus,
}

/// Return-loss reconciliation service.
///
/// Consumes persisted Return records; never touches the stock ledger.
#[derive(Clone)]
pub struct LossAnalysisService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    activity: Arc<ActivityLogger>,
}

impl LossAnalysisService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, activity: Arc<ActivityLogger>) -> Self {
        Self {
            db,
            event_sender,
            activity,
        }
    }

    /// Creates the reconciliation record for an order's return.
    ///
    /// All derived figures (scenario, total and net loss) are computed
    /// here from the stored return and the operator's inputs; client-sent
    /// totals are never trusted.
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn create_analysis(
        &self,
        employee_id: Uuid,
        request: CreateReturnAnalysisRequest,
    ) -> Result<ReturnAnalysisResponse, ServiceError> {
        validate_amounts(&request)?;

        let req = request.clone();

        let model = self
            .db
            .transaction::<_, return_analysis::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let ret = ReturnEntity::find()
                        .filter(return_entity::Column::OrderId.eq(req.order_id))
                        .order_by_desc(return_entity::Column::CreatedAt)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "No return recorded for order {}",
                                req.order_id
                            ))
                        })?;

                    let existing = ReturnAnalysisEntity::find()
                        .filter(return_analysis::Column::OrderId.eq(req.order_id))
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    if existing.is_some() {
                        return Err(ServiceError::Conflict(format!(
                            "Order {} already has a return analysis",
                            req.order_id
                        )));
                    }

                    // Probe with zeroed inputs first; classification only
                    // depends on (condition, disposition).
                    let probe = LossScenario::classify(
                        ret.condition,
                        ret.disposition,
                        LossInputs::default(),
                    );

                    let product_loss = match req.product_loss {
                        Some(v) => v,
                        None if probe.claim_disputable() => {
                            // The customer never got the item; its sale
                            // price is the default write-off.
                            order_item::Entity::find()
                                .filter(order_item::Column::OrderId.eq(ret.order_id))
                                .filter(order_item::Column::ProductId.eq(ret.product_id))
                                .one(txn)
                                .await
                                .map_err(ServiceError::db_error)?
                                .map(|item| item.price_at_sale)
                                .unwrap_or(Decimal::ZERO)
                        }
                        None => Decimal::ZERO,
                    };

                    let scenario = LossScenario::classify(
                        ret.condition,
                        ret.disposition,
                        LossInputs {
                            packaging: req.packaging_loss.unwrap_or(Decimal::ZERO),
                            shipping: req.shipping_loss.unwrap_or(Decimal::ZERO),
                            product: product_loss,
                            replacement_shipping: req
                                .replacement_shipping_loss
                                .unwrap_or(Decimal::ZERO),
                        },
                    );

                    if req.is_compensated && !scenario.claim_eligible() {
                        return Err(ServiceError::InvalidInput(
                            "a resalable return has no product loss to compensate".to_string(),
                        ));
                    }

                    if matches!(req.claim_status, Some(s) if s != ClaimStatus::Pending)
                        && !scenario.claim_disputable()
                    {
                        return Err(ServiceError::InvalidInput(
                            "a claim verdict can only be recorded for undelivered returns"
                                .to_string(),
                        ));
                    }

                    let compensation = CompensationTerms {
                        is_compensated: req.is_compensated,
                        amount: req.compensation_amount.unwrap_or(Decimal::ZERO),
                    };

                    let total = scenario.total_loss();
                    let (claim_status, compensation_amount, net) =
                        match req.claim_status.unwrap_or(ClaimStatus::Pending) {
                            ClaimStatus::Pending => (
                                ClaimStatus::Pending,
                                compensation.effective_amount(),
                                net_loss(total, &compensation),
                            ),
                            verdict => {
                                let resolution = resolve_claim(
                                    ClaimStatus::Pending,
                                    verdict,
                                    compensation.effective_amount(),
                                    total,
                                )?;
                                (
                                    resolution.status,
                                    resolution.compensation_amount,
                                    resolution.net_loss,
                                )
                            }
                        };

                    let components = scenario.components();
                    let now = Utc::now();

                    return_analysis::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        order_id: Set(req.order_id),
                        packaging_loss: Set(components.packaging),
                        shipping_loss: Set(components.shipping),
                        product_loss: Set(components.product),
                        replacement_shipping_loss: Set(components.replacement_shipping),
                        is_compensated: Set(req.is_compensated),
                        compensation_amount: Set(compensation_amount),
                        total_loss: Set(total),
                        net_loss: Set(net),
                        claim_status: Set(claim_status),
                        analysis_date: Set(now),
                        created_at: Set(now),
                        updated_at: Set(Some(now)),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => {
                    error!(error = %db_err, "return analysis creation failed to run");
                    ServiceError::DatabaseError(db_err)
                }
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(analysis_id = %model.id, total_loss = %model.total_loss, "return analysis recorded");

        self.activity
            .record(
                employee_id,
                "Recorded Return Analysis",
                format!(
                    "Analysis {} for order {} (total loss {})",
                    model.id, model.order_id, model.total_loss
                ),
            )
            .await;

        self.enrich(model).await
    }

    /// Moves a claim out of `Pending`.
    ///
    /// The status write and the forced recompute on rejection are applied
    /// in the same row update; the record is never observable with a
    /// rejected claim and a non-zero compensation.
    #[instrument(skip(self), fields(analysis_id = %analysis_id, requested = ?request.claim_status))]
    pub async fn update_claim_status(
        &self,
        employee_id: Uuid,
        analysis_id: Uuid,
        request: UpdateClaimStatusRequest,
    ) -> Result<ReturnAnalysisResponse, ServiceError> {
        let requested = request.claim_status;

        let model = self
            .db
            .transaction::<_, return_analysis::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let analysis = ReturnAnalysisEntity::find_by_id(analysis_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Return analysis {analysis_id} not found"
                            ))
                        })?;

                    let resolution = resolve_claim(
                        analysis.claim_status,
                        requested,
                        analysis.compensation_amount,
                        analysis.total_loss,
                    )?;

                    let mut active: return_analysis::ActiveModel = analysis.into();
                    active.claim_status = Set(resolution.status);
                    active.compensation_amount = Set(resolution.compensation_amount);
                    active.net_loss = Set(resolution.net_loss);
                    active.updated_at = Set(Some(Utc::now()));

                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => {
                    error!(error = %db_err, "claim status update failed to run");
                    ServiceError::DatabaseError(db_err)
                }
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(analysis_id = %model.id, status = ?model.claim_status, "claim resolved");

        self.activity
            .record(
                employee_id,
                "Updated Claim Status",
                format!("Claim on analysis {} set to {:?}", model.id, model.claim_status),
            )
            .await;

        self.event_sender
            .publish(Event::ClaimResolved {
                analysis_id: model.id,
                status: model.claim_status,
            })
            .await;

        self.enrich(model).await
    }

    /// Lists analyses newest first, with channel metadata joined in from
    /// the underlying returns.
    #[instrument(skip(self))]
    pub async fn list_analyses(&self) -> Result<Vec<ReturnAnalysisResponse>, ServiceError> {
        let db = &*self.db;

        let analyses = ReturnAnalysisEntity::find()
            .order_by_desc(return_analysis::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let order_ids: Vec<Uuid> = analyses.iter().map(|a| a.order_id).collect();
        let channels = self.channels_by_order(&order_ids).await?;

        Ok(analyses
            .into_iter()
            .map(|a| {
                let channel = channels.get(&a.order_id).cloned().unwrap_or_default();
                to_response(a, channel)
            })
            .collect())
    }

    /// Compensated analyses whose claim is still pending review.
    #[instrument(skip(self))]
    pub async fn list_pending_claims(&self) -> Result<Vec<ReturnAnalysisResponse>, ServiceError> {
        let db = &*self.db;

        let analyses = ReturnAnalysisEntity::find()
            .filter(return_analysis::Column::IsCompensated.eq(true))
            .filter(return_analysis::Column::ClaimStatus.eq(ClaimStatus::Pending))
            .order_by_desc(return_analysis::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let order_ids: Vec<Uuid> = analyses.iter().map(|a| a.order_id).collect();
        let channels = self.channels_by_order(&order_ids).await?;

        Ok(analyses
            .into_iter()
            .map(|a| {
                let channel = channels.get(&a.order_id).cloned().unwrap_or_default();
                to_response(a, channel)
            })
            .collect())
    }

    async fn enrich(
        &self,
        model: return_analysis::Model,
    ) -> Result<ReturnAnalysisResponse, ServiceError> {
        let channels = self.channels_by_order(&[model.order_id]).await?;
        let channel = channels.get(&model.order_id).cloned().unwrap_or_default();
        Ok(to_response(model, channel))
    }

    async fn channels_by_order(
        &self,
        order_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, (Option<String>, Option<String>)>, ServiceError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let returns = ReturnEntity::find()
            .filter(return_entity::Column::OrderId.is_in(order_ids.iter().copied()))
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(returns
            .into_iter()
            .map(|r| (r.order_id, (r.seller_id, r.platform)))
            .collect())
    }
}

fn validate_amounts(request: &CreateReturnAnalysisRequest) -> Result<(), ServiceError> {
    let components = [
        ("packaging_loss", request.packaging_loss),
        ("shipping_loss", request.shipping_loss),
        ("product_loss", request.product_loss),
        ("replacement_shipping_loss", request.replacement_shipping_loss),
        ("compensation_amount", request.compensation_amount),
    ];

    for (name, value) in components {
        if matches!(value, Some(v) if v < Decimal::ZERO) {
            return Err(ServiceError::InvalidInput(format!(
                "{name} cannot be negative"
            )));
        }
    }

    Ok(())
}

fn to_response(
    model: return_analysis::Model,
    channel: (Option<String>, Option<String>),
) -> ReturnAnalysisResponse {
    let (seller_id, platform) = channel;
    ReturnAnalysisResponse {
        id: model.id,
        order_id: model.order_id,
        packaging_loss: model.packaging_loss,
        shipping_loss: model.shipping_loss,
        product_loss: model.product_loss,
        replacement_shipping_loss: model.replacement_shipping_loss,
        is_compensated: model.is_compensated,
        compensation_amount: model.compensation_amount,
        total_loss: model.total_loss,
        net_position: NetPosition::from_net_loss(model.net_loss),
        net_loss: model.net_loss,
        claim_status: model.claim_status,
        analysis_date: model.analysis_date,
        seller_id,
        platform,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn inputs() -> LossInputs {
        LossInputs {
            packaging: dec!(5),
            shipping: dec!(10),
            product: dec!(50),
            replacement_shipping: dec!(8),
        }
    }

    #[rstest]
    #[case(ProductCondition::Good, ReturnDisposition::Refund, dec!(15))]
    #[case(ProductCondition::Good, ReturnDisposition::Replaced, dec!(15))]
    #[case(ProductCondition::Damaged, ReturnDisposition::Refund, dec!(65))]
    #[case(ProductCondition::Damaged, ReturnDisposition::Replaced, dec!(73))]
    #[case(ProductCondition::NotDelivered, ReturnDisposition::Refund, dec!(65))]
    #[case(ProductCondition::NotDelivered, ReturnDisposition::Replaced, dec!(73))]
    fn scenario_matrix_total_loss(
        #[case] condition: ProductCondition,
        #[case] disposition: ReturnDisposition,
        #[case] expected: Decimal,
    ) {
        let scenario = LossScenario::classify(condition, disposition, inputs());
        assert_eq!(scenario.total_loss(), expected);
    }

    #[test]
    fn resalable_scenarios_discard_product_components() {
        let scenario = LossScenario::classify(
            ProductCondition::Good,
            ReturnDisposition::Refund,
            inputs(),
        );
        let components = scenario.components();
        assert_eq!(components.product, Decimal::ZERO);
        assert_eq!(components.replacement_shipping, Decimal::ZERO);
        assert!(!scenario.claim_eligible());
        assert!(!scenario.claim_disputable());
    }

    #[test]
    fn refund_scenarios_have_no_replacement_shipping() {
        let scenario = LossScenario::classify(
            ProductCondition::Damaged,
            ReturnDisposition::Refund,
            inputs(),
        );
        assert_eq!(scenario.components().replacement_shipping, Decimal::ZERO);
        assert!(scenario.claim_eligible());
        assert!(!scenario.claim_disputable());
    }

    #[test]
    fn undelivered_scenarios_are_disputable() {
        for disposition in [ReturnDisposition::Refund, ReturnDisposition::Replaced] {
            let scenario =
                LossScenario::classify(ProductCondition::NotDelivered, disposition, inputs());
            assert!(scenario.claim_disputable());
        }
    }

    #[test]
    fn compensation_only_counts_when_flagged() {
        let off = CompensationTerms {
            is_compensated: false,
            amount: dec!(20),
        };
        assert_eq!(off.effective_amount(), Decimal::ZERO);
        assert_eq!(net_loss(dec!(73), &off), dec!(73));

        let on = CompensationTerms {
            is_compensated: true,
            amount: dec!(20),
        };
        assert_eq!(net_loss(dec!(73), &on), dec!(53));
    }

    #[test]
    fn over_compensation_surfaces_as_recovery() {
        let comp = CompensationTerms {
            is_compensated: true,
            amount: dec!(100),
        };
        let net = net_loss(dec!(73), &comp);
        assert_eq!(NetPosition::from_net_loss(net), NetPosition::Recovered(dec!(27)));
        assert_eq!(NetPosition::from_net_loss(Decimal::ZERO), NetPosition::BreakEven);
        assert_eq!(
            NetPosition::from_net_loss(dec!(73)),
            NetPosition::Loss(dec!(73))
        );
    }

    #[test]
    fn rejecting_a_claim_zeroes_compensation_and_restores_full_loss() {
        let resolution =
            resolve_claim(ClaimStatus::Pending, ClaimStatus::Rejected, dec!(30), dec!(73))
                .unwrap();
        assert_eq!(resolution.compensation_amount, Decimal::ZERO);
        assert_eq!(resolution.net_loss, dec!(73));
        assert_eq!(resolution.status, ClaimStatus::Rejected);
    }

    #[test]
    fn approving_a_claim_keeps_the_amounts() {
        let resolution =
            resolve_claim(ClaimStatus::Pending, ClaimStatus::Approved, dec!(20), dec!(73))
                .unwrap();
        assert_eq!(resolution.compensation_amount, dec!(20));
        assert_eq!(resolution.net_loss, dec!(53));
    }

    #[rstest]
    #[case(ClaimStatus::Approved, ClaimStatus::Rejected)]
    #[case(ClaimStatus::Approved, ClaimStatus::Pending)]
    #[case(ClaimStatus::Rejected, ClaimStatus::Approved)]
    #[case(ClaimStatus::Rejected, ClaimStatus::Pending)]
    fn terminal_claim_states_cannot_move(
        #[case] current: ClaimStatus,
        #[case] requested: ClaimStatus,
    ) {
        assert_matches!(
            resolve_claim(current, requested, dec!(10), dec!(50)),
            Err(ServiceError::InvalidOperation(_))
        );
    }

    #[test]
    fn negative_amounts_are_rejected_up_front() {
        let request = CreateReturnAnalysisRequest {
            order_id: Uuid::new_v4(),
            packaging_loss: Some(dec!(-1)),
            shipping_loss: None,
            product_loss: None,
            replacement_shipping_loss: None,
            is_compensated: false,
            compensation_amount: None,
            claim_status: None,
        };
        assert_matches!(
            validate_amounts(&request),
            Err(ServiceError::InvalidInput(_))
        );
    }
}
