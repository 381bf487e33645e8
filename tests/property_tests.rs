use proptest::prelude::*;
use rust_decimal::Decimal;

use backoffice_api::entities::{ClaimStatus, ProductCondition, ReturnDisposition};
use backoffice_api::services::loss_analysis::{
    net_loss, resolve_claim, CompensationTerms, LossInputs, LossScenario, NetPosition,
};

fn money() -> impl Strategy<Value = Decimal> {
    // Two-fraction-digit amounts in [0, 10_000.00]
    (0i64..=1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn condition() -> impl Strategy<Value = ProductCondition> {
    prop_oneof![
        Just(ProductCondition::Good),
        Just(ProductCondition::Damaged),
        Just(ProductCondition::NotDelivered),
    ]
}

fn disposition() -> impl Strategy<Value = ReturnDisposition> {
    prop_oneof![
        Just(ReturnDisposition::Refund),
        Just(ReturnDisposition::Replaced),
    ]
}

proptest! {
    /// total_loss always equals the sum of the components the scenario
    /// kept, and the kept components are a subset of the inputs.
    #[test]
    fn total_loss_matches_kept_components(
        packaging in money(),
        shipping in money(),
        product in money(),
        replacement_shipping in money(),
        condition in condition(),
        disposition in disposition(),
    ) {
        let scenario = LossScenario::classify(condition, disposition, LossInputs {
            packaging,
            shipping,
            product,
            replacement_shipping,
        });

        let c = scenario.components();
        prop_assert_eq!(
            scenario.total_loss(),
            c.packaging + c.shipping + c.product + c.replacement_shipping
        );

        // Handling costs survive every scenario; the rest only where the
        // matrix says so.
        prop_assert_eq!(c.packaging, packaging);
        prop_assert_eq!(c.shipping, shipping);
        prop_assert!(c.product == product || c.product == Decimal::ZERO);
        prop_assert!(
            c.replacement_shipping == replacement_shipping
                || c.replacement_shipping == Decimal::ZERO
        );
    }

    /// An uncompensated record always nets its full loss.
    #[test]
    fn uncompensated_net_loss_is_total_loss(total in money(), amount in money()) {
        let terms = CompensationTerms { is_compensated: false, amount };
        prop_assert_eq!(net_loss(total, &terms), total);
    }

    /// net_loss + effective compensation reconstructs total_loss.
    #[test]
    fn net_loss_and_compensation_reconstruct_total(total in money(), amount in money()) {
        let terms = CompensationTerms { is_compensated: true, amount };
        prop_assert_eq!(net_loss(total, &terms) + terms.effective_amount(), total);
    }

    /// The net position never reports a negative magnitude.
    #[test]
    fn net_position_magnitudes_are_non_negative(total in money(), amount in money()) {
        let terms = CompensationTerms { is_compensated: true, amount };
        match NetPosition::from_net_loss(net_loss(total, &terms)) {
            NetPosition::Loss(v) | NetPosition::Recovered(v) => prop_assert!(v > Decimal::ZERO),
            NetPosition::BreakEven => prop_assert_eq!(total, amount),
        }
    }

    /// Rejection always zeroes compensation and restores the full loss,
    /// whatever was entered.
    #[test]
    fn rejection_always_restores_full_loss(compensation in money(), total in money()) {
        let resolution =
            resolve_claim(ClaimStatus::Pending, ClaimStatus::Rejected, compensation, total)
                .unwrap();
        prop_assert_eq!(resolution.compensation_amount, Decimal::ZERO);
        prop_assert_eq!(resolution.net_loss, total);
    }

    /// No input whatsoever moves a claim out of a terminal state.
    #[test]
    fn terminal_states_never_transition(
        compensation in money(),
        total in money(),
        current in prop_oneof![Just(ClaimStatus::Approved), Just(ClaimStatus::Rejected)],
        requested in prop_oneof![
            Just(ClaimStatus::Pending),
            Just(ClaimStatus::Approved),
            Just(ClaimStatus::Rejected)
        ],
    ) {
        prop_assert!(resolve_claim(current, requested, compensation, total).is_err());
    }
}
