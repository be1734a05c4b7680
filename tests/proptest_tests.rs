//! Property-based tests for aggregation and reconciliation.
//!
//! Run with: `cargo test --test proptest_tests`

use comprobante::core::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ── Helpers ─────────────────────────────────────────────────────────────────

fn node<const N: usize>(fields: [(&str, Node); N]) -> Node {
    fields.into_iter().collect()
}

fn summary_entry(rate_code: &str, amount: Decimal) -> Node {
    node([
        ("Codigo", "01".into()),
        ("CodigoTarifaIVA", rate_code.into()),
        ("TotalMontoImpuesto", amount.to_string().into()),
    ])
}

fn summary_of(entries: Vec<Node>) -> Node {
    let mut summary = Node::mapping();
    for entry in entries {
        summary.insert("TotalDesgloseImpuesto", entry);
    }
    summary
}

/// Sum over buckets that take part in reconciliation.
fn reconciled_sum(breakdown: &Breakdown) -> Decimal {
    breakdown
        .iter()
        .filter(|(rate, _)| !rate.is_zero())
        .map(|(_, amount)| amount)
        .sum()
}

// ── Proptest Strategies ─────────────────────────────────────────────────────

/// Amount in cents, 0.01 to 99999.99.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Positive rate as seen in real documents.
fn arb_rate() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        Just(dec!(1)),
        Just(dec!(2)),
        Just(dec!(4)),
        Just(dec!(8)),
        Just(dec!(13)),
    ]
}

/// Breakdown with 1-5 positive-rate buckets and an optional zero bucket.
fn arb_breakdown() -> impl Strategy<Value = Breakdown> {
    (
        prop::collection::vec((arb_rate(), arb_amount()), 1..=5),
        any::<bool>(),
    )
        .prop_map(|(pairs, with_zero)| {
            let mut breakdown: Breakdown = pairs.into_iter().collect();
            if with_zero {
                breakdown.add(Decimal::ZERO, Decimal::ZERO).unwrap();
            }
            breakdown
        })
}

fn arb_rate_code() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("01"), Just("02"), Just("03"), Just("08"), Just("1"), Just("8")]
}

// ── Property Tests ──────────────────────────────────────────────────────────

proptest! {
    /// Totals that already agree to the cent leave the breakdown untouched.
    #[test]
    fn agreeing_total_is_identity(breakdown in arb_breakdown()) {
        let declared = reconciled_sum(&breakdown);
        let r = reconcile(&breakdown, declared);
        prop_assert_eq!(&r.breakdown, &breakdown);
        prop_assert!(!r.info.adjusted);
        prop_assert_eq!(r.info.diff_applied, Decimal::ZERO);
    }

    /// After reconciliation the buckets sum exactly to the rounded declared total.
    #[test]
    fn reconciled_sum_matches_declared(
        breakdown in arb_breakdown(),
        declared_cents in 0i64..20_000_000i64,
        extra_digit in 0i64..10,
    ) {
        let declared = Decimal::new(declared_cents * 10 + extra_digit, 3);
        let r = reconcile(&breakdown, declared);
        prop_assert_eq!(reconciled_sum(&r.breakdown), amount::round2(declared));
        prop_assert!(!r.info.no_breakdown);
    }

    /// The residual lands on the bucket that was largest before scaling.
    #[test]
    fn largest_bucket_absorbs_residual(
        breakdown in arb_breakdown(),
        declared_cents in 1i64..20_000_000i64,
    ) {
        let declared = Decimal::new(declared_cents, 2);
        let r = reconcile(&breakdown, declared);
        if r.info.adjusted {
            let largest = breakdown
                .iter()
                .filter(|(rate, _)| !rate.is_zero())
                .fold(None::<(Decimal, Decimal)>, |best, (rate, amount)| match best {
                    Some((_, a)) if a.abs() >= amount.abs() => best,
                    _ => Some((rate, amount)),
                })
                .map(|(rate, _)| rate);
            prop_assert_eq!(r.info.adjusted_rate, largest);
        }
    }

    /// Zero-rate buckets pass through reconciliation untouched.
    #[test]
    fn zero_rate_bucket_survives(
        breakdown in arb_breakdown(),
        declared_cents in 0i64..1_000_000i64,
    ) {
        let r = reconcile(&breakdown, Decimal::new(declared_cents, 2));
        prop_assert_eq!(
            r.breakdown.get(Decimal::ZERO),
            breakdown.get(Decimal::ZERO)
        );
    }

    /// A breakdown whose sum is not positive is never scaled.
    #[test]
    fn non_positive_base_is_not_adjusted(
        amount in arb_amount(),
        declared_cents in 1i64..1_000_000i64,
    ) {
        let breakdown: Breakdown = [(dec!(13), -amount)].into_iter().collect();
        let r = reconcile(&breakdown, Decimal::new(declared_cents, 2));
        prop_assert!(!r.info.adjusted);
        prop_assert_eq!(&r.breakdown, &breakdown);
        prop_assert_eq!(
            r.info.diff_applied,
            Decimal::new(declared_cents, 2) + amount
        );
    }

    /// Repeating an identical breakdown entry changes nothing.
    #[test]
    fn duplicate_entries_are_idempotent(
        entries in prop::collection::vec((arb_rate_code(), arb_amount()), 1..=4),
    ) {
        let once: Vec<Node> = entries.iter().map(|(c, a)| summary_entry(c, *a)).collect();
        let twice: Vec<Node> = once.iter().chain(once.iter()).cloned().collect();
        let a = aggregate(&[], Some(&summary_of(once))).unwrap();
        let b = aggregate(&[], Some(&summary_of(twice))).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Zero-rate entries never contribute a taxable base.
    #[test]
    fn zero_rate_never_has_taxable_base(
        entries in prop::collection::vec((arb_rate_code(), arb_amount()), 1..=6),
    ) {
        let summary = summary_of(entries.iter().map(|(c, a)| summary_entry(c, *a)).collect());
        let agg = aggregate(&[], Some(&summary)).unwrap();
        prop_assert!(!agg.taxable_by_rate.contains_rate(Decimal::ZERO));
    }

    /// Rate code 08 resolves to 13 whatever explicit percentage sits next to it.
    #[test]
    fn code_08_always_thirteen(tarifa in ".{0,8}") {
        let entry = node([
            ("CodigoTarifaIVA", "08".into()),
            ("Tarifa", tarifa.into()),
        ]);
        prop_assert_eq!(resolve_rate(&entry), Some(dec!(13)));
    }
}
