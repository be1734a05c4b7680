//! Forcing a per-rate breakdown to sum exactly to the declared tax total.
//!
//! Summary totals and independently sourced per-rate entries often disagree
//! by a few cents. Reports need the per-rate figures to add up to the
//! displayed total, so the breakdown is scaled proportionally and the
//! rounding residual is pushed onto the largest bucket, where a fixed
//! absolute error is proportionally smallest.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::amount::{checked_sum, round2};
use super::types::{Breakdown, Reconciliation, ReconciliationInfo};

/// Reconcile `breakdown` against `declared_total`.
///
/// Zero-rate buckets never take part: they are excluded from the sum and
/// passed through unchanged. When the rounded sum already matches, or there
/// is nothing to scale, the breakdown is returned as is. A non-positive sum
/// cannot be scaled; the difference is then only recorded in
/// [`ReconciliationInfo::diff_applied`]. A sum outside the decimal range is
/// left unreconciled, with the difference saturated.
pub fn reconcile(breakdown: &Breakdown, declared_total: Decimal) -> Reconciliation {
    let buckets: Vec<(Decimal, Decimal)> =
        breakdown.iter().filter(|(rate, _)| !rate.is_zero()).collect();
    let target = round2(declared_total);

    let mut info = ReconciliationInfo {
        no_breakdown: buckets.is_empty(),
        ..Default::default()
    };

    let Some(sum) = checked_sum(buckets.iter().map(|(_, amount)| *amount)) else {
        warn!(declared = %declared_total, "IVA breakdown sum overflows, left unreconciled");
        info.diff_applied = target.saturating_sub(saturated_sum(&buckets));
        return Reconciliation {
            breakdown: breakdown.clone(),
            info,
        };
    };
    let rounded_sum = round2(sum);

    if buckets.is_empty() || rounded_sum == target {
        return Reconciliation {
            breakdown: breakdown.clone(),
            info,
        };
    }

    let scaled = if sum > Decimal::ZERO {
        scale_to_target(breakdown, buckets, sum, declared_total, target)
    } else {
        None
    };

    info.diff_applied = target.saturating_sub(rounded_sum);
    match scaled {
        Some((adjusted, largest_rate)) => {
            debug!(
                diff = %info.diff_applied,
                rate = %largest_rate,
                "rescaled IVA breakdown to declared total"
            );
            info.adjusted = true;
            info.adjusted_rate = Some(largest_rate);
            Reconciliation {
                breakdown: adjusted,
                info,
            }
        }
        None => {
            debug!(
                sum = %sum,
                declared = %declared_total,
                "IVA breakdown cannot be scaled, difference left unresolved"
            );
            Reconciliation {
                breakdown: breakdown.clone(),
                info,
            }
        }
    }
}

fn saturated_sum(buckets: &[(Decimal, Decimal)]) -> Decimal {
    buckets
        .iter()
        .fold(Decimal::ZERO, |acc, (_, amount)| acc.saturating_add(*amount))
}

/// Scale every bucket by `declared / sum`, rounded to cents. The largest
/// bucket by absolute amount (first in input order on ties) gets
/// `target - Σ others` instead, so the result sums to `target` exactly.
///
/// Returns the adjusted breakdown and the rate that absorbed the residual,
/// or `None` if the arithmetic overflows.
fn scale_to_target(
    breakdown: &Breakdown,
    mut buckets: Vec<(Decimal, Decimal)>,
    sum: Decimal,
    declared_total: Decimal,
    target: Decimal,
) -> Option<(Breakdown, Decimal)> {
    let scale = declared_total.checked_div(sum)?;

    // stable: equal magnitudes keep ascending-rate order
    buckets.sort_by(|a, b| b.1.abs().cmp(&a.1.abs()));
    let (largest_rate, _) = *buckets.first()?;

    let mut adjusted = breakdown.clone();
    let mut running = Decimal::ZERO;
    for &(rate, amount) in &buckets[1..] {
        let value = round2(amount.checked_mul(scale)?);
        running = running.checked_add(value)?;
        adjusted.set(rate, value);
    }
    adjusted.set(largest_rate, target.checked_sub(running)?);

    Some((adjusted, largest_rate))
}
