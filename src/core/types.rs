use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::amount::checked_sum;
use super::error::ComprobanteError;

/// Accumulated amount per IVA rate.
///
/// Rates are normalized on insert, so `13` and `13.00` share one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Breakdown(BTreeMap<Decimal, Decimal>);

impl Breakdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to the bucket for `rate`, creating it if needed.
    /// On overflow the bucket keeps its previous value.
    pub fn add(&mut self, rate: Decimal, amount: Decimal) -> Result<(), ComprobanteError> {
        let rate = rate.normalize();
        let bucket = self.0.entry(rate).or_default();
        *bucket = bucket
            .checked_add(amount)
            .ok_or_else(|| ComprobanteError::overflow(format!("IVA bucket {rate}%")))?;
        Ok(())
    }

    /// Replace the bucket for `rate`.
    pub fn set(&mut self, rate: Decimal, amount: Decimal) {
        self.0.insert(rate.normalize(), amount);
    }

    pub fn get(&self, rate: Decimal) -> Option<Decimal> {
        self.0.get(&rate.normalize()).copied()
    }

    pub fn contains_rate(&self, rate: Decimal) -> bool {
        self.0.contains_key(&rate.normalize())
    }

    /// Sum over all buckets.
    pub fn total(&self) -> Result<Decimal, ComprobanteError> {
        checked_sum(self.0.values().copied())
            .ok_or_else(|| ComprobanteError::overflow("IVA breakdown total"))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(rate, amount)` pairs in ascending rate order.
    pub fn iter(&self) -> impl Iterator<Item = (Decimal, Decimal)> + '_ {
        self.0.iter().map(|(r, a)| (*r, *a))
    }

    pub fn rates(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.0.keys().copied()
    }

    /// Add every bucket of `other` into `self`.
    pub fn merge(&mut self, other: &Breakdown) -> Result<(), ComprobanteError> {
        for (rate, amount) in other.iter() {
            self.add(rate, amount)?;
        }
        Ok(())
    }
}

/// Collecting saturates at the decimal range. Use [`Breakdown::add`] where
/// overflow must be reported.
impl FromIterator<(Decimal, Decimal)> for Breakdown {
    fn from_iter<I: IntoIterator<Item = (Decimal, Decimal)>>(iter: I) -> Self {
        let mut breakdown = Self::new();
        for (rate, amount) in iter {
            let bucket = breakdown.0.entry(rate.normalize()).or_default();
            *bucket = bucket.saturating_add(amount);
        }
        breakdown
    }
}

/// Where a document's per-rate tax figures came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakdownSource {
    /// Declared breakdown entries in the summary (`TotalDesgloseImpuesto`).
    Summary,
    /// Derived from the tax entries of each line item.
    LineItems,
}

/// What reconciliation did to a breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationInfo {
    /// Buckets were rescaled to match the declared total.
    pub adjusted: bool,
    /// `round2(declared) - round2(sum)`. Also set when the difference
    /// could not be resolved by scaling.
    pub diff_applied: Decimal,
    /// Rate of the largest bucket, which absorbed the rounding residual.
    pub adjusted_rate: Option<Decimal>,
    /// No non-zero-rate bucket existed to reconcile against.
    pub no_breakdown: bool,
}

impl ReconciliationInfo {
    /// A difference remained that scaling could not remove.
    pub fn is_unresolved(&self) -> bool {
        !self.adjusted && !self.diff_applied.is_zero()
    }
}

/// Reconciled breakdown plus what was done to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub breakdown: Breakdown,
    pub info: ReconciliationInfo,
}

/// Normalized tax summary of one electronic invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Document key (`Clave`), empty when absent.
    pub key: String,
    /// Sequential number (`NumeroConsecutivo`), empty when absent.
    pub sequence_number: String,
    /// Issue date (`FechaEmision` and aliases).
    pub issue_date: Option<DateTime<Utc>>,
    /// Taxable sales (`TotalGravado`).
    pub taxable_total: Decimal,
    /// Discounts (`TotalDescuentos`).
    pub discount_total: Decimal,
    /// Sales total before tax (`TotalVenta`).
    pub subtotal: Decimal,
    /// Tax total: declared, or the reconciled breakdown sum when none was declared.
    pub tax_total: Decimal,
    /// Document total (`TotalComprobante`).
    pub grand_total: Decimal,
    /// Exempt sales (`TotalExento`).
    pub exempt_total: Decimal,
    /// Reconciled tax per rate.
    pub tax_by_rate: Breakdown,
    /// Taxable base per positive rate.
    pub taxable_by_rate: Breakdown,
    pub breakdown_source: BreakdownSource,
    pub reconciliation: ReconciliationInfo,
    /// No tax charged and a positive exempt amount declared.
    pub is_exempt: bool,
    /// Human-readable notes about how the figures were derived.
    pub observations: Vec<String>,
}

impl InvoiceRecord {
    /// Observations joined into a single line.
    pub fn observation_text(&self) -> String {
        self.observations.join(" ")
    }
}

/// Running totals across every retained invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub invoice_count: usize,
    pub exempt_count: usize,
    pub taxable_total: Decimal,
    pub discount_total: Decimal,
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub grand_total: Decimal,
    pub exempt_total: Decimal,
    pub tax_by_rate: Breakdown,
    pub taxable_by_rate: Breakdown,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one invoice into the totals.
    ///
    /// All or nothing: if any running total would overflow, the aggregate
    /// is left as it was and the record is not counted.
    pub fn add(&mut self, record: &InvoiceRecord) -> Result<(), ComprobanteError> {
        let mut next = self.clone();
        next.invoice_count += 1;
        if record.is_exempt {
            next.exempt_count += 1;
        }
        for (total, amount, field) in [
            (&mut next.taxable_total, record.taxable_total, "taxable total"),
            (&mut next.discount_total, record.discount_total, "discount total"),
            (&mut next.subtotal, record.subtotal, "subtotal"),
            (&mut next.tax_total, record.tax_total, "tax total"),
            (&mut next.grand_total, record.grand_total, "grand total"),
            (&mut next.exempt_total, record.exempt_total, "exempt total"),
        ] {
            *total = total
                .checked_add(amount)
                .ok_or_else(|| ComprobanteError::overflow(format!("aggregate {field}")))?;
        }
        next.tax_by_rate.merge(&record.tax_by_rate)?;
        next.taxable_by_rate.merge(&record.taxable_by_rate)?;
        *self = next;
        Ok(())
    }

    /// Fold every record, failing on the first overflow.
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a InvoiceRecord>,
    ) -> Result<Self, ComprobanteError> {
        let mut aggregate = Self::new();
        for record in records {
            aggregate.add(record)?;
        }
        Ok(aggregate)
    }
}
