//! Per-rate IVA aggregation from the summary breakdown or the line items.

use std::collections::HashSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::amount::{amount_of, parse_amount};
use super::error::ComprobanteError;
use super::rate::{CATEGORY_FIELDS, IVA_CATEGORY, RATE_CODE_FIELDS, code_field, resolve_rate};
use super::tree::{Node, find_all};
use super::types::{Breakdown, BreakdownSource};

/// Summary fields holding declared breakdown entries. Document versions
/// differ in which one they use, and some repeat entries under both.
pub const SUMMARY_BREAKDOWN_FIELDS: &[&str] = &["TotalDesgloseFactura", "TotalDesgloseImpuesto"];
/// Amount of a summary breakdown entry.
pub const SUMMARY_AMOUNT_FIELDS: &[&str] = &["TotalMontoImpuesto", "MontoImpuesto"];
/// Tax entries of a line item.
pub const LINE_TAX_FIELDS: &[&str] = &["Impuesto", "Impuestos"];
/// Amount of a line tax entry.
pub const LINE_AMOUNT_FIELDS: &[&str] = &["Monto", "MontoImpuesto"];
/// Taxable base of a line item, in order of preference.
pub const LINE_BASE_FIELDS: &[&str] =
    &["BaseImponible", "SubTotal", "MontoTotal", "MontoTotalLinea"];

/// Raw per-rate totals of one document, before reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub tax_by_rate: Breakdown,
    pub taxable_by_rate: Breakdown,
    pub source: BreakdownSource,
}

/// Aggregate IVA per rate for one document.
///
/// Declared summary entries are preferred. Only when they yield nothing
/// are the line items' own tax entries used.
///
/// Fails with [`ComprobanteError::Overflow`] when an amount, a bucket, or an
/// implied taxable base leaves the decimal range.
pub fn aggregate(
    lines: &[&Node],
    summary: Option<&Node>,
) -> Result<Aggregation, ComprobanteError> {
    let mut tax_by_rate = Breakdown::new();
    let mut taxable_by_rate = Breakdown::new();

    if let Some(summary) = summary {
        add_summary_entries(summary, &mut tax_by_rate, &mut taxable_by_rate)?;
    }
    if !tax_by_rate.is_empty() {
        return Ok(Aggregation {
            tax_by_rate,
            taxable_by_rate,
            source: BreakdownSource::Summary,
        });
    }

    for line in lines {
        add_line_entries(line, &mut tax_by_rate, &mut taxable_by_rate)?;
    }
    Ok(Aggregation {
        tax_by_rate,
        taxable_by_rate,
        source: BreakdownSource::LineItems,
    })
}

/// Base implied by a tax amount at a positive rate: `amount / (rate / 100)`.
fn implied_base(amount: Decimal, rate: Decimal) -> Result<Decimal, ComprobanteError> {
    amount
        .checked_mul(dec!(100))
        .and_then(|scaled| scaled.checked_div(rate))
        .ok_or_else(|| ComprobanteError::overflow(format!("taxable base at {rate}%")))
}

fn add_summary_entries(
    summary: &Node,
    tax: &mut Breakdown,
    taxable: &mut Breakdown,
) -> Result<(), ComprobanteError> {
    let mut seen: HashSet<(String, String, Decimal)> = HashSet::new();
    let entries = SUMMARY_BREAKDOWN_FIELDS
        .iter()
        .flat_map(|field| find_all(summary, field))
        .filter(|entry| entry.is_mapping());

    for entry in entries {
        let category = code_field(entry, CATEGORY_FIELDS);
        if category != IVA_CATEGORY {
            continue;
        }
        let Some(raw_amount) = entry.get_any(SUMMARY_AMOUNT_FIELDS).and_then(Node::text) else {
            continue;
        };
        let amount = parse_amount(raw_amount);
        let rate_code = code_field(entry, RATE_CODE_FIELDS);
        if !seen.insert((category, rate_code, amount.normalize())) {
            continue;
        }
        let Some(rate) = resolve_rate(entry) else {
            continue;
        };

        tax.add(rate, amount)?;
        if rate > Decimal::ZERO {
            taxable.add(rate, implied_base(amount, rate)?)?;
        }
    }
    Ok(())
}

fn add_line_entries(
    line: &Node,
    tax: &mut Breakdown,
    taxable: &mut Breakdown,
) -> Result<(), ComprobanteError> {
    let taxes = LINE_TAX_FIELDS
        .iter()
        .filter_map(|field| line.get(field))
        .find(|node| !matches!(node, Node::Scalar(s) if s.is_empty()));
    let Some(taxes) = taxes else {
        return Ok(());
    };

    for entry in taxes.items().iter().filter(|e| e.is_mapping()) {
        if code_field(entry, CATEGORY_FIELDS) != IVA_CATEGORY {
            continue;
        }
        let Some(rate) = resolve_rate(entry) else {
            continue;
        };
        let Some(raw_amount) = entry.get_any(LINE_AMOUNT_FIELDS).and_then(Node::text) else {
            continue;
        };

        tax.add(rate, parse_amount(raw_amount))?;
        let base = amount_of(line.get_any(LINE_BASE_FIELDS));
        if rate > Decimal::ZERO && !base.is_zero() {
            taxable.add(rate, base)?;
        }
    }
    Ok(())
}
