//! Per-document extraction: identifiers, issue date, summary totals, and the
//! reconciled IVA breakdown, assembled into an [`InvoiceRecord`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use super::amount::{amount_of, checked_sum, round2, sum_fields};
use super::breakdown::aggregate;
use super::error::ComprobanteError;
use super::reconcile::reconcile;
use super::tree::{Node, find_first};
use super::types::{BreakdownSource, InvoiceRecord, ReconciliationInfo};

/// Date fields, in order of preference.
pub const DATE_FIELDS: &[&str] = &["FechaEmision", "FechaCreacion", "FechaFactura", "IssueDate"];

const SUMMARY_FIELD: &str = "ResumenFactura";
const DETAIL_FIELDS: &[&str] = &["DetalleServicio", "DetalleFactura"];
const LINE_FIELDS: &[&str] = &["LineaDetalle", "Lineas", "lineas"];

const TAXABLE_FIELDS: &[&str] = &["TotalGravado", "TotalVentaGravada"];
const TAXABLE_PARTS: &[&str] = &["TotalServGravados", "TotalMercanciasGravadas"];
const SUBTOTAL_FIELDS: &[&str] = &["TotalVenta", "TotalVentaNeta"];
const TAX_FIELDS: &[&str] = &["TotalImpuesto", "TotalImpuestos"];
const TAX_ENTRY_FIELD: &str = "TotalDesgloseImpuesto";
const TAX_ENTRY_AMOUNT_FIELDS: &[&str] = &["TotalMontoImpuesto", "MontoImpuesto", "Monto"];
const GRAND_TOTAL_FIELDS: &[&str] =
    &["TotalComprobante", "TotalFactura", "TotalDocumento", "TotalMedioPago"];
const PAYMENT_FIELD: &str = "MedioPago";
const PAYMENT_AMOUNT_FIELDS: &[&str] = &["TotalMedioPago", "Monto", "Total"];
const EXEMPT_FIELDS: &[&str] = &["TotalExento"];
const EXEMPT_PARTS: &[&str] = &["TotalServExentos", "TotalMercanciasExentas"];
const DISCOUNT_FIELDS: &[&str] = &["TotalDescuentos", "TotalDescuento"];

/// Declared totals of the summary block (`ResumenFactura`).
///
/// Every field reads as zero when the summary is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryTotals {
    pub taxable: Decimal,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
    pub exempt: Decimal,
    pub discounts: Decimal,
}

impl SummaryTotals {
    /// Read totals from a summary node, falling back to the sum of finer
    /// sub-totals where the primary field is absent or zero.
    ///
    /// A fallback sum that overflows is an error.
    pub fn from_summary(summary: &Node) -> Result<Self, ComprobanteError> {
        let mut taxable = amount_of(summary.get_any(TAXABLE_FIELDS));
        if taxable.is_zero() {
            taxable = sum_fields(summary, TAXABLE_PARTS)?;
        }

        let mut tax = amount_of(summary.get_any(TAX_FIELDS));
        if tax.is_zero() {
            tax = sum_entries(summary, TAX_ENTRY_FIELD, TAX_ENTRY_AMOUNT_FIELDS)?;
        }

        let mut grand_total = amount_of(summary.get_any(GRAND_TOTAL_FIELDS));
        if grand_total.is_zero() {
            grand_total = sum_entries(summary, PAYMENT_FIELD, PAYMENT_AMOUNT_FIELDS)?;
        }

        let mut exempt = amount_of(summary.get_any(EXEMPT_FIELDS));
        if exempt.is_zero() {
            exempt = sum_fields(summary, EXEMPT_PARTS)?;
        }

        Ok(Self {
            taxable,
            subtotal: amount_of(summary.get_any(SUBTOTAL_FIELDS)),
            tax,
            grand_total,
            exempt,
            discounts: amount_of(summary.get_any(DISCOUNT_FIELDS)),
        })
    }
}

/// Sum the first present amount field of each `field` entry of `summary`.
fn sum_entries(
    summary: &Node,
    field: &str,
    amount_fields: &[&str],
) -> Result<Decimal, ComprobanteError> {
    let Some(entries) = summary.get(field) else {
        return Ok(Decimal::ZERO);
    };
    let amounts = entries
        .items()
        .iter()
        .map(|entry| amount_of(entry.get_any(amount_fields)));
    checked_sum(amounts).ok_or_else(|| ComprobanteError::overflow(field))
}

/// Document key (`Clave`) and sequential number (`NumeroConsecutivo`).
/// Missing identifiers read as empty strings.
pub fn extract_identifiers(root: &Node) -> (String, String) {
    let text = |name: &str| {
        find_first(root, name)
            .and_then(Node::text)
            .unwrap_or_default()
            .to_string()
    };
    (text("Clave"), text("NumeroConsecutivo"))
}

/// First parseable issue date among [`DATE_FIELDS`].
pub fn extract_issue_date(root: &Node) -> Option<DateTime<Utc>> {
    DATE_FIELDS
        .iter()
        .filter_map(|field| find_first(root, field).and_then(Node::text))
        .find_map(parse_date)
}

/// Parse an RFC 3339 timestamp, a naive `YYYY-MM-DDTHH:MM:SS` (taken as
/// UTC), or a plain `YYYY-MM-DD` (UTC midnight).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Line items under `DetalleServicio` / `DetalleFactura`.
pub fn extract_line_items(root: &Node) -> Vec<&Node> {
    let Some(detail) = DETAIL_FIELDS.iter().find_map(|field| find_first(root, field)) else {
        return Vec::new();
    };
    detail
        .get_any(LINE_FIELDS)
        .map(|lines| lines.items().iter().collect())
        .unwrap_or_default()
}

/// Extract one invoice from a parsed document.
///
/// `root` is the content of the document element. Fails when it is not a
/// mapping at all, or when a total leaves the decimal range; every missing
/// field downstream reads as zero or empty.
pub fn summarize(root: &Node) -> Result<InvoiceRecord, ComprobanteError> {
    if !root.is_mapping() {
        return Err(ComprobanteError::Structure("document root has no fields".into()));
    }

    let (key, sequence_number) = extract_identifiers(root);
    let issue_date = extract_issue_date(root);
    let summary = find_first(root, SUMMARY_FIELD);
    let totals = match summary {
        Some(summary) => SummaryTotals::from_summary(summary)?,
        None => SummaryTotals::default(),
    };
    let lines = extract_line_items(root);

    let aggregation = aggregate(&lines, summary)?;
    aggregation.tax_by_rate.total()?;
    let reconciliation = reconcile(&aggregation.tax_by_rate, totals.tax);
    debug!(
        key = %key,
        source = ?aggregation.source,
        adjusted = reconciliation.info.adjusted,
        "extracted IVA breakdown"
    );

    let tax_total = if totals.tax.is_zero() {
        reconciliation.breakdown.total()?
    } else {
        totals.tax
    };
    let is_exempt = tax_total.is_zero() && totals.exempt > Decimal::ZERO;
    let observations = observations(aggregation.source, &reconciliation.info, totals.tax);

    Ok(InvoiceRecord {
        key,
        sequence_number,
        issue_date,
        taxable_total: totals.taxable,
        discount_total: totals.discounts,
        subtotal: totals.subtotal,
        tax_total,
        grand_total: totals.grand_total,
        exempt_total: totals.exempt,
        tax_by_rate: reconciliation.breakdown,
        taxable_by_rate: aggregation.taxable_by_rate,
        breakdown_source: aggregation.source,
        reconciliation: reconciliation.info,
        is_exempt,
        observations,
    })
}

fn observations(
    source: BreakdownSource,
    info: &ReconciliationInfo,
    declared_tax: Decimal,
) -> Vec<String> {
    let mut notes = Vec::new();
    if source == BreakdownSource::LineItems {
        notes.push(
            "Sin desglose de IVA en el resumen; desglose calculado desde las líneas.".into(),
        );
    }
    if info.adjusted && info.diff_applied.abs() >= dec!(0.01) {
        let rate = info
            .adjusted_rate
            .map(|r| format!("{}%", r.normalize()))
            .unwrap_or_default();
        notes.push(format!(
            "IVA ajustado en la tarifa {rate} por una diferencia de {} para cuadrar con TotalImpuesto.",
            round2(info.diff_applied)
        ));
    }
    if info.no_breakdown && !declared_tax.is_zero() {
        notes.push("TotalImpuesto declarado sin desglose por tarifa.".into());
    }
    if info.is_unresolved() {
        notes.push(format!(
            "Diferencia de {} entre el desglose y TotalImpuesto sin resolver.",
            round2(info.diff_applied)
        ));
    }
    notes
}
