//! Lenient numeric coercion for untyped document values.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::ComprobanteError;
use super::tree::Node;

/// Parse a document value as a decimal amount.
///
/// Surrounding whitespace is ignored. Empty, non-numeric, and
/// out-of-range values read as zero.
pub fn parse_amount(raw: &str) -> Decimal {
    try_parse_amount(raw).unwrap_or(Decimal::ZERO)
}

/// Like [`parse_amount`], but distinguishes "not a number" from zero.
pub fn try_parse_amount(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Amount carried by an optional node. Absent fields, sequences, and
/// mappings without text read as zero.
pub fn amount_of(node: Option<&Node>) -> Decimal {
    node.and_then(Node::text).map(parse_amount).unwrap_or(Decimal::ZERO)
}

/// Sum of the amounts of `names` read directly from `node`.
pub fn sum_fields(node: &Node, names: &[&str]) -> Result<Decimal, ComprobanteError> {
    checked_sum(names.iter().map(|name| amount_of(node.get(name))))
        .ok_or_else(|| ComprobanteError::overflow(names.join(" + ")))
}

/// Sum that stops at the first overflow instead of panicking.
pub fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value))
}

/// Round to cents using commercial rounding (half away from zero).
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
