//! IVA rate resolution from rate codes (`CodigoTarifaIVA`) and explicit
//! percentages (`Tarifa`).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::amount::try_parse_amount;
use super::tree::Node;

/// Field names carrying the tax category of an entry.
pub const CATEGORY_FIELDS: &[&str] = &["Codigo", "codigo"];
/// Field names carrying the IVA rate code of an entry.
pub const RATE_CODE_FIELDS: &[&str] = &["CodigoTarifaIVA", "codigoTarifaIVA"];
/// Field names carrying an explicit percentage.
pub const EXPLICIT_RATE_FIELDS: &[&str] = &["Tarifa", "tarifa", "Porcentaje"];

/// Tax category code for IVA (value-added tax).
pub const IVA_CATEGORY: &str = "01";

/// Rate codes with a fixed percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateCode {
    /// 01: 0%.
    Zero,
    /// 02: reduced 1%.
    Reduced1,
    /// 03: reduced 2%.
    Reduced2,
    /// 08: general rate 13%.
    General,
}

impl RateCode {
    /// Two-digit code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Zero => "01",
            Self::Reduced1 => "02",
            Self::Reduced2 => "03",
            Self::General => "08",
        }
    }

    /// Percentage for this code.
    pub fn rate(&self) -> Decimal {
        match self {
            Self::Zero => dec!(0),
            Self::Reduced1 => dec!(1),
            Self::Reduced2 => dec!(2),
            Self::General => dec!(13),
        }
    }

    /// Parse a code, zero-padding to two digits first ("8" → "08").
    pub fn from_code(code: &str) -> Option<Self> {
        match pad_code(code).as_str() {
            "01" => Some(Self::Zero),
            "02" => Some(Self::Reduced1),
            "03" => Some(Self::Reduced2),
            "08" => Some(Self::General),
            _ => None,
        }
    }
}

/// Left-pad a code with zeros to two characters. Longer codes are kept.
pub fn pad_code(code: &str) -> String {
    format!("{:0>2}", code.trim())
}

/// Padded text of the first present field in `names`, or `"00"` when absent.
pub(crate) fn code_field(entry: &Node, names: &[&str]) -> String {
    pad_code(entry.get_any(names).and_then(Node::text).unwrap_or(""))
}

/// Resolve the IVA rate of a tax entry.
///
/// A known rate code always wins, even over a conflicting explicit
/// percentage. Otherwise a numeric explicit percentage (zero included) is
/// used. `None` means the entry carries no usable rate and must not be
/// aggregated.
pub fn resolve_rate(entry: &Node) -> Option<Decimal> {
    let code = entry
        .get_any(RATE_CODE_FIELDS)
        .and_then(Node::text)
        .and_then(RateCode::from_code);
    if let Some(code) = code {
        return Some(code.rate());
    }

    entry
        .get_any(EXPLICIT_RATE_FIELDS)
        .and_then(Node::text)
        .and_then(try_parse_amount)
        .map(|rate| rate.normalize())
}
