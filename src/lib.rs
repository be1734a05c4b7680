//! # comprobante
//!
//! IVA extraction and reconciliation for Costa Rican electronic invoices
//! (Hacienda *comprobantes electrónicos*, v4.2–4.4).
//!
//! Issuers and schema versions place tax fields at different depths and
//! under different names. This crate finds them by name wherever they are,
//! resolves `CodigoTarifaIVA` codes to rates, builds a per-rate IVA
//! breakdown, and reconciles it so it sums exactly to the declared
//! `TotalImpuesto`.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use comprobante::xml;
//! use rust_decimal_macros::dec;
//!
//! let doc = xml::parse_document(r#"
//!     <FacturaElectronica>
//!       <Clave>50601052400310123456700100001010000000001100000001</Clave>
//!       <FechaEmision>2024-05-01T10:00:00-06:00</FechaEmision>
//!       <ResumenFactura>
//!         <TotalDesgloseImpuesto>
//!           <Codigo>01</Codigo>
//!           <CodigoTarifaIVA>08</CodigoTarifaIVA>
//!           <TotalMontoImpuesto>129.97</TotalMontoImpuesto>
//!         </TotalDesgloseImpuesto>
//!         <TotalImpuesto>130.00</TotalImpuesto>
//!       </ResumenFactura>
//!     </FacturaElectronica>"#).unwrap();
//!
//! let record = doc.summarize().unwrap();
//! assert_eq!(record.tax_by_rate.get(dec!(13)), Some(dec!(130.00)));
//! assert!(record.reconciliation.adjusted);
//! assert_eq!(record.reconciliation.diff_applied, dec!(0.03));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Document tree, rate resolution, aggregation, reconciliation |
//! | `xml` (default) | XML → document tree via `quick-xml` |
//! | `batch` (default) | Folder processing with date filtering and totals |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "xml")]
pub mod xml;

#[cfg(feature = "batch")]
pub mod batch;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
