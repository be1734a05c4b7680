//! Core extraction and reconciliation engine.
//!
//! Works on a generic [`Node`] tree so it is independent of how the
//! document was parsed. The pipeline for one document is
//! field lookup → [`aggregate`] → [`reconcile`] → [`InvoiceRecord`],
//! driven by [`summarize`]. Records fold into an [`Aggregate`].

pub mod amount;
mod breakdown;
mod error;
mod rate;
mod reconcile;
mod summary;
mod tree;
mod types;

pub use breakdown::*;
pub use error::*;
pub use rate::{
    CATEGORY_FIELDS, EXPLICIT_RATE_FIELDS, IVA_CATEGORY, RATE_CODE_FIELDS, RateCode, pad_code,
    resolve_rate,
};
pub use reconcile::reconcile;
pub use summary::*;
pub use tree::*;
pub use types::*;
