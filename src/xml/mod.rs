//! Reading electronic-invoice XML into a [`Node`] tree.
//!
//! The tree shape is what field lookup expects:
//!
//! - namespace prefixes are stripped from element and attribute names;
//! - attributes land in the same mapping as child elements (`xmlns`
//!   declarations are dropped);
//! - repeated sibling elements become a [`Node::Sequence`];
//! - every value stays a string, trimmed; an element with only text is a
//!   [`Node::Scalar`], one with attributes keeps its text under
//!   [`TEXT_KEY`](crate::core::TEXT_KEY);
//! - the XML declaration, comments, processing instructions, and DOCTYPE
//!   are ignored.
//!
//! # Example
//!
//! ```
//! use comprobante::core::find_first;
//! use comprobante::xml;
//!
//! let doc = xml::parse_document(
//!     r#"<?xml version="1.0"?><FacturaElectronica xmlns="urn:x"><Clave>506</Clave></FacturaElectronica>"#,
//! ).unwrap();
//! assert_eq!(doc.root_name, "FacturaElectronica");
//! assert_eq!(find_first(&doc.root, "Clave").and_then(|n| n.text()), Some("506"));
//! ```

mod reader;

pub use reader::{Document, parse_bytes, parse_document};
