use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::core::{ComprobanteError, InvoiceRecord, Node, TEXT_KEY, summarize};

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Local name of the document element (e.g. `FacturaElectronica`).
    pub root_name: String,
    /// Content of the document element.
    pub root: Node,
}

impl Document {
    /// Extract the invoice record of this document.
    pub fn summarize(&self) -> Result<InvoiceRecord, ComprobanteError> {
        summarize(&self.root)
    }
}

/// Element under construction.
struct Frame {
    name: String,
    fields: Node,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, ComprobanteError> {
        let name = utf8(start.local_name().as_ref())?.to_string();
        let mut fields = Node::mapping();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ComprobanteError::Xml(format!("bad attribute: {e}")))?;
            let raw_key = attr.key.as_ref();
            if raw_key == b"xmlns" || raw_key.starts_with(b"xmlns:") {
                continue;
            }
            let key = utf8(attr.key.local_name().as_ref())?.to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| ComprobanteError::Xml(format!("bad attribute value: {e}")))?;
            fields.insert(key, Node::Scalar(value.trim().to_string()));
        }
        Ok(Self {
            name,
            fields,
            text: String::new(),
        })
    }

    fn close(self) -> (String, Node) {
        let text = self.text.trim();
        let node = match self.fields {
            Node::Mapping(ref entries) if entries.is_empty() => Node::Scalar(text.to_string()),
            mut fields => {
                if !text.is_empty() {
                    fields.insert(TEXT_KEY, Node::Scalar(text.to_string()));
                }
                fields
            }
        };
        (self.name, node)
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, ComprobanteError> {
    std::str::from_utf8(bytes)
        .map_err(|e| ComprobanteError::Xml(format!("invalid UTF-8 name: {e}")))
}

/// Parse an XML string into a [`Document`].
pub fn parse_document(xml: &str) -> Result<Document, ComprobanteError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut document: Option<Document> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            ComprobanteError::Xml(format!(
                "XML parse error at byte {}: {e}",
                reader.error_position()
            ))
        })?;
        match event {
            Event::Start(ref e) => stack.push(Frame::open(e)?),
            Event::Empty(ref e) => {
                let (name, node) = Frame::open(e)?.close();
                attach(&mut stack, &mut document, name, node)?;
            }
            Event::Text(ref e) => {
                if let Some(frame) = stack.last_mut() {
                    let text = e
                        .unescape()
                        .map_err(|e| ComprobanteError::Xml(format!("bad text: {e}")))?;
                    frame.text.push_str(&text);
                }
            }
            Event::CData(ref e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(e));
                }
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| ComprobanteError::Xml("unbalanced end tag".into()))?;
                let (name, node) = frame.close();
                attach(&mut stack, &mut document, name, node)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ComprobanteError::Xml(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }
    document.ok_or_else(|| ComprobanteError::Xml("no root element".into()))
}

/// Parse raw file content. A UTF-8 byte order mark is skipped.
pub fn parse_bytes(bytes: &[u8]) -> Result<Document, ComprobanteError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let xml = std::str::from_utf8(bytes)
        .map_err(|e| ComprobanteError::Xml(format!("document is not UTF-8: {e}")))?;
    parse_document(xml)
}

fn attach(
    stack: &mut [Frame],
    document: &mut Option<Document>,
    name: String,
    node: Node,
) -> Result<(), ComprobanteError> {
    if let Some(parent) = stack.last_mut() {
        parent.fields.insert(name, node);
        return Ok(());
    }
    if document.is_some() {
        return Err(ComprobanteError::Xml(format!("second root element <{name}>")));
    }
    *document = Some(Document {
        root_name: name,
        root: node,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefixes_and_namespace_declarations() {
        let doc = parse_document(
            r#"<fe:Factura xmlns:fe="urn:a" xmlns="urn:b" fe:version="4.4"><fe:Clave>1</fe:Clave></fe:Factura>"#,
        )
        .unwrap();
        assert_eq!(doc.root_name, "Factura");
        assert_eq!(doc.root.get("version"), Some(&Node::from("4.4")));
        assert_eq!(doc.root.get("Clave"), Some(&Node::from("1")));
        assert_eq!(doc.root.get("fe"), None);
        assert_eq!(doc.root.get("xmlns"), None);
    }

    #[test]
    fn repeated_siblings_become_sequence() {
        let doc = parse_document("<R><L>1</L><X/><L>2</L></R>").unwrap();
        assert_eq!(
            doc.root.get("L"),
            Some(&Node::Sequence(vec!["1".into(), "2".into()]))
        );
        assert_eq!(doc.root.get("X"), Some(&Node::from("")));
    }

    #[test]
    fn attribute_with_text_keeps_both() {
        let doc = parse_document(r#"<R><Monto moneda="CRC"> 100.00 </Monto></R>"#).unwrap();
        let monto = doc.root.get("Monto").unwrap();
        assert_eq!(monto.get("moneda"), Some(&Node::from("CRC")));
        assert_eq!(monto.text(), Some("100.00"));
    }

    #[test]
    fn entities_and_cdata() {
        let doc = parse_document("<R><A>a &amp; b</A><B><![CDATA[x<y]]></B></R>").unwrap();
        assert_eq!(doc.root.get("A"), Some(&Node::from("a & b")));
        assert_eq!(doc.root.get("B"), Some(&Node::from("x<y")));
    }

    #[test]
    fn declaration_and_comments_ignored() {
        let doc = parse_document(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!-- emitido -->\n<R><A>1</A><!-- c --></R>",
        )
        .unwrap();
        let expected: Node = [("A", Node::from("1"))].into_iter().collect();
        assert_eq!(doc.root, expected);
    }

    #[test]
    fn bom_is_skipped() {
        let doc = parse_bytes(b"\xEF\xBB\xBF<R><A>1</A></R>").unwrap();
        assert_eq!(doc.root_name, "R");
    }

    #[test]
    fn malformed_documents_fail() {
        assert!(matches!(parse_document("<R><A></R>"), Err(ComprobanteError::Xml(_))));
        assert!(matches!(parse_document("<R><A>1</A>"), Err(ComprobanteError::Xml(_))));
        assert!(matches!(parse_document(""), Err(ComprobanteError::Xml(_))));
        assert!(matches!(parse_document("<A/><B/>"), Err(ComprobanteError::Xml(_))));
        assert!(matches!(parse_bytes(&[0xff, 0xfe]), Err(ComprobanteError::Xml(_))));
    }
}
