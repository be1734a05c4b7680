//! Generic document tree and name-based field lookup.
//!
//! Invoice schemas move fields between nesting levels across issuers and
//! versions, so extraction never walks fixed paths. Instead it searches the
//! tree for a field name wherever it appears.

use std::ops::ControlFlow;

/// Field name under which a mapping stores its own text when the element
/// also carries attributes.
pub const TEXT_KEY: &str = "#text";

/// A parsed document: scalars are untyped strings, mappings hold named
/// fields in document order, sequences hold repeated elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Scalar(String),
    Mapping(Vec<(String, Node)>),
    Sequence(Vec<Node>),
}

impl Node {
    /// An empty mapping.
    pub fn mapping() -> Self {
        Self::Mapping(Vec::new())
    }

    /// Insert a field into a mapping. A repeated name turns the existing
    /// value into a sequence instead of overwriting it.
    ///
    /// Has no effect on scalars and sequences.
    pub fn insert(&mut self, name: impl Into<String>, value: Node) {
        let Self::Mapping(entries) = self else {
            return;
        };
        let name = name.into();
        match entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, Self::Sequence(items))) => items.push(value),
            Some((_, existing)) => {
                let first = std::mem::replace(existing, Self::Sequence(Vec::new()));
                *existing = Self::Sequence(vec![first, value]);
            }
            None => entries.push((name, value)),
        }
    }

    /// Direct child field of a mapping.
    pub fn get(&self, name: &str) -> Option<&Node> {
        match self {
            Self::Mapping(entries) => entries.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// First direct child present among `names`, in the order given.
    ///
    /// A present but empty field wins over a later alias.
    pub fn get_any(&self, names: &[&str]) -> Option<&Node> {
        names.iter().find_map(|name| self.get(name))
    }

    /// Scalar text, or the `#text` field of a mapping with attributes.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::Mapping(_) => self.get(TEXT_KEY).and_then(Node::text),
            Self::Sequence(_) => None,
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }

    /// Elements of a sequence, or the node itself as a single item.
    pub fn items(&self) -> &[Node] {
        match self {
            Self::Sequence(items) => items,
            other => std::slice::from_ref(other),
        }
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Self::Scalar(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Self::Scalar(s)
    }
}

impl<K: Into<String>> FromIterator<(K, Node)> for Node {
    fn from_iter<I: IntoIterator<Item = (K, Node)>>(iter: I) -> Self {
        let mut node = Self::mapping();
        for (k, v) in iter {
            node.insert(k, v);
        }
        node
    }
}

/// Receives every named field reached by [`walk`].
pub trait FieldVisitor<'a> {
    fn visit_field(&mut self, name: &'a str, value: &'a Node) -> ControlFlow<()>;
}

/// Depth-first traversal. All fields of a mapping are visited before any of
/// them is descended into; children are then searched in document order.
pub fn walk<'a, V: FieldVisitor<'a>>(node: &'a Node, visitor: &mut V) -> ControlFlow<()> {
    match node {
        Node::Scalar(_) => ControlFlow::Continue(()),
        Node::Mapping(entries) => {
            for (name, value) in entries {
                visitor.visit_field(name, value)?;
            }
            for (_, value) in entries {
                walk(value, visitor)?;
            }
            ControlFlow::Continue(())
        }
        Node::Sequence(items) => {
            for item in items {
                walk(item, visitor)?;
            }
            ControlFlow::Continue(())
        }
    }
}

struct FirstMatch<'a, 'n> {
    name: &'n str,
    found: Option<&'a Node>,
}

impl<'a> FieldVisitor<'a> for FirstMatch<'a, '_> {
    fn visit_field(&mut self, name: &'a str, value: &'a Node) -> ControlFlow<()> {
        if name == self.name {
            self.found = Some(value);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }
}

struct AllMatches<'a, 'n> {
    name: &'n str,
    found: Vec<&'a Node>,
}

impl<'a> FieldVisitor<'a> for AllMatches<'a, '_> {
    fn visit_field(&mut self, name: &'a str, value: &'a Node) -> ControlFlow<()> {
        if name == self.name {
            self.found.extend(value.items());
        }
        ControlFlow::Continue(())
    }
}

/// Value of the first field called `name` anywhere in `tree`.
///
/// `None` means the field does not exist; a present empty element is
/// `Some(Node::Scalar(""))`.
pub fn find_first<'a>(tree: &'a Node, name: &str) -> Option<&'a Node> {
    let mut visitor = FirstMatch { name, found: None };
    let _ = walk(tree, &mut visitor);
    visitor.found
}

/// Every value of a field called `name` anywhere in `tree`, with sequence
/// values flattened into the result.
pub fn find_all<'a>(tree: &'a Node, name: &str) -> Vec<&'a Node> {
    let mut visitor = AllMatches {
        name,
        found: Vec::new(),
    };
    let _ = walk(tree, &mut visitor);
    visitor.found
}
