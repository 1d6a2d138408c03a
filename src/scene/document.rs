//! Scene document: header, component table and node tree.

use smallvec::SmallVec;

use crate::format::FILE_VERSION;
use crate::util::Result;

use super::component::Component;

/// Document header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub format_version: u32,
    pub generator: String,
    pub created_by: String,
    /// Creation date as `d-m-yyyy`.
    pub creation_date: String,
}

impl Header {
    /// Create a header stamped with today's date (UTC).
    pub fn new(generator: impl Into<String>, created_by: impl Into<String>) -> Self {
        Self {
            format_version: FILE_VERSION,
            generator: generator.into(),
            created_by: created_by.into(),
            creation_date: format_creation_date(time::OffsetDateTime::now_utc().date()),
        }
    }

    /// Generator string for documents written by this library.
    pub fn default_generator() -> String {
        format!(
            "fus-scene {} (built {})",
            env!("CARGO_PKG_VERSION"),
            option_env!("FUS_BUILD_DATE").unwrap_or("unknown")
        )
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new(Self::default_generator(), "")
    }
}

/// Format a date the way document headers store it.
pub fn format_creation_date(date: time::Date) -> String {
    format!("{}-{}-{}", date.day(), u8::from(date.month()), date.year())
}

/// A named point in the hierarchy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub name: Option<String>,
    /// Indices into the component table, in attachment order.
    pub components: SmallVec<[u32; 4]>,
    pub children: Vec<Node>,
}

impl Node {
    /// Create a node without components.
    pub fn new(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            components: SmallVec::new(),
            children: Vec::new(),
        }
    }

    /// Find a direct child by name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name.as_deref() == Some(name))
    }
}

/// Root value produced by a [`SceneWriter`](crate::writer::SceneWriter).
#[derive(Clone, Debug, PartialEq)]
pub struct SceneDocument {
    pub header: Header,
    /// Component table; position is the global component index.
    pub components: Vec<Component>,
    /// Top-level sibling nodes.
    pub children: Vec<Node>,
}

impl SceneDocument {
    /// Create an empty document.
    pub fn new(header: Header) -> Self {
        Self { header, components: Vec::new(), children: Vec::new() }
    }

    /// Component at `index`.
    pub fn component(&self, index: u32) -> Option<&Component> {
        self.components.get(index as usize)
    }

    /// Total number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(|_, _| count += 1);
        count
    }

    /// Visit every node depth-first, passing its depth (0 for top level).
    pub fn walk<F: FnMut(&Node, usize)>(&self, mut f: F) {
        fn visit<F: FnMut(&Node, usize)>(nodes: &[Node], depth: usize, f: &mut F) {
            for node in nodes {
                f(node, depth);
                visit(&node.children, depth + 1, f);
            }
        }
        visit(&self.children, 0, &mut f);
    }

    /// Find a top-level node by name.
    pub fn root(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name.as_deref() == Some(name))
    }

    /// Encode to the binary container format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        crate::writer::encode_document(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> SceneDocument {
        let mut doc = SceneDocument::new(Header::new("test", "tester"));
        let mut a = Node::new(Some("a"));
        a.children.push(Node::new(Some("a1")));
        a.children.push(Node::new(None));
        doc.children.push(a);
        doc.children.push(Node::new(Some("b")));
        doc
    }

    #[test]
    fn test_walk_order_and_depth() {
        let doc = tree();
        let mut seen = Vec::new();
        doc.walk(|n, d| seen.push((n.name.clone(), d)));
        assert_eq!(
            seen,
            vec![
                (Some("a".to_string()), 0),
                (Some("a1".to_string()), 1),
                (None, 1),
                (Some("b".to_string()), 0),
            ]
        );
        assert_eq!(doc.node_count(), 4);
    }

    #[test]
    fn test_lookup() {
        let doc = tree();
        let a = doc.root("a").expect("root a");
        assert!(a.child("a1").is_some());
        assert!(a.child("zz").is_none());
        assert!(doc.component(0).is_none());
    }

    #[test]
    fn test_creation_date_format() {
        let date = time::Date::from_calendar_date(2024, time::Month::March, 7).expect("date");
        assert_eq!(format_creation_date(date), "7-3-2024");
    }

    #[test]
    fn test_header_defaults() {
        let h = Header::default();
        assert_eq!(h.format_version, FILE_VERSION);
        assert!(h.generator.starts_with("fus-scene "));
    }
}
