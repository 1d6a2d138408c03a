//! Node arena and cursor frames.
//!
//! All nodes live in one arena and refer to their children by id. Each frame
//! records the node whose children are being appended to (`None` for the
//! document's top level) and the node currently open at that depth.

use smallvec::SmallVec;

use crate::format::MAX_NODE_DEPTH;
use crate::scene::Node;
use crate::util::{Error, Result};

/// Index of a node in the arena.
pub type NodeId = usize;

/// Arena-resident node.
#[derive(Debug, Default)]
pub struct NodeEntry {
    pub name: Option<String>,
    pub components: SmallVec<[u32; 4]>,
    pub children: Vec<NodeId>,
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    parent: Option<NodeId>,
    current: Option<NodeId>,
}

impl Frame {
    const TOP: Self = Self { parent: None, current: None };
}

/// Cursor over the node tree being built.
#[derive(Debug)]
pub struct NodeCursor {
    nodes: Vec<NodeEntry>,
    roots: Vec<NodeId>,
    frames: Vec<Frame>,
}

impl Default for NodeCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeCursor {
    /// Create a cursor positioned at the (empty) top level.
    pub fn new() -> Self {
        Self { nodes: Vec::new(), roots: Vec::new(), frames: vec![Frame::TOP] }
    }

    fn top(&self) -> Frame {
        // frames never drops below one entry
        self.frames.last().copied().unwrap_or(Frame::TOP)
    }

    fn top_mut(&mut self) -> &mut Frame {
        if self.frames.is_empty() {
            self.frames.push(Frame::TOP);
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Append a node to the current child list and make it current.
    pub fn add_child(&mut self, name: Option<&str>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(NodeEntry { name: name.map(str::to_string), ..NodeEntry::default() });
        match self.top().parent {
            Some(parent) => self.nodes[parent].children.push(id),
            None => self.roots.push(id),
        }
        self.top_mut().current = Some(id);
        id
    }

    /// Descend into the current node.
    pub fn push(&mut self) -> Result<()> {
        let current = self.top().current.ok_or(Error::NoCurrentNode)?;
        if self.depth() >= MAX_NODE_DEPTH {
            return Err(Error::NestingTooDeep { max: MAX_NODE_DEPTH });
        }
        self.frames.push(Frame { parent: Some(current), current: None });
        Ok(())
    }

    /// Ascend one level.
    pub fn pop(&mut self) -> Result<()> {
        if self.frames.len() <= 1 {
            return Err(Error::UnbalancedStack { depth: 0 });
        }
        self.frames.pop();
        Ok(())
    }

    /// Number of unmatched `push()` calls.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Id of the node open at the current depth.
    #[inline]
    pub fn current(&self) -> Option<NodeId> {
        self.top().current
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> Option<&NodeEntry> {
        self.nodes.get(id)
    }

    /// Attach a component index to the current node.
    pub fn attach(&mut self, component: u32) -> Result<()> {
        let id = self.current().ok_or(Error::NoCurrentNode)?;
        self.nodes[id].components.push(component);
        Ok(())
    }

    /// Total number of nodes created.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Snapshot of the tree as owned [`Node`]s.
    pub fn to_tree(&self) -> Vec<Node> {
        self.roots.iter().map(|&id| self.build(id)).collect()
    }

    fn build(&self, id: NodeId) -> Node {
        let entry = &self.nodes[id];
        Node {
            name: entry.name.clone(),
            components: entry.components.clone(),
            children: entry.children.iter().map(|&c| self.build(c)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_siblings_at_same_depth() {
        let mut c = NodeCursor::new();
        let a = c.add_child(Some("a"));
        let b = c.add_child(Some("b"));
        assert_ne!(a, b);
        assert_eq!(c.current(), Some(b));
        let tree = c.to_tree();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[1].name.as_deref(), Some("b"));
    }

    #[test]
    fn test_push_requires_current() {
        let mut c = NodeCursor::new();
        assert!(matches!(c.push(), Err(Error::NoCurrentNode)));
        c.add_child(None);
        c.push().expect("push");
        assert_eq!(c.depth(), 1);
        assert_eq!(c.current(), None);
        assert!(matches!(c.attach(0), Err(Error::NoCurrentNode)));
    }

    #[test]
    fn test_pop_restores_parent_as_current() {
        let mut c = NodeCursor::new();
        let root = c.add_child(Some("root"));
        c.push().expect("push");
        c.add_child(Some("child"));
        c.pop().expect("pop");
        assert_eq!(c.current(), Some(root));
        c.attach(7).expect("attach");

        let tree = c.to_tree();
        assert_eq!(tree[0].components.as_slice(), &[7]);
        assert_eq!(tree[0].children[0].name.as_deref(), Some("child"));
    }

    #[test]
    fn test_extra_pop_is_unbalanced() {
        let mut c = NodeCursor::new();
        assert!(c.is_empty());
        assert!(matches!(c.pop(), Err(Error::UnbalancedStack { .. })));
    }

    #[test]
    fn test_push_depth_limit() {
        let mut c = NodeCursor::new();
        for _ in 0..MAX_NODE_DEPTH {
            c.add_child(None);
            c.push().expect("push");
        }
        c.add_child(Some("deepest"));
        assert!(matches!(c.push(), Err(Error::NestingTooDeep { .. })));
        assert_eq!(c.depth(), MAX_NODE_DEPTH);
        assert_eq!(c.len(), MAX_NODE_DEPTH + 1);
        assert!(!c.is_empty());
    }
}
