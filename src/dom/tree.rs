//! Arena-backed document tree.
//!
//! Nodes are addressed by [`NodeId`]; parents are stored as ids, never as
//! references. Effective properties are resolved on first access and cached
//! per node.

use std::collections::HashMap;

use crate::ooxml::{NumberingDefinitions, NumberingLevel, ParagraphProperties, RunProperties, Style, StyleSheet};

use super::node::{EffectiveProperties, Node, NodeId, NodeKind};

#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: Vec<Node>,
    root: NodeId,
    footnotes: HashMap<String, NodeId>,
    /// Style definitions used for property resolution
    pub styles: StyleSheet,
    /// Numbering definitions used for list detection
    pub numbering: NumberingDefinitions,
    /// Page width from the last section, in twips
    pub page_width: Option<i32>,
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new(StyleSheet::default(), NumberingDefinitions::default())
    }
}

impl DocumentTree {
    /// Creates a tree holding only the `Document` root
    pub fn new(styles: StyleSheet, numbering: NumberingDefinitions) -> Self {
        DocumentTree {
            nodes: vec![Node::new(NodeKind::Document, None)],
            root: NodeId(0),
            footnotes: HashMap::new(),
            styles,
            numbering,
            page_width: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `Body` child of the root
    pub fn body(&self) -> Option<NodeId> {
        self.children(self.root)
            .iter()
            .copied()
            .find(|&id| matches!(self.kind(id), NodeKind::Body))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends a new node as the last child of `parent`
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.push(kind, Some(parent));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Creates a node without attaching it to a parent
    pub fn create_detached(&mut self, kind: NodeKind) -> NodeId {
        self.push(kind, None)
    }

    fn push(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind, parent));
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Replaces the children of `parent`, reparenting each new child to it
    pub fn replace_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        for &child in &children {
            self.nodes[child.0].parent = Some(parent);
        }
        self.nodes[parent.0].children = children;
    }

    pub fn register_footnote(&mut self, footnote_id: &str, node: NodeId) {
        self.footnotes.insert(footnote_id.to_string(), node);
    }

    pub fn footnote(&self, footnote_id: &str) -> Option<NodeId> {
        self.footnotes.get(footnote_id).copied()
    }

    /// Parent chain of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    fn effective(&self, id: NodeId) -> &EffectiveProperties {
        self.nodes[id.0].effective.get_or_init(|| self.resolve(id))
    }

    fn resolve(&self, id: NodeId) -> EffectiveProperties {
        match self.kind(id) {
            NodeKind::Paragraph(local) => {
                let (style_ppr, _) = self.styles.paragraph_style_properties(local.style_id.as_deref());
                EffectiveProperties::Paragraph(
                    self.styles
                        .default_paragraph_properties
                        .merged_with(&style_ppr)
                        .merged_with(local),
                )
            }
            NodeKind::Run(local) => {
                let paragraph_style = self
                    .ancestors(id)
                    .find_map(|ancestor| match self.kind(ancestor) {
                        NodeKind::Paragraph(props) => Some(props.style_id.as_deref()),
                        _ => None,
                    })
                    .flatten();
                let (_, paragraph_rpr) = self.styles.paragraph_style_properties(paragraph_style);
                let run_style_rpr = self.styles.run_style_properties(local.style_id.as_deref());
                EffectiveProperties::Run(
                    self.styles
                        .default_run_properties
                        .merged_with(&paragraph_rpr)
                        .merged_with(&run_style_rpr)
                        .merged_with(local),
                )
            }
            _ => EffectiveProperties::None,
        }
    }

    /// Effective properties of a paragraph: local > style chain > defaults
    pub fn paragraph_properties(&self, id: NodeId) -> Option<&ParagraphProperties> {
        match self.effective(id) {
            EffectiveProperties::Paragraph(props) => Some(props),
            _ => None,
        }
    }

    /// Effective properties of a run: local > run style > paragraph style > defaults
    pub fn run_properties(&self, id: NodeId) -> Option<&RunProperties> {
        match self.effective(id) {
            EffectiveProperties::Run(props) => Some(props),
            _ => None,
        }
    }

    /// Numbering level of a list paragraph; `None` unless both the list id
    /// and the level resolve to a definition
    pub fn numbering_level(&self, id: NodeId) -> Option<(&str, &NumberingLevel)> {
        let numbering = self.paragraph_properties(id)?.numbering.as_ref()?;
        let num_id = numbering.num_id.as_deref()?;
        let level = self.numbering.level(num_id, numbering.level_id.as_deref()?)?;
        Some((num_id, level))
    }

    pub fn heading_style(&self, id: NodeId) -> Option<&Style> {
        match self.kind(id) {
            NodeKind::Paragraph(local) => self.styles.heading_style(local.style_id.as_deref()),
            _ => None,
        }
    }

    /// Name of the first bookmark inside a paragraph
    pub fn bookmark_name(&self, id: NodeId) -> Option<&str> {
        self.children(id).iter().find_map(|&child| match self.kind(child) {
            NodeKind::Bookmark { name } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Pre-order traversal starting at `id`
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }
}

/// Pre-order iterator over a subtree, driven by an explicit stack
pub struct Descendants<'t> {
    tree: &'t DocumentTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.tree.children(id).iter().rev());
        Some(id)
    }
}
