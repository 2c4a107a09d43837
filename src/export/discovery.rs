//! Discovery pass: a traversal that produces no output and records what the
//! render pass needs to know up front.

use log::debug;

use crate::dom::{DocumentTree, FieldCharKind, NodeId, NodeKind};

/// Side table produced by [`discover`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryTable {
    /// Runs bracketed by field begin/end markers, in document order
    pub complex_field_runs: Vec<NodeId>,
    /// Referenced footnote ids, first reference first, without duplicates
    pub footnotes: Vec<String>,
}

impl DiscoveryTable {
    /// 1-based number of a referenced footnote
    pub fn footnote_number(&self, footnote_id: &str) -> Option<usize> {
        self.footnotes.iter().position(|id| id == footnote_id).map(|i| i + 1)
    }
}

struct Discovery<'t> {
    tree: &'t DocumentTree,
    table: DiscoveryTable,
    /// Runs of the field currently being captured
    captured: Option<Vec<NodeId>>,
}

impl Discovery<'_> {
    fn walk(&mut self, root: NodeId, track_footnotes: bool) {
        let tree = self.tree;
        for id in tree.descendants(root) {
            self.visit(id, track_footnotes);
        }
    }

    fn visit(&mut self, id: NodeId, track_footnotes: bool) {
        let tree = self.tree;
        match tree.kind(id) {
            NodeKind::Run(_) => {
                if let Some(captured) = self.captured.as_mut() {
                    captured.push(id);
                }
            }
            NodeKind::FieldChar(kind) => {
                let Some(run) = tree.parent(id).filter(|&p| tree.kind(p).is_run()) else {
                    return;
                };
                match kind {
                    FieldCharKind::Begin => self.captured = Some(vec![run]),
                    FieldCharKind::End => {
                        if let Some(captured) = self.captured.take() {
                            self.table.complex_field_runs.extend(captured);
                        }
                    }
                    FieldCharKind::Separate => {}
                }
            }
            NodeKind::FootnoteReference { id: footnote_id } if track_footnotes => {
                if tree.footnote(footnote_id).is_none() {
                    debug!("Footnote {} is referenced but not defined", footnote_id);
                } else if !self.table.footnotes.contains(footnote_id) {
                    self.table.footnotes.push(footnote_id.clone());
                }
            }
            _ => {}
        }
    }
}

/// Runs the discovery pass over the body and the referenced footnotes
pub fn discover(tree: &DocumentTree) -> DiscoveryTable {
    let mut discovery = Discovery {
        tree,
        table: DiscoveryTable::default(),
        captured: None,
    };
    if let Some(body) = tree.body() {
        discovery.walk(body, true);
    }
    let footnotes = discovery.table.footnotes.clone();
    for footnote_id in &footnotes {
        if let Some(node) = tree.footnote(footnote_id) {
            discovery.captured = None;
            discovery.walk(node, false);
        }
    }
    discovery.table
}
