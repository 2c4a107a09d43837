//! Complex field resolution and field instruction parsing.
//!
//! A complex field is spread over runs: `begin`, instruction text, an
//! optional `separate`, the visible result and `end`. The runs captured by
//! the discovery pass are collapsed into `SimpleField` nodes so that the
//! render pass only ever sees simple fields.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::{DocumentTree, FieldCharKind, NodeId, NodeKind};

static INSTRUCTION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]*)"|(\S+)"#).expect("valid field instruction pattern"));

/// A field being assembled from captured runs
#[derive(Debug, Default)]
struct PendingField {
    instr: String,
    runs: Vec<NodeId>,
}

impl PendingField {
    fn continuing(instr: &str) -> Self {
        PendingField {
            instr: instr.to_string(),
            runs: Vec::new(),
        }
    }
}

/// Rewrites the captured complex field runs into `SimpleField` nodes.
///
/// Each field replaces the first of its visible runs in that run's parent;
/// the marker and instruction runs are removed. Returns the number of
/// fields spliced into the tree.
pub fn resolve_complex_fields(tree: &mut DocumentTree, runs: &[NodeId]) -> usize {
    let mut fields = Vec::new();
    let mut removed = HashSet::new();
    let mut field: Option<PendingField> = None;
    let mut separate_seen = false;
    let mut previous_run: Option<NodeId> = None;

    for &run in runs {
        if let (Some(open), Some(previous)) = (field.as_ref(), previous_run) {
            if tree.parent(previous) != tree.parent(run) {
                trace!("Field scope changed at run {:?}", run);
                let fresh = PendingField::continuing(&open.instr);
                fields.extend(field.replace(fresh));
            }
        }

        for &child in tree.children(run) {
            match tree.kind(child) {
                NodeKind::FieldChar(kind) => {
                    separate_seen = false;
                    removed.insert(run);
                    match kind {
                        FieldCharKind::Begin => field = Some(PendingField::default()),
                        FieldCharKind::Separate => separate_seen = true,
                        FieldCharKind::End => fields.extend(field.take()),
                    }
                }
                _ if field.is_none() => {}
                _ if separate_seen => {
                    if let Some(open) = field.as_mut() {
                        if open.runs.last() != Some(&run) {
                            open.runs.push(run);
                        }
                    }
                    removed.insert(run);
                }
                NodeKind::FieldCode(code) => {
                    if let Some(open) = field.as_mut() {
                        open.instr.push_str(code);
                    }
                    removed.insert(run);
                }
                _ => {}
            }
        }
        previous_run = Some(run);
    }

    let fields: Vec<PendingField> = fields.into_iter().filter(|f| !f.runs.is_empty()).collect();

    let mut affected_parents = Vec::new();
    for &run in removed.iter().chain(fields.iter().map(|f| &f.runs[0])) {
        if let Some(parent) = tree.parent(run) {
            if !affected_parents.contains(&parent) {
                affected_parents.push(parent);
            }
        }
    }

    let mut replacements = HashMap::new();
    let mut field_nodes = Vec::with_capacity(fields.len());
    for pending in fields {
        let node = tree.create_detached(NodeKind::SimpleField {
            instr: pending.instr.trim().to_string(),
        });
        replacements.insert(pending.runs[0], node);
        field_nodes.push((node, pending.runs));
    }

    for parent in affected_parents {
        let children = tree
            .children(parent)
            .iter()
            .filter_map(|child| match replacements.get(child) {
                Some(&field) => Some(field),
                None if removed.contains(child) => None,
                None => Some(*child),
            })
            .collect();
        tree.replace_children(parent, children);
    }

    let count = field_nodes.len();
    for (node, runs) in field_nodes {
        tree.replace_children(node, runs);
    }
    debug!("Resolved {} complex fields", count);
    count
}

/// A parsed field instruction such as `HYPERLINK "http://x" \l "top"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInstruction {
    /// Upper-cased field type
    pub field_type: String,
    pub args: Vec<String>,
}

impl FieldInstruction {
    /// Splits an instruction into its type and arguments; quoted arguments
    /// may contain spaces
    pub fn parse(instr: &str) -> Option<Self> {
        let mut tokens = INSTRUCTION_TOKEN.captures_iter(instr).filter_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .map(|token| token.as_str().to_string())
        });
        let field_type = tokens.next()?.to_uppercase();
        Some(FieldInstruction {
            field_type,
            args: tokens.collect(),
        })
    }

    pub fn is_hyperlink(&self) -> bool {
        self.field_type == "HYPERLINK"
    }

    /// Link target of a `HYPERLINK` instruction; a `\l` switch adds a
    /// bookmark fragment
    pub fn hyperlink_target(&self) -> Option<String> {
        if !self.is_hyperlink() {
            return None;
        }
        let mut target = None;
        let mut bookmark = None;
        let mut args = self.args.iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "\\l" => bookmark = args.next(),
                "\\o" | "\\t" => {
                    args.next();
                }
                switch if switch.starts_with('\\') => {}
                _ if target.is_none() => target = Some(arg),
                _ => {}
            }
        }
        match (target, bookmark) {
            (Some(target), Some(bookmark)) => Some(format!("{}#{}", target, bookmark)),
            (Some(target), None) => Some(target.clone()),
            (None, Some(bookmark)) => Some(format!("#{}", bookmark)),
            (None, None) => None,
        }
    }
}
