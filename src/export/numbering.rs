//! Regrouping of flat sibling sequences into nested lists.
//!
//! WordprocessingML has no list container: every list paragraph carries a
//! list id and an indent level. [`NumberingSpanBuilder`] rebuilds the nesting
//! from those references while scanning siblings in order, and yields each
//! top-level group as soon as it is complete.

use std::collections::{HashMap, VecDeque};

use log::trace;

use crate::dom::{DocumentTree, NodeId};

/// A sibling after regrouping
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// An original node, unchanged
    Node(NodeId),
    /// A synthetic list
    Span(NumberingSpan),
}

/// A list: consecutive items sharing one list id and level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingSpan {
    pub num_id: String,
    pub level: u32,
    /// Whether the level uses bullets rather than numbers
    pub bullet: bool,
    /// Number format of the level, e.g. `decimal` or `lowerLetter`
    pub format: String,
    pub items: Vec<NumberingItem>,
}

/// One list entry: the list paragraph, its continuation content and any
/// nested lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberingItem {
    pub children: Vec<Block>,
}

#[derive(Debug, Clone)]
struct ListInfo<'t> {
    num_id: &'t str,
    level: u32,
    bullet: bool,
    format: &'t str,
}

/// Lazily regroups `siblings` into [`Block`]s
pub struct NumberingSpanBuilder<'t> {
    tree: &'t DocumentTree,
    siblings: &'t [NodeId],
    position: usize,
    /// Index of the last list item of each list id
    last_index: HashMap<&'t str, usize>,
    stack: Vec<NumberingSpan>,
    ready: VecDeque<Block>,
}

impl<'t> NumberingSpanBuilder<'t> {
    pub fn new(tree: &'t DocumentTree, siblings: &'t [NodeId]) -> Self {
        let mut last_index = HashMap::new();
        for (i, &node) in siblings.iter().enumerate() {
            if let Some(info) = list_info(tree, node) {
                last_index.insert(info.num_id, i);
            }
        }
        NumberingSpanBuilder {
            tree,
            siblings,
            position: 0,
            last_index,
            stack: Vec::new(),
            ready: VecDeque::new(),
        }
    }

    fn step(&mut self, i: usize) {
        let node = self.siblings[i];
        let Some(info) = list_info(self.tree, node) else {
            if self.stack.is_empty() {
                self.ready.push_back(Block::Node(node));
                return;
            }
            self.close_finished(i);
            if self.recurs_later(i) {
                trace!("Attaching {:?} to the open list item", node);
                self.attach(Block::Node(node));
            } else {
                self.close_all();
                self.ready.push_back(Block::Node(node));
            }
            return;
        };

        if self.stack.is_empty() {
            self.open(&info, node);
            return;
        }

        match self.stack.iter().rposition(|span| span.num_id == info.num_id) {
            Some(position) => {
                while self.stack.len() > position + 1 {
                    self.close_top();
                }
                if info.level > self.top_level() {
                    self.open(&info, node);
                    return;
                }
                while self.stack.len() >= 2
                    && self.top_level() > info.level
                    && self.stack[self.stack.len() - 2].num_id == info.num_id
                {
                    self.close_top();
                }
                if self.stack.len() == 1 && self.top_level() > info.level {
                    self.close_all();
                    self.open(&info, node);
                } else {
                    self.push_item(node);
                }
            }
            None => {
                self.close_finished(i);
                if !self.recurs_later(i) {
                    self.close_all();
                }
                self.open(&info, node);
            }
        }
    }

    fn top_level(&self) -> u32 {
        self.stack.last().map(|span| span.level).unwrap_or(0)
    }

    /// Whether any open list has items after position `i`
    fn recurs_later(&self, i: usize) -> bool {
        self.stack
            .iter()
            .any(|span| self.last_index.get(span.num_id.as_str()).is_some_and(|&last| last > i))
    }

    /// Closes nested lists that have no items after position `i`
    fn close_finished(&mut self, i: usize) {
        while self.stack.len() > 1 {
            let finished = self
                .stack
                .last()
                .and_then(|span| self.last_index.get(span.num_id.as_str()))
                .map_or(true, |&last| last <= i);
            if !finished {
                break;
            }
            self.close_top();
        }
    }

    /// Opens a span holding `node` as its first item, nested inside the
    /// current item when a span is open
    fn open(&mut self, info: &ListInfo, node: NodeId) {
        self.stack.push(NumberingSpan {
            num_id: info.num_id.to_string(),
            level: info.level,
            bullet: info.bullet,
            format: info.format.to_string(),
            items: vec![NumberingItem {
                children: vec![Block::Node(node)],
            }],
        });
    }

    fn push_item(&mut self, node: NodeId) {
        if let Some(span) = self.stack.last_mut() {
            span.items.push(NumberingItem {
                children: vec![Block::Node(node)],
            });
        }
    }

    fn attach(&mut self, block: Block) {
        if let Some(item) = self.stack.last_mut().and_then(|span| span.items.last_mut()) {
            item.children.push(block);
        }
    }

    fn close_top(&mut self) {
        let Some(span) = self.stack.pop() else {
            return;
        };
        if self.stack.is_empty() {
            self.ready.push_back(Block::Span(span));
        } else {
            self.attach(Block::Span(span));
        }
    }

    fn close_all(&mut self) {
        while !self.stack.is_empty() {
            self.close_top();
        }
    }
}

impl Iterator for NumberingSpanBuilder<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        loop {
            if let Some(block) = self.ready.pop_front() {
                return Some(block);
            }
            if self.position >= self.siblings.len() {
                self.close_all();
                return self.ready.pop_front();
            }
            let i = self.position;
            self.position += 1;
            self.step(i);
        }
    }
}

fn list_info(tree: &DocumentTree, node: NodeId) -> Option<ListInfo<'_>> {
    let (num_id, level) = tree.numbering_level(node)?;
    Some(ListInfo {
        num_id,
        level: level.level_id.trim().parse().ok()?,
        bullet: level.is_bullet(),
        format: level.format(),
    })
}

/// Regroups `siblings` into list structures
pub fn regroup<'t>(tree: &'t DocumentTree, siblings: &'t [NodeId]) -> NumberingSpanBuilder<'t> {
    NumberingSpanBuilder::new(tree, siblings)
}
