//! Table grid computation for vertically merged cells.

use std::collections::HashMap;

use log::trace;

use crate::dom::{DocumentTree, NodeId, NodeKind};
use crate::ooxml::{TableCellProperties, VerticalMerge};

/// Row spans of the cells of one table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableGrid {
    row_spans: HashMap<NodeId, u32>,
}

impl TableGrid {
    /// Walks the rows of `table`, placing each cell at its grid column.
    ///
    /// A `restart` cell starts a merged region in its column; each
    /// `continue` cell below extends the region by one row.
    pub fn new(tree: &DocumentTree, table: NodeId) -> Self {
        let mut row_spans = HashMap::new();
        let mut regions: HashMap<usize, NodeId> = HashMap::new();

        for &row in tree.children(table) {
            if !matches!(tree.kind(row), NodeKind::TableRow) {
                continue;
            }
            let mut column = 0usize;
            for &cell in tree.children(row) {
                let NodeKind::TableCell(props) = tree.kind(cell) else {
                    continue;
                };
                match props.vertical_merge {
                    Some(VerticalMerge::Restart) => {
                        regions.insert(column, cell);
                        row_spans.insert(cell, 1);
                    }
                    Some(VerticalMerge::Continue) => match regions.get(&column) {
                        Some(start) => {
                            *row_spans.entry(*start).or_insert(1) += 1;
                        }
                        None => trace!("Merged cell {:?} has no region to continue", cell),
                    },
                    None => {
                        regions.remove(&column);
                    }
                }
                column += column_span(props) as usize;
            }
        }
        TableGrid { row_spans }
    }

    /// Number of rows the cell spans, 1 when not merged
    pub fn row_span(&self, cell: NodeId) -> u32 {
        self.row_spans.get(&cell).copied().unwrap_or(1)
    }
}

/// Number of grid columns a cell spans
pub fn column_span(props: &TableCellProperties) -> u32 {
    props.grid_span.unwrap_or(1).max(1)
}

/// Whether a cell continues a merged region and renders nothing
pub fn is_merge_continuation(props: &TableCellProperties) -> bool {
    props.vertical_merge == Some(VerticalMerge::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(merge: Option<VerticalMerge>, span: Option<u32>) -> NodeKind {
        NodeKind::TableCell(TableCellProperties {
            grid_span: span,
            vertical_merge: merge,
            shading: None,
        })
    }

    #[test]
    fn test_vertical_merge_row_span() {
        let mut tree = DocumentTree::default();
        let table = tree.append(tree.root(), NodeKind::Table);
        let rows: Vec<NodeId> = (0..3).map(|_| tree.append(table, NodeKind::TableRow)).collect();
        let top = tree.append(rows[0], cell(Some(VerticalMerge::Restart), None));
        let right = tree.append(rows[0], cell(None, None));
        let middle = tree.append(rows[1], cell(Some(VerticalMerge::Continue), None));
        tree.append(rows[1], cell(None, None));
        tree.append(rows[2], cell(Some(VerticalMerge::Continue), None));

        let grid = TableGrid::new(&tree, table);
        assert_eq!(grid.row_span(top), 3);
        assert_eq!(grid.row_span(right), 1);
        assert_eq!(grid.row_span(middle), 1);
    }

    #[test]
    fn test_merge_follows_grid_columns() {
        let mut tree = DocumentTree::default();
        let table = tree.append(tree.root(), NodeKind::Table);
        let first = tree.append(table, NodeKind::TableRow);
        let second = tree.append(table, NodeKind::TableRow);
        tree.append(first, cell(None, Some(2)));
        let merged = tree.append(first, cell(Some(VerticalMerge::Restart), None));
        tree.append(second, cell(None, None));
        tree.append(second, cell(None, None));
        tree.append(second, cell(Some(VerticalMerge::Continue), None));

        let grid = TableGrid::new(&tree, table);
        assert_eq!(grid.row_span(merged), 2);
    }

    #[test]
    fn test_unmerged_cell_ends_region() {
        let mut tree = DocumentTree::default();
        let table = tree.append(tree.root(), NodeKind::Table);
        let rows: Vec<NodeId> = (0..3).map(|_| tree.append(table, NodeKind::TableRow)).collect();
        let start = tree.append(rows[0], cell(Some(VerticalMerge::Restart), None));
        tree.append(rows[1], cell(None, None));
        tree.append(rows[2], cell(Some(VerticalMerge::Continue), None));

        assert_eq!(TableGrid::new(&tree, table).row_span(start), 1);
    }

    #[test]
    fn test_column_span_defaults() {
        assert_eq!(column_span(&TableCellProperties::default()), 1);
        let props = TableCellProperties {
            grid_span: Some(0),
            ..Default::default()
        };
        assert_eq!(column_span(&props), 1);
        assert!(!is_merge_continuation(&props));
    }
}
