//! Paragraph and list item indentation.
//!
//! Twips are widened to `i64` before any arithmetic; values come straight
//! from the XML.

use crate::dom::{DocumentTree, NodeId, NodeKind};
use crate::ooxml::{Indentation, NumberingLevel};

use super::event::Declarations;

const TWIPS_PER_POINT: f64 = 20.0;
const POINTS_PER_EM: f64 = 12.0;

/// Converts twips to a CSS length in ems
pub fn twips_to_em(twips: i64) -> String {
    format!("{:.2}em", twips as f64 / TWIPS_PER_POINT / POINTS_PER_EM)
}

fn twips(value: Option<i32>) -> i64 {
    value.map_or(0, i64::from)
}

/// Indentation set directly on a paragraph, ignoring its styles
fn local_indentation(tree: &DocumentTree, paragraph: NodeId) -> Indentation {
    match tree.kind(paragraph) {
        NodeKind::Paragraph(local) => local.indentation.clone().unwrap_or_default(),
        _ => Indentation::default(),
    }
}

fn level_indentation(level: &NumberingLevel) -> Indentation {
    level.paragraph_properties.indentation.clone().unwrap_or_default()
}

/// Indentation of a paragraph's own `span`.
///
/// Outside lists: left margin, first line indent and right margin. List
/// paragraphs keep the right margin plus the text indent left over from
/// their hanging indentation.
pub fn paragraph_indentation(tree: &DocumentTree, paragraph: NodeId) -> Declarations {
    let mut css = Declarations::new();
    let Some(props) = tree.paragraph_properties(paragraph) else {
        return css;
    };
    let indentation = props.indentation.clone().unwrap_or_default();

    if props.numbering.is_some() {
        if let Some((num_id, level)) = tree.numbering_level(paragraph) {
            let step = tree.numbering.indentation_step(num_id);
            let listing = list_indentation(tree, paragraph, level, step, None, true);
            if let Some(text_indent) = listing.get("text-indent").filter(|indent| *indent != "0.00em") {
                css.set("text-indent", text_indent.to_string());
                css.set("display", "inline-block");
            }
        }
    } else {
        if let Some(left) = indentation.left.filter(|&left| left != 0) {
            css.set("margin-left", twips_to_em(i64::from(left)));
        }
        if let Some(first_line) = indentation.first_line.filter(|&first_line| first_line != 0) {
            css.set("text-indent", twips_to_em(i64::from(first_line)));
            css.set("display", "inline-block");
        }
    }
    if let Some(right) = indentation.right.filter(|&right| right != 0) {
        css.set("margin-right", twips_to_em(i64::from(right)));
    }
    css
}

/// Margin of a list item relative to the default `li` indent.
///
/// `paragraph` is the first paragraph of the item, `level` the level of its
/// list and `step` the left indent added per level. `owner` is the first
/// paragraph of the enclosing item when the list is nested; its indentation
/// is already applied by the outer `li`. With `include_text_indent` the
/// hanging indentation beyond the level's own is returned as `text-indent`.
pub fn list_indentation(
    tree: &DocumentTree,
    paragraph: NodeId,
    level: &NumberingLevel,
    step: i64,
    owner: Option<NodeId>,
    include_text_indent: bool,
) -> Declarations {
    let mut css = Declarations::new();
    let is_list_paragraph = tree
        .paragraph_properties(paragraph)
        .is_some_and(|props| props.numbering.is_some());
    if !is_list_paragraph {
        return css;
    }

    let level_ind = level_indentation(level);
    let local = local_indentation(tree, paragraph);
    let level_left = twips(level_ind.left);
    let level_hanging = twips(level_ind.hanging);

    let non_zero_or = |value: i64, fallback: i64| if value != 0 { value } else { fallback };
    let left = non_zero_or(twips(local.left), level_left);
    let mut hanging = non_zero_or(twips(local.hanging), level_hanging);
    if left == 0 && hanging == 0 {
        return css;
    }

    let mut margin_left = left - hanging;
    if step > level_hanging {
        margin_left -= step - level_hanging;
    } else {
        margin_left -= step;
    }
    margin_left += twips(local.first_line);

    if let Some(owner) = owner {
        let owner_local = local_indentation(tree, owner);
        let owner_level = tree
            .numbering_level(owner)
            .map(|(_, level)| level_indentation(level))
            .unwrap_or_default();
        let side = |local: Option<i32>, level: Option<i32>| twips(local.or(level));
        margin_left -= side(owner_local.left, owner_level.left);
        margin_left -= side(owner_local.first_line, owner_level.first_line);
    }

    hanging = (hanging - level_hanging).max(0);
    if margin_left != 0 {
        css.set("margin-left", twips_to_em(margin_left));
    }
    if include_text_indent {
        css.set("text-indent", twips_to_em(hanging));
    }
    css
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::{NumberingDefinition, NumberingProperties, ParagraphProperties};

    fn indentation(left: Option<i32>, hanging: Option<i32>, first_line: Option<i32>) -> Option<Indentation> {
        Some(Indentation {
            left,
            hanging,
            first_line,
            right: None,
        })
    }

    fn level(level_id: &str, left: i32, hanging: i32) -> NumberingLevel {
        NumberingLevel {
            level_id: level_id.to_string(),
            num_format: Some("decimal".to_string()),
            paragraph_properties: ParagraphProperties {
                indentation: indentation(Some(left), Some(hanging), None),
                ..Default::default()
            },
        }
    }

    fn list_tree() -> DocumentTree {
        let mut tree = DocumentTree::default();
        let definition = NumberingDefinition {
            levels: [level("0", 720, 360), level("1", 1440, 360)]
                .into_iter()
                .map(|level| (level.level_id.clone(), level))
                .collect(),
        };
        tree.numbering.insert("1", definition);
        tree
    }

    fn list_paragraph(tree: &mut DocumentTree, level: &str, indentation: Option<Indentation>) -> NodeId {
        let root = tree.root();
        tree.append(
            root,
            NodeKind::Paragraph(ParagraphProperties {
                numbering: Some(NumberingProperties {
                    num_id: Some("1".to_string()),
                    level_id: Some(level.to_string()),
                }),
                indentation,
                ..Default::default()
            }),
        )
    }

    #[test]
    fn test_twips_to_em() {
        assert_eq!(twips_to_em(720), "3.00em");
        assert_eq!(twips_to_em(-60), "-0.25em");
        assert_eq!(twips_to_em(i64::from(i32::MIN)), "-8947848.53em");
    }

    #[test]
    fn test_paragraph_indentation_ignores_hanging() {
        let mut tree = DocumentTree::default();
        let root = tree.root();
        let p = tree.append(
            root,
            NodeKind::Paragraph(ParagraphProperties {
                indentation: Some(Indentation {
                    left: Some(720),
                    right: Some(240),
                    first_line: None,
                    hanging: Some(i32::MIN),
                }),
                ..Default::default()
            }),
        );
        assert_eq!(
            paragraph_indentation(&tree, p).to_string(),
            "margin-left:3.00em;margin-right:1.00em"
        );
    }

    #[test]
    fn test_level_indentation_gives_no_margin() {
        let mut tree = list_tree();
        let p = list_paragraph(&mut tree, "0", None);
        let level = level("0", 720, 360);
        assert!(list_indentation(&tree, p, &level, 720, None, false).is_empty());
        assert_eq!(
            list_indentation(&tree, p, &level, 720, None, true).to_string(),
            "text-indent:0.00em"
        );
        assert!(paragraph_indentation(&tree, p).is_empty());
    }

    #[test]
    fn test_extra_indentation_moves_item() {
        let mut tree = list_tree();
        let p = list_paragraph(&mut tree, "0", indentation(Some(1440), Some(720), None));
        let level = level("0", 720, 360);
        assert_eq!(
            list_indentation(&tree, p, &level, 720, None, true).to_string(),
            "margin-left:1.50em;text-indent:1.50em"
        );
        assert_eq!(
            paragraph_indentation(&tree, p).to_string(),
            "display:inline-block;text-indent:1.50em"
        );
    }

    #[test]
    fn test_first_line_adds_to_margin() {
        let mut tree = list_tree();
        let p = list_paragraph(&mut tree, "0", indentation(None, None, Some(240)));
        let level = level("0", 720, 360);
        assert_eq!(
            list_indentation(&tree, p, &level, 720, None, false).to_string(),
            "margin-left:1.00em"
        );
    }

    #[test]
    fn test_nested_item_subtracts_owner_indentation() {
        let mut tree = list_tree();
        let owner = list_paragraph(&mut tree, "0", None);
        let indented_owner = list_paragraph(&mut tree, "0", indentation(None, None, Some(240)));
        let plain = list_paragraph(&mut tree, "1", None);
        let moved = list_paragraph(&mut tree, "1", indentation(Some(2160), None, None));
        let level = level("1", 1440, 360);
        assert_eq!(
            list_indentation(&tree, plain, &level, 720, None, false).to_string(),
            "margin-left:3.00em"
        );
        assert!(list_indentation(&tree, plain, &level, 720, Some(owner), false).is_empty());
        assert_eq!(
            list_indentation(&tree, moved, &level, 720, Some(owner), false).to_string(),
            "margin-left:3.00em"
        );
        assert_eq!(
            list_indentation(&tree, plain, &level, 720, Some(indented_owner), false).to_string(),
            "margin-left:-1.00em"
        );
    }

    #[test]
    fn test_extreme_values_do_not_overflow() {
        let mut tree = list_tree();
        let p = list_paragraph(&mut tree, "0", indentation(Some(i32::MIN), Some(i32::MAX), Some(i32::MIN)));
        let level = level("0", i32::MAX, i32::MIN);
        let css = list_indentation(&tree, p, &level, i64::from(i32::MAX), None, true);
        assert!(css.get("margin-left").is_some());
    }

    #[test]
    fn test_non_list_paragraph_has_no_list_indentation() {
        let mut tree = DocumentTree::default();
        let root = tree.root();
        let p = tree.append(root, NodeKind::Paragraph(ParagraphProperties::default()));
        assert!(list_indentation(&tree, p, &level("0", 720, 360), 720, None, true).is_empty());
    }
}
