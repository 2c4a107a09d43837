use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================
// Package types
// ============================================

/// Relationship type constants (ECMA-376)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    /// Main document relationship
    OfficeDocument,
    /// Styles relationship
    Styles,
    /// Numbering definitions relationship
    Numbering,
    /// Footnotes relationship
    Footnotes,
    /// Image relationship
    Image,
    /// Hyperlink relationship
    Hyperlink,
    /// Unknown relationship type
    Unknown(String),
}

impl RelationshipType {
    /// Parse relationship type string into enum
    pub fn from_string(s: &str) -> Self {
        match s.rsplit('/').next().unwrap_or(s) {
            "officeDocument" => RelationshipType::OfficeDocument,
            "styles" => RelationshipType::Styles,
            "numbering" => RelationshipType::Numbering,
            "footnotes" => RelationshipType::Footnotes,
            "image" => RelationshipType::Image,
            "hyperlink" => RelationshipType::Hyperlink,
            _ => RelationshipType::Unknown(s.to_string()),
        }
    }
}

/// Represents a relationship between parts in the package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Type of relationship
    pub relationship_type: RelationshipType,
    /// Target URI (can be relative or absolute)
    pub target: String,
    /// Target mode (Internal or External)
    pub target_mode: Option<String>,
}

impl Relationship {
    pub fn new(id: &str, relationship_type: RelationshipType, target: &str) -> Self {
        Relationship {
            id: id.to_string(),
            relationship_type,
            target: target.to_string(),
            target_mode: None,
        }
    }

    pub fn external(mut self) -> Self {
        self.target_mode = Some("External".to_string());
        self
    }

    pub fn is_external(&self) -> bool {
        self.target_mode.as_deref() == Some("External")
    }
}

/// A part in the OPC package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagePart {
    /// Part name without the leading slash (e.g., "word/document.xml")
    pub name: String,
    /// Raw binary data of the part
    pub data: Vec<u8>,
}

// ============================================
// Paragraph and run properties
// ============================================

/// Paragraph indentation, in twips (1/20 of a point)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Indentation {
    pub left: Option<i32>,
    pub right: Option<i32>,
    pub first_line: Option<i32>,
    pub hanging: Option<i32>,
}

impl Indentation {
    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none() && self.first_line.is_none() && self.hanging.is_none()
    }

    /// Each side set in `overrides` replaces ours; the others are inherited
    pub fn merged_with(&self, overrides: &Indentation) -> Indentation {
        Indentation {
            left: overrides.left.or(self.left),
            right: overrides.right.or(self.right),
            first_line: overrides.first_line.or(self.first_line),
            hanging: overrides.hanging.or(self.hanging),
        }
    }
}

/// Numbering reference of a paragraph (`w:numPr`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingProperties {
    /// Numbering instance id (`w:numId`)
    pub num_id: Option<String>,
    /// Indent level (`w:ilvl`)
    pub level_id: Option<String>,
}

static BORDER_CSS_STYLES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("none", "none"),
        ("single", "solid"),
        ("double", "double"),
        ("triple", "double"),
        ("dotted", "dotted"),
        ("dashed", "dashed"),
        ("dashSmallGap", "dashed"),
        ("dotDash", "dashed"),
        ("dotDotDash", "dashed"),
        ("outset", "outset"),
    ])
});

/// A single border edge (`w:top`, `w:bdr`, ...)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Border {
    /// Border style keyword (`w:val`)
    pub style: Option<String>,
    /// Width in eighths of a point (`w:sz`)
    pub width: Option<u32>,
    /// Hex color or `auto`
    pub color: Option<String>,
    /// Spacing to the content, in points (`w:space`)
    pub space: Option<u32>,
    /// Shadow flag
    pub shadow: bool,
}

impl Border {
    /// CSS border-style keyword for this border
    pub fn css_style(&self) -> &'static str {
        self.style
            .as_deref()
            .and_then(|style| BORDER_CSS_STYLES.get(style).copied())
            .unwrap_or("solid")
    }

    /// Border width in tenths of a point, rounded to the nearest tenth.
    ///
    /// Double and triple borders are rendered as a CSS double border, so their
    /// width is widened to keep the lines visible.
    pub fn width_tenths(&self) -> u32 {
        let Some(eighths) = self.width else {
            return 10;
        };
        let factor: u64 = match self.style.as_deref() {
            Some("double") => 3,
            Some("triple") => 5,
            _ => 1,
        };
        let tenths = u64::from(eighths).saturating_mul(factor * 20).saturating_add(8) / 16;
        u32::try_from(tenths).unwrap_or(u32::MAX)
    }

    /// Border width formatted in points, without a trailing `.0`
    pub fn width_points(&self) -> String {
        let tenths = self.width_tenths();
        if tenths % 10 == 0 {
            format!("{}", tenths / 10)
        } else {
            format!("{}.{}", tenths / 10, tenths % 10)
        }
    }

    /// Resolved hex color, `auto` meaning black
    pub fn color(&self) -> &str {
        match self.color.as_deref() {
            None | Some("auto") => "000000",
            Some(color) => color,
        }
    }

    pub fn spacing(&self) -> u32 {
        self.space.unwrap_or(0)
    }
}

impl PartialEq for Border {
    fn eq(&self, other: &Self) -> bool {
        self.css_style() == other.css_style()
            && self.width_tenths() == other.width_tenths()
            && self.color() == other.color()
            && self.spacing() == other.spacing()
            && self.shadow == other.shadow
    }
}

/// Paragraph borders (`w:pBdr`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphBorders {
    pub top: Option<Border>,
    pub left: Option<Border>,
    pub bottom: Option<Border>,
    pub right: Option<Border>,
    pub between: Option<Border>,
}

impl ParagraphBorders {
    /// Edges in CSS order: top, right, bottom, left
    pub fn sides(&self) -> [(&'static str, Option<&Border>); 4] {
        [
            ("top", self.top.as_ref()),
            ("right", self.right.as_ref()),
            ("bottom", self.bottom.as_ref()),
            ("left", self.left.as_ref()),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.sides().iter().all(|(_, border)| border.is_none()) && self.between.is_none()
    }

    /// True when all four edges are present and share color, style and width
    pub fn is_uniform(&self) -> bool {
        let sides = self.sides();
        if sides.iter().all(|(_, border)| border.is_none()) {
            return false;
        }
        let Some(first) = sides[0].1 else {
            return false;
        };
        sides.iter().all(|(_, border)| match border {
            Some(border) => {
                border.color() == first.color()
                    && border.css_style() == first.css_style()
                    && border.width_tenths() == first.width_tenths()
            }
            None => false,
        })
    }
}

/// Shading (`w:shd`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shading {
    /// Pattern (`w:val`), e.g. `clear` or `solid`
    pub pattern: Option<String>,
    /// Pattern color
    pub color: Option<String>,
    /// Fill color
    pub fill: Option<String>,
}

impl Shading {
    /// Background color implied by the shading, if any
    pub fn background_color(&self) -> Option<&str> {
        let color = self.color.as_deref();
        let fill = self.fill.as_deref();
        if self.pattern.as_deref() == Some("solid") {
            if let Some(color) = color {
                return Some(if color == "auto" { "000000" } else { color });
            }
        }
        match (fill, color) {
            (Some(fill), _) if fill != "auto" => Some(fill),
            (_, Some(color)) if color != "auto" => Some(color),
            _ => None,
        }
    }
}

/// Properties of a paragraph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphProperties {
    /// Paragraph style id (`w:pStyle`)
    pub style_id: Option<String>,
    /// Justification (`left`, `center`, `right`, `both`, ...)
    pub justification: Option<String>,
    pub indentation: Option<Indentation>,
    pub numbering: Option<NumberingProperties>,
    pub borders: Option<ParagraphBorders>,
    pub shading: Option<Shading>,
}

impl ParagraphProperties {
    /// Returns these properties with every value set in `overrides` replacing ours
    pub fn merged_with(&self, overrides: &ParagraphProperties) -> ParagraphProperties {
        ParagraphProperties {
            style_id: overrides.style_id.clone().or_else(|| self.style_id.clone()),
            justification: overrides.justification.clone().or_else(|| self.justification.clone()),
            indentation: match (&self.indentation, &overrides.indentation) {
                (Some(inherited), Some(local)) => Some(inherited.merged_with(local)),
                (inherited, local) => local.clone().or_else(|| inherited.clone()),
            },
            numbering: overrides.numbering.clone().or_else(|| self.numbering.clone()),
            borders: overrides.borders.clone().or_else(|| self.borders.clone()),
            shading: overrides.shading.clone().or_else(|| self.shading.clone()),
        }
    }
}

/// Properties of a run (text formatting)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunProperties {
    /// Character style id (`w:rStyle`)
    pub style_id: Option<String>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    /// Underline type; `none` disables underlining
    pub underline: Option<String>,
    pub caps: Option<bool>,
    pub small_caps: Option<bool>,
    pub strike: Option<bool>,
    pub dstrike: Option<bool>,
    pub vanish: Option<bool>,
    /// Hidden in web view (`w:webHidden`)
    pub hidden: Option<bool>,
    /// `superscript`, `subscript` or `baseline`
    pub vertical_align: Option<String>,
    pub border: Option<Border>,
    pub shading: Option<Shading>,
}

impl RunProperties {
    /// Returns these properties with every value set in `overrides` replacing ours
    pub fn merged_with(&self, overrides: &RunProperties) -> RunProperties {
        RunProperties {
            style_id: overrides.style_id.clone().or_else(|| self.style_id.clone()),
            bold: overrides.bold.or(self.bold),
            italic: overrides.italic.or(self.italic),
            underline: overrides.underline.clone().or_else(|| self.underline.clone()),
            caps: overrides.caps.or(self.caps),
            small_caps: overrides.small_caps.or(self.small_caps),
            strike: overrides.strike.or(self.strike),
            dstrike: overrides.dstrike.or(self.dstrike),
            vanish: overrides.vanish.or(self.vanish),
            hidden: overrides.hidden.or(self.hidden),
            vertical_align: overrides.vertical_align.clone().or_else(|| self.vertical_align.clone()),
            border: overrides.border.clone().or_else(|| self.border.clone()),
            shading: overrides.shading.clone().or_else(|| self.shading.clone()),
        }
    }

    pub fn is_underlined(&self) -> bool {
        matches!(self.underline.as_deref(), Some(kind) if kind != "none")
    }
}

// ============================================
// Table types
// ============================================

/// Vertical merge marker of a table cell (`w:vMerge`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalMerge {
    /// Starts a merged region
    Restart,
    /// Continues the merged region of the cell above
    Continue,
}

/// Properties of a table cell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCellProperties {
    /// Number of grid columns spanned (`w:gridSpan`)
    pub grid_span: Option<u32>,
    pub vertical_merge: Option<VerticalMerge>,
    pub shading: Option<Shading>,
}

impl TableCellProperties {
    /// Cell background, with `auto` and white suppressed
    pub fn background_color(&self) -> Option<&str> {
        let fill = self.shading.as_ref()?.fill.as_deref()?;
        if fill.eq_ignore_ascii_case("auto") || fill.eq_ignore_ascii_case("FFFFFF") {
            return None;
        }
        Some(fill)
    }
}

// ============================================
// Style types
// ============================================

/// Kind of a style definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleType {
    Paragraph,
    Character,
    Table,
    Numbering,
}

impl StyleType {
    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "paragraph" => Some(StyleType::Paragraph),
            "character" => Some(StyleType::Character),
            "table" => Some(StyleType::Table),
            "numbering" => Some(StyleType::Numbering),
            _ => None,
        }
    }
}

/// Represents a style definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    /// Style ID (e.g., "Normal", "Heading1")
    pub id: String,
    /// Style name (e.g., "Normal", "heading 1")
    pub name: Option<String>,
    pub style_type: StyleType,
    /// Style ID of the parent style
    pub based_on: Option<String>,
    /// Whether this is the default style of its type
    pub is_default: bool,
    pub paragraph_properties: ParagraphProperties,
    pub run_properties: RunProperties,
}

impl Style {
    pub fn is_heading(&self) -> bool {
        self.name
            .as_deref()
            .map(|name| name.to_lowercase().starts_with("heading"))
            .unwrap_or(false)
    }
}

// ============================================
// Numbering types
// ============================================

/// A list level within a numbering definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberingLevel {
    /// Level id (`w:ilvl`)
    pub level_id: String,
    /// Number format (bullet, decimal, lowerLetter, ...)
    pub num_format: Option<String>,
    /// Paragraph properties for this level
    pub paragraph_properties: ParagraphProperties,
}

impl NumberingLevel {
    pub fn is_bullet(&self) -> bool {
        self.num_format.as_deref() == Some("bullet")
    }

    /// Format used for the list style class
    pub fn format(&self) -> &str {
        self.num_format.as_deref().unwrap_or("decimal")
    }
}

/// Numbering definition referenced by a `w:numId`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberingDefinition {
    pub levels: HashMap<String, NumberingLevel>,
}

impl NumberingDefinition {
    /// Left indent added per level, in twips: level 1 minus level 0, or 0
    /// when either is missing
    pub fn indentation_step(&self) -> i64 {
        let left = |level_id: &str| {
            self.levels
                .get(level_id)
                .and_then(|level| level.paragraph_properties.indentation.as_ref())
                .and_then(|indentation| indentation.left)
                .map(i64::from)
        };
        match (left("0"), left("1")) {
            (Some(first), Some(second)) => second - first,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn border(style: &str, width: Option<u32>) -> Border {
        Border {
            style: Some(style.to_string()),
            width,
            ..Default::default()
        }
    }

    #[test]
    fn test_relationship_type_parsing() {
        let rt = RelationshipType::from_string(
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles",
        );
        assert_eq!(rt, RelationshipType::Styles);
        let rt = RelationshipType::from_string("unknown/type");
        assert_eq!(rt, RelationshipType::Unknown("unknown/type".to_string()));
    }

    #[test]
    fn test_border_width() {
        assert_eq!(border("single", None).width_points(), "1");
        assert_eq!(border("single", Some(5)).width_points(), "0.6");
        assert_eq!(border("single", Some(8)).width_points(), "1");
        assert_eq!(border("double", Some(4)).width_points(), "1.5");
        assert_eq!(border("triple", Some(4)).width_points(), "2.5");
    }

    #[test]
    fn test_huge_border_width_does_not_overflow() {
        assert_eq!(border("triple", Some(300_000_000)).width_tenths(), 1_875_000_000);
        assert_eq!(border("triple", Some(u32::MAX)).width_tenths(), u32::MAX);
    }

    #[test]
    fn test_indentation_merges_each_side() {
        let inherited = ParagraphProperties {
            indentation: Some(Indentation {
                left: Some(720),
                hanging: Some(120),
                ..Default::default()
            }),
            ..Default::default()
        };
        let local = ParagraphProperties {
            indentation: Some(Indentation {
                first_line: Some(360),
                hanging: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = inherited.merged_with(&local).indentation.unwrap();
        assert_eq!(merged.left, Some(720));
        assert_eq!(merged.first_line, Some(360));
        assert_eq!(merged.hanging, Some(0));
        assert_eq!(merged.right, None);

        let merged = ParagraphProperties::default().merged_with(&local);
        assert_eq!(merged.indentation, local.indentation);
    }

    #[test]
    fn test_border_css_style() {
        assert_eq!(border("dotDotDash", None).css_style(), "dashed");
        assert_eq!(border("wave", None).css_style(), "solid");
        assert_eq!(border("none", None).css_style(), "none");
    }

    #[test]
    fn test_border_equality_uses_resolved_values() {
        let mut auto = border("single", Some(8));
        auto.color = Some("auto".to_string());
        let mut black = border("single", Some(8));
        black.color = Some("000000".to_string());
        assert_eq!(auto, black);
        black.space = Some(2);
        assert_ne!(auto, black);
    }

    #[test]
    fn test_uniform_borders() {
        let edge = Some(border("single", Some(4)));
        let mut borders = ParagraphBorders {
            top: edge.clone(),
            left: edge.clone(),
            bottom: edge.clone(),
            right: edge.clone(),
            between: None,
        };
        assert!(borders.is_uniform());
        borders.left = Some(border("dotted", Some(4)));
        assert!(!borders.is_uniform());
        borders.left = None;
        assert!(!borders.is_uniform());
        assert!(!ParagraphBorders::default().is_uniform());
    }

    #[test]
    fn test_shading_background_color() {
        let solid = Shading {
            pattern: Some("solid".into()),
            color: Some("auto".into()),
            fill: Some("FF0000".into()),
        };
        assert_eq!(solid.background_color(), Some("000000"));
        let clear = Shading {
            pattern: Some("clear".into()),
            color: Some("auto".into()),
            fill: Some("FF0000".into()),
        };
        assert_eq!(clear.background_color(), Some("FF0000"));
        let auto = Shading {
            pattern: Some("clear".into()),
            color: Some("auto".into()),
            fill: Some("auto".into()),
        };
        assert_eq!(auto.background_color(), None);
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let base = RunProperties {
            bold: Some(true),
            italic: Some(true),
            ..Default::default()
        };
        let local = RunProperties {
            bold: Some(false),
            ..Default::default()
        };
        let merged = base.merged_with(&local);
        assert_eq!(merged.bold, Some(false));
        assert_eq!(merged.italic, Some(true));
    }

    #[test]
    fn test_cell_background_suppresses_white() {
        let mut props = TableCellProperties {
            shading: Some(Shading {
                fill: Some("FFFFFF".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(props.background_color(), None);
        props.shading = Some(Shading {
            fill: Some("FF00FF".into()),
            ..Default::default()
        });
        assert_eq!(props.background_color(), Some("FF00FF"));
    }
}
