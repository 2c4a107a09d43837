//! # Style Resolution
//!
//! Reads the styles part and resolves the inheritance chain of a style:
//! - Document defaults (`w:docDefaults`)
//! - Named styles keyed by type and id, linked through `w:basedOn`
//! - Default style per style type

use std::collections::{HashMap, HashSet};

use log::trace;

use super::error::OoxmlError;
use super::types::{ParagraphProperties, RunProperties, Style, StyleType};
use super::xml::{attr, child, child_val, children, parse_paragraph_properties, parse_part, parse_run_properties};

/// Style definitions of a document
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    styles: HashMap<(StyleType, String), Style>,
    defaults: HashMap<StyleType, String>,
    /// Paragraph properties from `w:docDefaults`
    pub default_paragraph_properties: ParagraphProperties,
    /// Run properties from `w:docDefaults`
    pub default_run_properties: RunProperties,
}

impl StyleSheet {
    /// Parses a styles part
    pub fn parse(part: &str, xml: &str) -> Result<Self, OoxmlError> {
        let document = parse_part(part, xml)?;
        let root = document.root_element();
        let mut sheet = StyleSheet::default();

        if let Some(defaults) = child(root, "docDefaults") {
            if let Some(ppr) = child(defaults, "pPrDefault").and_then(|d| child(d, "pPr")) {
                sheet.default_paragraph_properties = parse_paragraph_properties(ppr);
            }
            if let Some(rpr) = child(defaults, "rPrDefault").and_then(|d| child(d, "rPr")) {
                sheet.default_run_properties = parse_run_properties(rpr);
            }
        }

        for node in children(root, "style") {
            let Some(style_type) = attr(node, "type").and_then(StyleType::from_string) else {
                continue;
            };
            let Some(id) = attr(node, "styleId") else {
                continue;
            };
            let style = Style {
                id: id.to_string(),
                name: child_val(node, "name").map(str::to_string),
                style_type,
                based_on: child_val(node, "basedOn").map(str::to_string),
                is_default: matches!(attr(node, "default"), Some("1" | "true" | "on")),
                paragraph_properties: child(node, "pPr").map(parse_paragraph_properties).unwrap_or_default(),
                run_properties: child(node, "rPr").map(parse_run_properties).unwrap_or_default(),
            };
            sheet.insert(style);
        }
        Ok(sheet)
    }

    pub fn insert(&mut self, style: Style) {
        if style.is_default {
            self.defaults.insert(style.style_type, style.id.clone());
        }
        self.styles.insert((style.style_type, style.id.clone()), style);
    }

    pub fn get(&self, style_type: StyleType, id: &str) -> Option<&Style> {
        self.styles.get(&(style_type, id.to_string()))
    }

    pub fn default_style(&self, style_type: StyleType) -> Option<&Style> {
        self.defaults.get(&style_type).and_then(|id| self.get(style_type, id))
    }

    /// The style followed by its ancestors, nearest first.
    ///
    /// The walk stops at a missing parent or at the first style seen twice.
    pub fn chain(&self, style_type: StyleType, id: &str) -> Vec<&Style> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(id);
        while let Some(current) = next {
            if !visited.insert(current) {
                trace!("Style inheritance loop at {}", current);
                break;
            }
            let Some(style) = self.get(style_type, current) else {
                break;
            };
            chain.push(style);
            next = style.based_on.as_deref();
        }
        chain
    }

    fn chain_or_default(&self, style_type: StyleType, id: Option<&str>) -> Vec<&Style> {
        match id {
            Some(id) => self.chain(style_type, id),
            None => self
                .default_style(style_type)
                .map(|style| self.chain(style_type, &style.id))
                .unwrap_or_default(),
        }
    }

    /// Paragraph and run properties contributed by a paragraph style chain,
    /// ancestors applied first
    pub fn paragraph_style_properties(&self, id: Option<&str>) -> (ParagraphProperties, RunProperties) {
        self.chain_or_default(StyleType::Paragraph, id)
            .iter()
            .rev()
            .fold(
                (ParagraphProperties::default(), RunProperties::default()),
                |(ppr, rpr), style| {
                    (
                        ppr.merged_with(&style.paragraph_properties),
                        rpr.merged_with(&style.run_properties),
                    )
                },
            )
    }

    /// Run properties contributed by a character style chain
    pub fn run_style_properties(&self, id: Option<&str>) -> RunProperties {
        self.chain_or_default(StyleType::Character, id)
            .iter()
            .rev()
            .fold(RunProperties::default(), |rpr, style| rpr.merged_with(&style.run_properties))
    }

    /// First style in the paragraph style chain whose name marks it as a heading
    pub fn heading_style(&self, id: Option<&str>) -> Option<&Style> {
        self.chain_or_default(StyleType::Paragraph, id)
            .into_iter()
            .find(|style| style.is_heading())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<styles>
        <docDefaults>
            <rPrDefault><rPr><caps/></rPr></rPrDefault>
        </docDefaults>
        <style type="paragraph" styleId="Normal" default="1">
            <name val="Normal"/>
        </style>
        <style type="paragraph" styleId="Heading1">
            <name val="heading 1"/>
            <basedOn val="Normal"/>
            <pPr><jc val="center"/></pPr>
            <rPr><b/></rPr>
        </style>
        <style type="paragraph" styleId="Custom">
            <name val="Custom"/>
            <basedOn val="Heading1"/>
            <rPr><b val="0"/><i/></rPr>
        </style>
        <style type="paragraph" styleId="LoopA"><basedOn val="LoopB"/></style>
        <style type="paragraph" styleId="LoopB"><basedOn val="LoopA"/></style>
        <style type="character" styleId="Strong"><rPr><b/></rPr></style>
    </styles>"#;

    fn sheet() -> StyleSheet {
        StyleSheet::parse("word/styles.xml", STYLES).unwrap()
    }

    #[test]
    fn test_chain_follows_based_on() {
        let sheet = sheet();
        let ids: Vec<&str> = sheet
            .chain(StyleType::Paragraph, "Custom")
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["Custom", "Heading1", "Normal"]);
    }

    #[test]
    fn test_chain_stops_on_loop() {
        let sheet = sheet();
        assert_eq!(sheet.chain(StyleType::Paragraph, "LoopA").len(), 2);
    }

    #[test]
    fn test_nearest_style_wins() {
        let sheet = sheet();
        let (ppr, rpr) = sheet.paragraph_style_properties(Some("Custom"));
        assert_eq!(ppr.justification.as_deref(), Some("center"));
        assert_eq!(rpr.bold, Some(false));
        assert_eq!(rpr.italic, Some(true));
    }

    #[test]
    fn test_heading_style_is_inherited() {
        let sheet = sheet();
        let heading = sheet.heading_style(Some("Custom")).unwrap();
        assert_eq!(heading.id, "Heading1");
        assert!(sheet.heading_style(None).is_none());
    }

    #[test]
    fn test_doc_defaults_and_character_styles() {
        let sheet = sheet();
        assert_eq!(sheet.default_run_properties.caps, Some(true));
        assert_eq!(sheet.run_style_properties(Some("Strong")).bold, Some(true));
        assert_eq!(sheet.run_style_properties(Some("Missing")), RunProperties::default());
        assert_eq!(sheet.default_style(StyleType::Paragraph).unwrap().id, "Normal");
    }
}
