//! Numbering definitions (`word/numbering.xml`).
//!
//! A `w:num` instance points at a `w:abstractNum` and may override some of
//! its levels. Lookups are by (num id, level id).

use std::collections::HashMap;

use log::debug;

use super::error::OoxmlError;
use super::types::{NumberingDefinition, NumberingLevel};
use super::xml::{attr, child, child_val, children, parse_paragraph_properties, parse_part};

/// All numbering instances of a document, with abstract levels resolved
#[derive(Debug, Clone, Default)]
pub struct NumberingDefinitions {
    definitions: HashMap<String, NumberingDefinition>,
}

fn parse_level(node: roxmltree::Node) -> Option<NumberingLevel> {
    Some(NumberingLevel {
        level_id: attr(node, "ilvl")?.to_string(),
        num_format: child_val(node, "numFmt").map(str::to_string),
        paragraph_properties: child(node, "pPr").map(parse_paragraph_properties).unwrap_or_default(),
    })
}

impl NumberingDefinitions {
    pub fn parse(part: &str, xml: &str) -> Result<Self, OoxmlError> {
        let document = parse_part(part, xml)?;
        let root = document.root_element();

        let abstract_levels: HashMap<&str, HashMap<String, NumberingLevel>> = children(root, "abstractNum")
            .filter_map(|node| {
                let id = attr(node, "abstractNumId")?;
                let levels = children(node, "lvl")
                    .filter_map(parse_level)
                    .map(|level| (level.level_id.clone(), level))
                    .collect();
                Some((id, levels))
            })
            .collect();

        let mut definitions = HashMap::new();
        for num in children(root, "num") {
            let Some(num_id) = attr(num, "numId") else {
                continue;
            };
            let Some(mut levels) = child_val(num, "abstractNumId")
                .and_then(|id| abstract_levels.get(id))
                .cloned()
            else {
                debug!("Numbering instance {} references a missing abstract definition", num_id);
                continue;
            };
            for level in children(num, "lvlOverride").filter_map(|o| child(o, "lvl")).filter_map(parse_level) {
                levels.insert(level.level_id.clone(), level);
            }
            definitions.insert(num_id.to_string(), NumberingDefinition { levels });
        }
        Ok(NumberingDefinitions { definitions })
    }

    pub fn insert(&mut self, num_id: &str, definition: NumberingDefinition) {
        self.definitions.insert(num_id.to_string(), definition);
    }

    pub fn definition(&self, num_id: &str) -> Option<&NumberingDefinition> {
        self.definitions.get(num_id)
    }

    pub fn level(&self, num_id: &str, level_id: &str) -> Option<&NumberingLevel> {
        self.definition(num_id)?.levels.get(level_id)
    }

    /// Per-level indent of a list; 0 for unknown lists
    pub fn indentation_step(&self, num_id: &str) -> i64 {
        self.definition(num_id).map_or(0, NumberingDefinition::indentation_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUMBERING: &str = r#"<numbering>
        <abstractNum abstractNumId="10">
            <lvl ilvl="0"><numFmt val="bullet"/></lvl>
            <lvl ilvl="1"><numFmt val="decimal"/><pPr><ind left="1440" hanging="360"/></pPr></lvl>
        </abstractNum>
        <num numId="1"><abstractNumId val="10"/></num>
        <num numId="2">
            <abstractNumId val="10"/>
            <lvlOverride ilvl="0"><lvl ilvl="0"><numFmt val="upperRoman"/></lvl></lvlOverride>
        </num>
        <num numId="3"><abstractNumId val="99"/></num>
    </numbering>"#;

    #[test]
    fn test_level_lookup() {
        let numbering = NumberingDefinitions::parse("word/numbering.xml", NUMBERING).unwrap();
        assert!(numbering.level("1", "0").unwrap().is_bullet());
        let level = numbering.level("1", "1").unwrap();
        assert_eq!(level.format(), "decimal");
        assert_eq!(level.paragraph_properties.indentation.as_ref().unwrap().left, Some(1440));
        assert!(numbering.level("1", "5").is_none());
    }

    #[test]
    fn test_level_override() {
        let numbering = NumberingDefinitions::parse("word/numbering.xml", NUMBERING).unwrap();
        assert_eq!(numbering.level("2", "0").unwrap().format(), "upperRoman");
        assert_eq!(numbering.level("2", "1").unwrap().format(), "decimal");
    }

    #[test]
    fn test_missing_abstract_definition() {
        let numbering = NumberingDefinitions::parse("word/numbering.xml", NUMBERING).unwrap();
        assert!(numbering.definition("3").is_none());
    }

    #[test]
    fn test_indentation_step() {
        let xml = r#"<numbering>
            <abstractNum abstractNumId="1">
                <lvl ilvl="0"><pPr><ind left="720" hanging="360"/></pPr></lvl>
                <lvl ilvl="1"><pPr><ind left="1440" hanging="360"/></pPr></lvl>
            </abstractNum>
            <num numId="1"><abstractNumId val="1"/></num>
        </numbering>"#;
        let numbering = NumberingDefinitions::parse("word/numbering.xml", xml).unwrap();
        assert_eq!(numbering.indentation_step("1"), 720);
        // Level 0 has no indentation
        let partial = NumberingDefinitions::parse("word/numbering.xml", NUMBERING).unwrap();
        assert_eq!(partial.indentation_step("1"), 0);
        assert_eq!(partial.indentation_step("9"), 0);
    }
}
