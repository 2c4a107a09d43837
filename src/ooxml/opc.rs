//! OPC (Open Packaging Conventions) Package Reader
//! Reads the ZIP container of a WordprocessingML document and its relationships

use std::collections::HashMap;
use std::io::{Cursor, Read};

use log::debug;
use zip::ZipArchive;

use super::error::OoxmlError;
use super::types::{PackagePart, Relationship, RelationshipType};
use super::xml::{attr, children, parse_part};

/// Part name of the package-level relationships
const ROOT_RELATIONSHIPS: &str = "_rels/.rels";
/// Conventional location of the main document part
const DEFAULT_MAIN_DOCUMENT: &str = "word/document.xml";

/// OPC Package Reader
#[derive(Debug, Clone, Default)]
pub struct OpcPackage {
    /// All parts in the package indexed by part name
    pub parts: HashMap<String, PackagePart>,
    /// Relationships indexed by source part name ("" for the package itself)
    pub relationships: HashMap<String, Vec<Relationship>>,
}

impl OpcPackage {
    /// Create a new OpcPackage from ZIP file data
    pub fn new(file_data: &[u8]) -> Result<Self, OoxmlError> {
        let mut archive = ZipArchive::new(Cursor::new(file_data))?;
        let mut package = OpcPackage::default();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = normalize_part_name(file.name());
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            package.parts.insert(name.clone(), PackagePart { name, data });
        }

        package.parse_all_relationships()?;
        debug!(
            "Read package with {} parts and {} relationship sets",
            package.parts.len(),
            package.relationships.len()
        );
        Ok(package)
    }

    /// Adds a part, replacing any part with the same name
    pub fn insert_part(&mut self, name: &str, data: impl Into<Vec<u8>>) {
        let name = normalize_part_name(name);
        self.parts.insert(name.clone(), PackagePart { name, data: data.into() });
    }

    /// Registers a relationship whose source is `source` ("" for the package)
    pub fn insert_relationship(&mut self, source: &str, relationship: Relationship) {
        self.relationships
            .entry(normalize_part_name(source))
            .or_default()
            .push(relationship);
    }

    /// Reads every `_rels/*.rels` part into the relationship table
    fn parse_all_relationships(&mut self) -> Result<(), OoxmlError> {
        let rel_parts: Vec<String> = self
            .parts
            .keys()
            .filter(|name| name.ends_with(".rels"))
            .cloned()
            .collect();

        for rel_part in rel_parts {
            let Some(source) = relationships_source(&rel_part) else {
                continue;
            };
            let Some(text) = self.part_text(&rel_part) else {
                continue;
            };
            let relationships = Self::parse_relationships_xml(&rel_part, &text)?;
            if !relationships.is_empty() {
                self.relationships.insert(source, relationships);
            }
        }
        Ok(())
    }

    /// Parse relationships XML
    fn parse_relationships_xml(part: &str, xml: &str) -> Result<Vec<Relationship>, OoxmlError> {
        let document = parse_part(part, xml)?;
        let relationships = children(document.root_element(), "Relationship")
            .filter_map(|node| {
                Some(Relationship {
                    id: attr(node, "Id")?.to_string(),
                    relationship_type: RelationshipType::from_string(attr(node, "Type")?),
                    target: attr(node, "Target")?.to_string(),
                    target_mode: attr(node, "TargetMode").map(str::to_string),
                })
            })
            .collect();
        Ok(relationships)
    }

    /// Get a part by name
    pub fn get_part(&self, name: &str) -> Option<&PackagePart> {
        self.parts.get(name.trim_start_matches('/'))
    }

    /// Part contents decoded as UTF-8 text
    pub fn part_text(&self, name: &str) -> Option<String> {
        self.get_part(name)
            .map(|part| String::from_utf8_lossy(&part.data).into_owned())
    }

    /// Get relationships for a source part
    pub fn get_relationships(&self, source: &str) -> &[Relationship] {
        self.relationships
            .get(source.trim_start_matches('/'))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Name of the main document part, if the package has one
    pub fn main_document_part_name(&self) -> Option<String> {
        let from_relationship = self
            .get_relationships("")
            .iter()
            .find(|rel| rel.relationship_type == RelationshipType::OfficeDocument)
            .map(|rel| resolve_target("", &rel.target));
        from_relationship
            .filter(|name| self.parts.contains_key(name))
            .or_else(|| {
                self.parts
                    .contains_key(DEFAULT_MAIN_DOCUMENT)
                    .then(|| DEFAULT_MAIN_DOCUMENT.to_string())
            })
    }

    /// Part related to `source` by a relationship of the given type,
    /// falling back to the conventional part name next to the source
    pub fn related_part_name(
        &self,
        source: &str,
        relationship_type: &RelationshipType,
        fallback_file: &str,
    ) -> Option<String> {
        let related = self
            .get_relationships(source)
            .iter()
            .find(|rel| &rel.relationship_type == relationship_type && !rel.is_external())
            .map(|rel| resolve_target(source, &rel.target));
        related.filter(|name| self.parts.contains_key(name)).or_else(|| {
            let fallback = resolve_target(source, fallback_file);
            self.parts.contains_key(&fallback).then_some(fallback)
        })
    }
}

fn normalize_part_name(name: &str) -> String {
    name.trim_start_matches('/').to_string()
}

/// Source part of a relationships part: `word/_rels/document.xml.rels` -> `word/document.xml`
fn relationships_source(rel_part: &str) -> Option<String> {
    if rel_part == ROOT_RELATIONSHIPS {
        return Some(String::new());
    }
    let file = rel_part.strip_suffix(".rels")?;
    let (dir, name) = file.rsplit_once("_rels/")?;
    Some(format!("{}{}", dir, name))
}

/// Resolves a relationship target relative to the directory of its source part
pub fn resolve_target(source: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = match source.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_relationships_xml() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="http://example.com" TargetMode="External"/>
</Relationships>"#;

        let relationships = OpcPackage::parse_relationships_xml("_rels/.rels", xml).unwrap();
        assert_eq!(relationships.len(), 2);
        assert_eq!(relationships[0].id, "rId1");
        assert_eq!(relationships[0].relationship_type, RelationshipType::OfficeDocument);
        assert!(relationships[1].is_external());
    }

    #[test]
    fn test_relationships_source() {
        assert_eq!(relationships_source("_rels/.rels").as_deref(), Some(""));
        assert_eq!(
            relationships_source("word/_rels/document.xml.rels").as_deref(),
            Some("word/document.xml")
        );
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("word/document.xml", "media/image1.png"), "word/media/image1.png");
        assert_eq!(resolve_target("word/document.xml", "../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(resolve_target("word/document.xml", "/word/styles.xml"), "word/styles.xml");
        assert_eq!(resolve_target("", "word/document.xml"), "word/document.xml");
    }

    #[test]
    fn test_main_document_fallback() {
        let mut package = OpcPackage::default();
        assert_eq!(package.main_document_part_name(), None);
        package.insert_part("/word/document.xml", "<document/>");
        assert_eq!(package.main_document_part_name().as_deref(), Some("word/document.xml"));
    }

    #[test]
    fn test_invalid_archive() {
        assert!(matches!(OpcPackage::new(&[]), Err(OoxmlError::Zip(_))));
    }
}
