//! WordprocessingML document reader
//!
//! Builds the arena [`DocumentTree`] from the main document part and the
//! footnotes part, and loads the style and numbering lookups it resolves
//! properties against.

use std::collections::HashMap;

use log::{debug, trace, warn};
use roxmltree::Node;

use crate::dom::{BreakKind, DocumentTree, DrawingImage, FieldCharKind, ImageSource, NodeId, NodeKind, VmlImage};
use crate::error::ExportError;

use super::error::OoxmlError;
use super::numbering::NumberingDefinitions;
use super::opc::{resolve_target, OpcPackage};
use super::styles::StyleSheet;
use super::types::{RelationshipType, TableCellProperties, VerticalMerge};
use super::xml::{
    attr, child, child_val, int_attr, local_name, parse_int, parse_paragraph_properties, parse_part, parse_run_properties,
    parse_shading,
};

/// EMUs per degree in DrawingML rotations
const ROTATION_UNITS_PER_DEGREE: f64 = 60000.0;

/// Elements that only carry properties or markers the exporter does not use
const SKIPPED_ELEMENTS: &[&str] = &[
    "pPr",
    "rPr",
    "tblPr",
    "tblPrEx",
    "tblGrid",
    "trPr",
    "tcPr",
    "sdtPr",
    "sdtEndPr",
    "proofErr",
    "bookmarkEnd",
    "lastRenderedPageBreak",
    "softHyphen",
    "commentRangeStart",
    "commentRangeEnd",
    "permStart",
    "permEnd",
];

/// A parsed `.docx` document ready for export
#[derive(Debug, Clone)]
pub struct WordprocessingDocument {
    /// The document tree, including style and numbering lookups
    pub tree: DocumentTree,
    /// Binary image parts referenced from the tree, keyed by part name
    images: HashMap<String, Vec<u8>>,
}

impl WordprocessingDocument {
    /// Reads a document from `.docx` bytes
    pub fn from_bytes(file_data: &[u8]) -> Result<Self, ExportError> {
        let package = OpcPackage::new(file_data)?;
        Self::parse(&package)
    }

    /// Reads a document from an already opened package
    pub fn parse(package: &OpcPackage) -> Result<Self, ExportError> {
        let main = package.main_document_part_name().ok_or(ExportError::MissingMainDocument)?;
        debug!("Reading main document part {}", main);

        let styles = load_optional_part(package, &main, RelationshipType::Styles, "styles.xml", StyleSheet::parse);
        let numbering = load_optional_part(
            package,
            &main,
            RelationshipType::Numbering,
            "numbering.xml",
            NumberingDefinitions::parse,
        );

        let mut tree = DocumentTree::new(styles.unwrap_or_default(), numbering.unwrap_or_default());
        let mut images = HashMap::new();

        let text = package.part_text(&main).ok_or(ExportError::MissingMainDocument)?;
        let xml = parse_part(&main, &text)?;
        let mut reader = PartReader {
            package,
            part: &main,
            images: &mut images,
        };
        let root = tree.root();
        reader.read_children(&mut tree, xml.root_element(), root);

        let footnotes = package
            .related_part_name(&main, &RelationshipType::Footnotes, "footnotes.xml")
            .and_then(|name| package.part_text(&name).map(|text| (name, text)));
        if let Some((footnotes_part, text)) = footnotes {
            match parse_part(&footnotes_part, &text) {
                Ok(xml) => {
                    let mut reader = PartReader {
                        package,
                        part: &footnotes_part,
                        images: &mut images,
                    };
                    reader.read_footnotes(&mut tree, xml.root_element());
                    debug!("Read footnotes part {}", footnotes_part);
                }
                Err(err) => warn!("Ignoring footnotes: {}", err),
            }
        }

        Ok(WordprocessingDocument { tree, images })
    }

    /// Reads a document from part XML keyed by part name, e.g.
    /// `("word/document.xml", "<document>...</document>")`
    pub fn from_parts(parts: &[(&str, &str)]) -> Result<Self, ExportError> {
        let mut package = OpcPackage::default();
        for (name, xml) in parts {
            package.insert_part(name, xml.as_bytes());
        }
        Self::parse(&package)
    }

    /// Bytes of an image part referenced by the document
    pub fn image_data(&self, part: &str) -> Option<&[u8]> {
        self.images.get(part).map(Vec::as_slice)
    }
}

/// Loads an optional part; absence or malformed XML yields `None`
fn load_optional_part<T>(
    package: &OpcPackage,
    main: &str,
    relationship_type: RelationshipType,
    fallback_file: &str,
    parse: fn(&str, &str) -> Result<T, OoxmlError>,
) -> Option<T> {
    let Some(name) = package.related_part_name(main, &relationship_type, fallback_file) else {
        debug!("No {:?} part, using defaults", relationship_type);
        return None;
    };
    let text = package.part_text(&name)?;
    match parse(&name, &text) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("Ignoring {:?} part: {}", relationship_type, err);
            None
        }
    }
}

/// Reads the elements of one part into the tree
struct PartReader<'p> {
    package: &'p OpcPackage,
    part: &'p str,
    images: &'p mut HashMap<String, Vec<u8>>,
}

impl PartReader<'_> {
    fn read_children(&mut self, tree: &mut DocumentTree, node: Node, parent: NodeId) {
        for element in node.children().filter(Node::is_element) {
            self.read_element(tree, element, parent);
        }
    }

    fn read_footnotes(&mut self, tree: &mut DocumentTree, root: Node) {
        for footnote in root.children().filter(|n| n.is_element() && local_name(*n) == "footnote") {
            if matches!(attr(footnote, "type"), Some("separator" | "continuationSeparator" | "continuationNotice")) {
                continue;
            }
            let Some(id) = attr(footnote, "id") else {
                continue;
            };
            let node = tree.create_detached(NodeKind::Footnote { id: id.to_string() });
            self.read_children(tree, footnote, node);
            tree.register_footnote(id, node);
        }
    }

    fn read_element(&mut self, tree: &mut DocumentTree, node: Node, parent: NodeId) {
        let name = local_name(node);
        let kind = match name {
            "body" => NodeKind::Body,
            "p" => NodeKind::Paragraph(child(node, "pPr").map(parse_paragraph_properties).unwrap_or_default()),
            "r" => NodeKind::Run(child(node, "rPr").map(parse_run_properties).unwrap_or_default()),
            "t" => NodeKind::Text(node.text().unwrap_or_default().to_string()),
            "delText" => NodeKind::DeletedText(node.text().unwrap_or_default().to_string()),
            "br" => match attr(node, "type") {
                Some("page") => NodeKind::Break(BreakKind::Page),
                _ => NodeKind::Break(BreakKind::Line),
            },
            "cr" => NodeKind::Break(BreakKind::Line),
            "tab" => NodeKind::TabChar,
            "noBreakHyphen" => NodeKind::NoBreakHyphen,
            "tbl" => NodeKind::Table,
            "tr" => NodeKind::TableRow,
            "tc" => NodeKind::TableCell(child(node, "tcPr").map(parse_cell_properties).unwrap_or_default()),
            "hyperlink" => NodeKind::Hyperlink {
                target: attr(node, "id").and_then(|id| self.relationship_target(id)),
                anchor: attr(node, "anchor").map(str::to_string),
            },
            "drawing" => {
                let drawing = self.read_drawing(node);
                tree.append(parent, NodeKind::Drawing(drawing));
                return;
            }
            "pict" | "shape" | "rect" | "textbox" | "txbxContent" => NodeKind::VmlShape,
            "imagedata" => NodeKind::VmlImageData(self.read_vml_image(node)),
            "object" => NodeKind::EmbeddedObject,
            "footnoteReference" => match attr(node, "id") {
                Some(id) => NodeKind::FootnoteReference { id: id.to_string() },
                None => return,
            },
            "footnoteRef" => NodeKind::FootnoteReferenceMark,
            "fldChar" => match attr(node, "fldCharType").and_then(FieldCharKind::from_string) {
                Some(kind) => NodeKind::FieldChar(kind),
                None => return,
            },
            "instrText" => NodeKind::FieldCode(node.text().unwrap_or_default().to_string()),
            "fldSimple" => NodeKind::SimpleField {
                instr: attr(node, "instr").unwrap_or_default().to_string(),
            },
            "bookmarkStart" => NodeKind::Bookmark {
                name: attr(node, "name").unwrap_or_default().to_string(),
            },
            "smartTag" | "customXml" => NodeKind::SmartTag,
            "ins" => NodeKind::InsertedRun,
            "del" => NodeKind::DeletedRun,
            "sdt" => NodeKind::StructuredDocumentTag,
            "sdtContent" => NodeKind::SdtContent,
            "sectPr" => {
                if let Some(width) = child(node, "pgSz").and_then(|size| int_attr(size, "w")) {
                    tree.page_width = Some(width);
                }
                return;
            }
            skipped if SKIPPED_ELEMENTS.contains(&skipped) => return,
            unknown => {
                trace!("Unhandled element {} in {}", unknown, self.part);
                tree.append(parent, NodeKind::Unknown(unknown.to_string()));
                return;
            }
        };
        let id = tree.append(parent, kind);
        self.read_children(tree, node, id);
    }

    /// Target of an external relationship (hyperlinks)
    fn relationship_target(&self, id: &str) -> Option<String> {
        self.package
            .get_relationships(self.part)
            .iter()
            .find(|rel| rel.id == id)
            .map(|rel| {
                if rel.is_external() {
                    rel.target.clone()
                } else {
                    resolve_target(self.part, &rel.target)
                }
            })
    }

    /// Resolves an image relationship and remembers the bytes of internal parts
    fn image_source(&mut self, id: &str) -> Option<ImageSource> {
        let relationship = self
            .package
            .get_relationships(self.part)
            .iter()
            .find(|rel| rel.id == id)?;
        if relationship.is_external() {
            return Some(ImageSource::External(relationship.target.clone()));
        }
        let name = resolve_target(self.part, &relationship.target);
        match self.package.get_part(&name) {
            Some(part) => {
                self.images.entry(name.clone()).or_insert_with(|| part.data.clone());
            }
            None => debug!("Image part {} is missing", name),
        }
        Some(ImageSource::Part(name))
    }

    fn read_drawing(&mut self, node: Node) -> DrawingImage {
        let find = |name: &str| node.descendants().find(|n| n.is_element() && local_name(*n) == name);
        let extent = find("extent");
        let blip = find("blip");
        let rotation = find("xfrm")
            .and_then(|xfrm| attr(xfrm, "rot"))
            .and_then(parse_int)
            .map(|rot| f64::from(rot) / ROTATION_UNITS_PER_DEGREE);
        let source = blip
            .and_then(|blip| attr(blip, "embed").or_else(|| attr(blip, "link")))
            .and_then(|id| self.image_source(id));
        DrawingImage {
            source,
            width_emu: extent.and_then(|e| attr(e, "cx")).and_then(|v| v.trim().parse().ok()),
            height_emu: extent.and_then(|e| attr(e, "cy")).and_then(|v| v.trim().parse().ok()),
            rotation,
        }
    }

    fn read_vml_image(&mut self, node: Node) -> VmlImage {
        let style = node
            .ancestors()
            .find(|n| n.is_element() && matches!(local_name(*n), "shape" | "rect"))
            .and_then(|shape| attr(shape, "style"))
            .unwrap_or_default();
        let style_value = |key: &str| {
            style.split(';').find_map(|declaration| {
                let (name, value) = declaration.split_once(':')?;
                (name.trim() == key).then(|| value.trim().to_string())
            })
        };
        VmlImage {
            source: attr(node, "id").and_then(|id| self.image_source(id)),
            width: style_value("width"),
            height: style_value("height"),
        }
    }
}

fn parse_cell_properties(node: Node) -> TableCellProperties {
    TableCellProperties {
        grid_span: child_val(node, "gridSpan")
            .and_then(parse_int)
            .and_then(|span| u32::try_from(span).ok()),
        vertical_merge: child(node, "vMerge").map(|merge| match attr(merge, "val") {
            Some("restart") => VerticalMerge::Restart,
            _ => VerticalMerge::Continue,
        }),
        shading: child(node, "shd").map(parse_shading),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::types::Relationship;

    fn package(body: &str) -> OpcPackage {
        let mut package = OpcPackage::default();
        package.insert_part("word/document.xml", format!("<document><body>{}</body></document>", body));
        package
    }

    fn kinds(tree: &DocumentTree, id: NodeId) -> Vec<String> {
        tree.descendants(id)
            .map(|child| match tree.kind(child) {
                NodeKind::Paragraph(_) => "p".to_string(),
                NodeKind::Run(_) => "r".to_string(),
                NodeKind::Text(text) => format!("t:{}", text),
                other => format!("{:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_missing_main_document_is_fatal() {
        let package = OpcPackage::default();
        assert!(matches!(
            WordprocessingDocument::parse(&package),
            Err(ExportError::MissingMainDocument)
        ));
    }

    #[test]
    fn test_malformed_main_document_is_fatal() {
        let mut package = OpcPackage::default();
        package.insert_part("word/document.xml", "<document><body>");
        assert!(WordprocessingDocument::parse(&package).is_err());
    }

    #[test]
    fn test_reads_paragraphs_and_runs() {
        let document =
            WordprocessingDocument::parse(&package("<p><pPr><jc val=\"center\"/></pPr><r><t> Foo</t></r></p>")).unwrap();
        let tree = &document.tree;
        let body = tree.body().unwrap();
        assert_eq!(kinds(tree, body), vec!["Body", "p", "r", "t: Foo"]);
    }

    #[test]
    fn test_skips_property_elements_and_keeps_unknown() {
        let document = WordprocessingDocument::parse(&package(
            "<p><proofErr/><r><rPr><b/></rPr><t>A</t><mystery/></r></p>",
        ))
        .unwrap();
        let tree = &document.tree;
        assert_eq!(
            kinds(tree, tree.body().unwrap()),
            vec!["Body", "p", "r", "t:A", "Unknown(\"mystery\")"]
        );
    }

    #[test]
    fn test_malformed_styles_degrade() {
        let mut package = package("<p><r><t>A</t></r></p>");
        package.insert_part("word/styles.xml", "<styles><style");
        let document = WordprocessingDocument::parse(&package).unwrap();
        assert!(document.tree.body().is_some());
    }

    #[test]
    fn test_page_width_from_section() {
        let document = WordprocessingDocument::parse(&package("<sectPr><pgSz w=\"12240\" h=\"15840\"/></sectPr>")).unwrap();
        assert_eq!(document.tree.page_width, Some(12240));
    }

    #[test]
    fn test_cell_properties() {
        let document = WordprocessingDocument::parse(&package(
            "<tbl><tr><tc><tcPr><gridSpan val=\"x\"/><vMerge/></tcPr></tc><tc><tcPr><gridSpan val=\"2\"/><vMerge val=\"restart\"/></tcPr></tc></tr></tbl>",
        ))
        .unwrap();
        let tree = &document.tree;
        let cells: Vec<&TableCellProperties> = tree
            .descendants(tree.body().unwrap())
            .filter_map(|id| match tree.kind(id) {
                NodeKind::TableCell(props) => Some(props),
                _ => None,
            })
            .collect();
        assert_eq!(cells[0].grid_span, None);
        assert_eq!(cells[0].vertical_merge, Some(VerticalMerge::Continue));
        assert_eq!(cells[1].grid_span, Some(2));
        assert_eq!(cells[1].vertical_merge, Some(VerticalMerge::Restart));
    }

    #[test]
    fn test_hyperlink_and_image_relationships() {
        let mut package = package(
            r#"<p><hyperlink id="rId1"><r><t>link</t></r></hyperlink><r><drawing><inline><extent cx="381000" cy="190500"/><graphic><graphicData><pic><blipFill><blip embed="rId2"/></blipFill></pic></graphicData></graphic></inline></drawing></r></p>"#,
        );
        package.insert_relationship(
            "word/document.xml",
            Relationship::new("rId1", RelationshipType::Hyperlink, "http://example.com").external(),
        );
        package.insert_relationship(
            "word/document.xml",
            Relationship::new("rId2", RelationshipType::Image, "media/image1.png"),
        );
        package.insert_part("word/media/image1.png", vec![1u8, 2, 3]);

        let document = WordprocessingDocument::parse(&package).unwrap();
        let tree = &document.tree;
        let mut found_link = false;
        let mut found_image = false;
        for id in tree.descendants(tree.body().unwrap()) {
            match tree.kind(id) {
                NodeKind::Hyperlink { target, .. } => {
                    assert_eq!(target.as_deref(), Some("http://example.com"));
                    found_link = true;
                }
                NodeKind::Drawing(drawing) => {
                    assert_eq!(drawing.source, Some(ImageSource::Part("word/media/image1.png".into())));
                    assert_eq!(drawing.width_emu, Some(381000));
                    found_image = true;
                }
                _ => {}
            }
        }
        assert!(found_link && found_image);
        assert_eq!(document.image_data("word/media/image1.png"), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_footnotes_part() {
        let mut package = package("<p><r><footnoteReference id=\"2\"/></r></p>");
        package.insert_part(
            "word/footnotes.xml",
            "<footnotes><footnote type=\"separator\" id=\"0\"><p/></footnote><footnote id=\"2\"><p><r><footnoteRef/><t>Note</t></r></p></footnote></footnotes>",
        );
        let document = WordprocessingDocument::parse(&package).unwrap();
        assert!(document.tree.footnote("0").is_none());
        let footnote = document.tree.footnote("2").unwrap();
        assert_eq!(document.tree.parent(footnote), None);
        assert_eq!(
            kinds(&document.tree, footnote),
            vec!["Footnote { id: \"2\" }", "p", "r", "FootnoteReferenceMark", "t:Note"]
        );
    }
}
