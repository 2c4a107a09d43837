//! Small helpers over `roxmltree` for WordprocessingML.
//!
//! Elements and attributes are matched by local name so that both fully
//! namespaced parts and bare fixtures (`<p><r><t>..</t></r></p>`) are read
//! the same way.

use roxmltree::Node;

use super::error::OoxmlError;
use super::types::{Border, Indentation, NumberingProperties, ParagraphBorders, ParagraphProperties, RunProperties, Shading};

/// Parses a part, tolerating a leading byte order mark
pub(crate) fn parse_part<'i>(part: &str, text: &'i str) -> Result<roxmltree::Document<'i>, OoxmlError> {
    roxmltree::Document::parse(text.trim_start_matches('\u{feff}')).map_err(|e| OoxmlError::xml(part, e))
}

pub(crate) fn local_name<'a, 'i>(node: Node<'a, 'i>) -> &'a str {
    node.tag_name().name()
}

/// Attribute value by local name
pub(crate) fn attr<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<&'a str> {
    node.attributes().find(|a| a.name() == name).map(|a| a.value())
}

/// First element child with the given local name
pub(crate) fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| n.is_element() && local_name(*n) == name)
}

pub(crate) fn children<'a, 'i: 'a>(node: Node<'a, 'i>, name: &'a str) -> impl Iterator<Item = Node<'a, 'i>> + 'a {
    node.children().filter(move |n| n.is_element() && local_name(*n) == name)
}

/// `w:val` of a named child
pub(crate) fn child_val<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<&'a str> {
    child(node, name).and_then(|c| attr(c, "val"))
}

/// Lenient integer parsing; malformed values are treated as absent
pub(crate) fn parse_int(value: &str) -> Option<i32> {
    let value = value.trim();
    value
        .parse::<i32>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i32))
}

pub(crate) fn int_attr(node: Node, name: &str) -> Option<i32> {
    attr(node, name).and_then(parse_int)
}

fn unsigned_attr(node: Node, name: &str) -> Option<u32> {
    int_attr(node, name).and_then(|v| u32::try_from(v).ok())
}

/// Reads an on/off toggle such as `<w:b/>` or `<w:b w:val="false"/>`
pub(crate) fn on_off(node: Node, name: &str) -> Option<bool> {
    child(node, name).map(|c| !matches!(attr(c, "val"), Some("0" | "false" | "off")))
}

fn parse_border(node: Node) -> Option<Border> {
    let style = attr(node, "val");
    if matches!(style, Some("nil")) {
        return None;
    }
    Some(Border {
        style: style.map(str::to_string),
        width: unsigned_attr(node, "sz"),
        color: attr(node, "color").map(str::to_string),
        space: unsigned_attr(node, "space"),
        shadow: matches!(attr(node, "shadow"), Some("1" | "true" | "on")),
    })
}

pub(crate) fn parse_shading(node: Node) -> Shading {
    Shading {
        pattern: attr(node, "val").map(str::to_string),
        color: attr(node, "color").map(str::to_string),
        fill: attr(node, "fill").map(str::to_string),
    }
}

fn parse_paragraph_borders(node: Node) -> Option<ParagraphBorders> {
    let borders = ParagraphBorders {
        top: child(node, "top").and_then(parse_border),
        left: child(node, "left").or_else(|| child(node, "start")).and_then(parse_border),
        bottom: child(node, "bottom").and_then(parse_border),
        right: child(node, "right").or_else(|| child(node, "end")).and_then(parse_border),
        between: child(node, "between").and_then(parse_border),
    };
    (!borders.is_empty()).then_some(borders)
}

fn parse_indentation(node: Node) -> Option<Indentation> {
    let indentation = Indentation {
        left: int_attr(node, "left").or_else(|| int_attr(node, "start")),
        right: int_attr(node, "right").or_else(|| int_attr(node, "end")),
        first_line: int_attr(node, "firstLine"),
        hanging: int_attr(node, "hanging"),
    };
    (!indentation.is_empty()).then_some(indentation)
}

/// Reads a `w:pPr` element
pub(crate) fn parse_paragraph_properties(node: Node) -> ParagraphProperties {
    ParagraphProperties {
        style_id: child_val(node, "pStyle").map(str::to_string),
        justification: child_val(node, "jc").map(str::to_string),
        indentation: child(node, "ind").and_then(parse_indentation),
        numbering: child(node, "numPr").map(|n| NumberingProperties {
            num_id: child_val(n, "numId").map(str::to_string),
            level_id: child_val(n, "ilvl").map(str::to_string),
        }),
        borders: child(node, "pBdr").and_then(parse_paragraph_borders),
        shading: child(node, "shd").map(parse_shading),
    }
}

/// Reads a `w:rPr` element
pub(crate) fn parse_run_properties(node: Node) -> RunProperties {
    RunProperties {
        style_id: child_val(node, "rStyle").map(str::to_string),
        bold: on_off(node, "b"),
        italic: on_off(node, "i"),
        underline: child(node, "u").map(|u| attr(u, "val").unwrap_or("single").to_string()),
        caps: on_off(node, "caps"),
        small_caps: on_off(node, "smallCaps"),
        strike: on_off(node, "strike"),
        dstrike: on_off(node, "dstrike"),
        vanish: on_off(node, "vanish"),
        hidden: on_off(node, "webHidden"),
        vertical_align: child_val(node, "vertAlign").map(str::to_string),
        border: child(node, "bdr").and_then(parse_border),
        shading: child(node, "shd").map(parse_shading),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_is_lenient() {
        assert_eq!(parse_int("720"), Some(720));
        assert_eq!(parse_int(" 12.6 "), Some(13));
        assert_eq!(parse_int("abc"), None);
        assert_eq!(parse_int(""), None);
    }

    #[test]
    fn test_run_properties_toggles() {
        let xml = r#"<rPr><b/><i w:val="0" xmlns:w="urn:w"/><u w:val="none" xmlns:w="urn:w"/><vertAlign val="superscript"/></rPr>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let props = parse_run_properties(doc.root_element());
        assert_eq!(props.bold, Some(true));
        assert_eq!(props.italic, Some(false));
        assert!(!props.is_underlined());
        assert_eq!(props.vertical_align.as_deref(), Some("superscript"));
        assert_eq!(props.caps, None);
    }

    #[test]
    fn test_paragraph_properties() {
        let xml = r#"<pPr>
            <pStyle val="Heading1"/>
            <jc val="center"/>
            <ind left="720" hanging="bogus"/>
            <numPr><ilvl val="1"/><numId val="3"/></numPr>
            <pBdr><top val="single" sz="4" space="1" color="FF0000"/><bottom val="nil"/></pBdr>
        </pPr>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let props = parse_paragraph_properties(doc.root_element());
        assert_eq!(props.style_id.as_deref(), Some("Heading1"));
        assert_eq!(props.justification.as_deref(), Some("center"));
        let indentation = props.indentation.unwrap();
        assert_eq!(indentation.left, Some(720));
        assert_eq!(indentation.hanging, None);
        let numbering = props.numbering.unwrap();
        assert_eq!(numbering.num_id.as_deref(), Some("3"));
        assert_eq!(numbering.level_id.as_deref(), Some("1"));
        let borders = props.borders.unwrap();
        assert_eq!(borders.top.as_ref().unwrap().color(), "FF0000");
        assert!(borders.bottom.is_none());
    }
}
