//! HTML export
//!
//! [`HtmlExporter`] runs the export pipeline on a private copy of the
//! document tree: the discovery pass, complex field resolution, then the
//! render pass wrapped in the document shell.
//!
//! # Example
//!
//! ```rust,no_run
//! use docx_html::export::{HtmlExportOptions, HtmlExporter};
//! use docx_html::ooxml::WordprocessingDocument;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file_data = std::fs::read("document.docx")?;
//!     let document = WordprocessingDocument::from_bytes(&file_data)?;
//!     let html = HtmlExporter::new(&document, HtmlExportOptions::default()).export();
//!     std::fs::write("document.html", html)?;
//!     Ok(())
//! }
//! ```

use log::{debug, info};

use crate::ooxml::WordprocessingDocument;

use super::discovery::discover;
use super::event::{single, to_html, Events, HtmlTag, OutputEvent};
use super::fields::resolve_complex_fields;
use super::indentation::twips_to_em;
use super::options::HtmlExportOptions;
use super::visitor::Renderer;

/// Classes of the default stylesheet, sorted by name
const DEFAULT_CLASSES: &[(&str, &str)] = &[
    ("caps", "text-transform:uppercase"),
    ("center", "text-align:center"),
    ("comment", "color:blue"),
    ("delete", "color:red;text-decoration:line-through"),
    ("hidden", "visibility:hidden"),
    ("insert", "color:green"),
    ("left", "text-align:left"),
    ("right", "text-align:right"),
    ("small-caps", "font-variant:small-caps"),
    ("strike", "text-decoration:line-through"),
    ("tab", "display:inline-block;width:4em"),
    ("underline", "text-decoration:underline"),
];

/// Converts a parsed document to an HTML string
pub struct HtmlExporter<'d> {
    document: &'d WordprocessingDocument,
    options: HtmlExportOptions,
}

impl<'d> HtmlExporter<'d> {
    pub fn new(document: &'d WordprocessingDocument, options: HtmlExportOptions) -> Self {
        HtmlExporter { document, options }
    }

    pub fn options(&self) -> &HtmlExportOptions {
        &self.options
    }

    /// Runs both passes and serializes the complete document
    pub fn export(&self) -> String {
        let mut tree = self.document.tree.clone();
        let discovery = discover(&tree);
        debug!(
            "Discovery found {} field runs and {} footnotes",
            discovery.complex_field_runs.len(),
            discovery.footnotes.len()
        );
        resolve_complex_fields(&mut tree, &discovery.complex_field_runs);

        let renderer = Renderer::new(&tree, &discovery, self.document, &self.options);
        let content: Events = Box::new(renderer.body().chain(renderer.footnotes()));
        let html = to_html(self.shell(content, tree.page_width));
        info!("Exported {} nodes to {} bytes of HTML", tree.len(), html.len());
        html
    }

    /// `<html>` with the head block and `content` as the body
    fn shell<'a>(&self, content: Events<'a>, page_width: Option<i32>) -> Events<'a> {
        let meta = single(HtmlTag::void("meta").attr("charset", "utf-8").open());
        let style = HtmlTag::new("style").apply(single(OutputEvent::text(self.stylesheet(page_width))), true);
        let head = HtmlTag::new("head").apply(Box::new(meta.chain(style)), true);
        let body = HtmlTag::new("body").apply(content, true);
        HtmlTag::new("html").apply(Box::new(head.chain(body)), true)
    }

    /// The default classes followed by the body rule
    pub fn stylesheet(&self, page_width: Option<i32>) -> String {
        let mut css: String = DEFAULT_CLASSES
            .iter()
            .map(|(class, declarations)| format!(".pydocx-{} {{{}}}", class, declarations))
            .collect();
        css.push_str("body {margin:0px auto");
        if let Some(width) = page_width.filter(|_| self.options.include_page_width) {
            css.push_str(";width:");
            css.push_str(&twips_to_em(i64::from(width)));
        }
        css.push('}');
        css
    }
}
