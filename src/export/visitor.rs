//! Render pass over the document tree.
//!
//! [`Renderer`] dispatches every [`NodeKind`] to a handler. Handlers return
//! lazy event sequences; a handler body only runs once its first event is
//! pulled, so border and table state is mutated in document order.
//!
//! # Features
//! - Paragraph and run property wrappers in a fixed order
//! - Headings with bookmark ids, `strong` headings inside lists
//! - Lists rebuilt from numbering references, with line breaks between
//!   paragraphs of one list item
//! - Tables with column and row spans and cell backgrounds
//! - Hyperlinks, simple fields, footnote references and footnote marks
//! - DrawingML and VML images as data URIs or external links

use std::cell::RefCell;
use std::collections::HashMap;
use std::iter;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, trace};

use crate::dom::{BreakKind, DocumentTree, DrawingImage, ImageSource, NodeId, NodeKind, VmlImage};
use crate::ooxml::{
    NumberingLevel,
    ParagraphProperties,
    RunProperties,
    Style,
    TableCellProperties,
    WordprocessingDocument,
};

use super::borders::{BorderChannel, BorderTracker, BoxStyle};
use super::discovery::DiscoveryTable;
use super::event::{deferred, nothing, probe, single, Declarations, Events, HtmlTag, OutputEvent};
use super::fields::FieldInstruction;
use super::indentation::{list_indentation, paragraph_indentation};
use super::numbering::{regroup, Block, NumberingItem, NumberingSpan};
use super::options::HtmlExportOptions;
use super::table::{column_span, is_merge_continuation, TableGrid};

const EMUS_PER_PIXEL: f64 = 9525.0;

const HEADING_TAGS: [(&str, &str); 6] = [
    ("heading 1", "h1"),
    ("heading 2", "h2"),
    ("heading 3", "h3"),
    ("heading 4", "h4"),
    ("heading 5", "h5"),
    ("heading 6", "h6"),
];

/// Flags inherited from enclosing nodes
#[derive(Debug, Clone, Copy, Default)]
struct Context {
    /// Inside a list item, at any depth
    in_list: bool,
    /// Direct child block of a list item
    list_item_child: bool,
    /// Inside a heading paragraph
    in_heading: bool,
    /// Inside a hyperlink; runs drop their underline
    suppress_underline: bool,
    /// First paragraph of the list item enclosing a nested list
    list_owner: Option<NodeId>,
}

/// Run formatting wrappers, in application order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunFormat {
    Bold,
    Italic,
    Underline,
    Caps,
    SmallCaps,
    Strike,
    DoubleStrike,
    Vanish,
    Hidden,
    VerticalAlign,
}

impl RunFormat {
    const ORDER: [RunFormat; 10] = [
        RunFormat::Bold,
        RunFormat::Italic,
        RunFormat::Underline,
        RunFormat::Caps,
        RunFormat::SmallCaps,
        RunFormat::Strike,
        RunFormat::DoubleStrike,
        RunFormat::Vanish,
        RunFormat::Hidden,
        RunFormat::VerticalAlign,
    ];

    fn is_set(self, props: &RunProperties) -> bool {
        let flag = |value: Option<bool>| value.unwrap_or(false);
        match self {
            RunFormat::Bold => flag(props.bold),
            RunFormat::Italic => flag(props.italic),
            RunFormat::Underline => props.is_underlined(),
            RunFormat::Caps => flag(props.caps),
            RunFormat::SmallCaps => flag(props.small_caps),
            RunFormat::Strike => flag(props.strike),
            RunFormat::DoubleStrike => flag(props.dstrike),
            RunFormat::Vanish => flag(props.vanish),
            RunFormat::Hidden => flag(props.hidden),
            RunFormat::VerticalAlign => props.vertical_align.is_some(),
        }
    }

    /// Formats that survive inside headings
    fn allowed_in_heading(self) -> bool {
        matches!(self, RunFormat::Italic | RunFormat::Vanish | RunFormat::Hidden)
    }

    fn apply<'a>(self, props: &RunProperties, events: Events<'a>) -> Events<'a> {
        let class = |name: &str| HtmlTag::new("span").class(name);
        match self {
            RunFormat::Bold => styled(HtmlTag::new("strong"), events),
            RunFormat::Italic => styled(HtmlTag::new("em"), events),
            RunFormat::Underline => styled(class("pydocx-underline"), events),
            RunFormat::Caps => styled(class("pydocx-caps"), events),
            RunFormat::SmallCaps => styled(class("pydocx-small-caps"), events),
            RunFormat::Strike | RunFormat::DoubleStrike => styled(class("pydocx-strike"), events),
            RunFormat::Vanish | RunFormat::Hidden => styled(class("pydocx-hidden"), events),
            RunFormat::VerticalAlign => match props.vertical_align.as_deref() {
                Some("superscript") => HtmlTag::new("sup").apply(events, false),
                Some("subscript") => HtmlTag::new("sub").apply(events, false),
                _ => events,
            },
        }
    }
}

/// Wraps `events` in `tag`, leaving leading whitespace-only text outside
fn styled<'a>(tag: HtmlTag, mut events: Events<'a>) -> Events<'a> {
    deferred(move || {
        let mut leading = Vec::new();
        while let Some(event) = events.next() {
            if matches!(&event, OutputEvent::Text(text) if text.trim().is_empty()) {
                leading.push(event);
                continue;
            }
            let rest: Events<'a> = Box::new(iter::once(event).chain(events));
            return Box::new(leading.into_iter().chain(tag.apply(rest, true)));
        }
        Box::new(leading.into_iter())
    })
}

fn from_vec<'a>(events: Vec<OutputEvent>) -> Events<'a> {
    Box::new(events.into_iter())
}

/// Mutable state of one render pass
#[derive(Debug, Default)]
struct RenderState {
    borders: BorderTracker,
    tables: HashMap<NodeId, TableGrid>,
}

/// Renders a tree prepared by the discovery and field passes
pub struct Renderer<'t> {
    tree: &'t DocumentTree,
    discovery: &'t DiscoveryTable,
    document: &'t WordprocessingDocument,
    options: &'t HtmlExportOptions,
    state: RefCell<RenderState>,
}

impl<'t> Renderer<'t> {
    pub fn new(
        tree: &'t DocumentTree,
        discovery: &'t DiscoveryTable,
        document: &'t WordprocessingDocument,
        options: &'t HtmlExportOptions,
    ) -> Self {
        Renderer {
            tree,
            discovery,
            document,
            options,
            state: RefCell::new(RenderState::default()),
        }
    }

    /// Events of the body content
    pub fn body(&self) -> Events<'_> {
        match self.tree.body() {
            Some(body) => self.node(body, Context::default(), None),
            None => nothing(),
        }
    }

    /// The footnote list: `<hr />` and an ordered list of the referenced
    /// footnotes, or nothing when no footnote is referenced
    pub fn footnotes(&self) -> Events<'_> {
        if !self.options.include_footnotes {
            return nothing();
        }
        let items = self
            .discovery
            .footnotes
            .iter()
            .filter_map(move |footnote_id| self.tree.footnote(footnote_id))
            .flat_map(move |footnote| HtmlTag::new("li").apply(self.node(footnote, Context::default(), None), false));
        let list = HtmlTag::new("ol")
            .class("pydocx-list-style-type-decimal")
            .apply(Box::new(items), false);
        HtmlTag::void("hr").apply(list, false)
    }

    fn node(&self, id: NodeId, ctx: Context, next: Option<NodeId>) -> Events<'_> {
        let tree = self.tree;
        match tree.kind(id) {
            NodeKind::Body | NodeKind::Footnote { .. } => {
                let finish = deferred(move || from_vec(self.state.borrow_mut().borders.finish()));
                Box::new(self.blocks(id, ctx).chain(finish))
            }
            NodeKind::Paragraph(_) => self.paragraph(id, ctx, next),
            NodeKind::Run(_) => self.run(id, ctx, next),
            NodeKind::Text(text) => text_events(text),
            NodeKind::DeletedText(text) => HtmlTag::new("span").class("pydocx-delete").apply(text_events(text), false),
            NodeKind::Break(kind) => {
                let name = match kind {
                    BreakKind::Line => "br",
                    BreakKind::Page => "hr",
                };
                single(HtmlTag::void(name).open())
            }
            NodeKind::TabChar => HtmlTag::new("span")
                .class("pydocx-tab")
                .allowing_whitespace()
                .apply(nothing(), true),
            NodeKind::NoBreakHyphen => single(OutputEvent::text("-")),
            NodeKind::Table => self.table(id, ctx),
            NodeKind::TableRow => HtmlTag::new("tr").apply(self.children(id, ctx), true),
            NodeKind::TableCell(props) => self.table_cell(id, props, ctx),
            NodeKind::Hyperlink { target, anchor } => {
                // An anchor only applies to links within the document
                let href = match (target, anchor) {
                    (Some(target), _) => Some(target.clone()),
                    (None, Some(anchor)) => Some(format!("#{}", anchor)),
                    (None, None) => None,
                };
                self.link(id, href, ctx, false)
            }
            NodeKind::SimpleField { instr } => {
                let href = FieldInstruction::parse(instr).and_then(|instruction| instruction.hyperlink_target());
                match href {
                    Some(href) => self.link(id, Some(href), ctx, true),
                    None => self.children(id, ctx),
                }
            }
            NodeKind::Drawing(image) => self.drawing(image),
            NodeKind::VmlImageData(image) => self.vml_image(image),
            NodeKind::InsertedRun => HtmlTag::new("span")
                .class("pydocx-insert")
                .apply(self.children(id, ctx), true),
            NodeKind::FootnoteReference { id: footnote_id } => match self.discovery.footnote_number(footnote_id) {
                Some(number) => HtmlTag::new("a")
                    .attr("href", format!("#footnote-{}", footnote_id))
                    .attr("name", format!("footnote-ref-{}", footnote_id))
                    .apply(single(OutputEvent::text(number.to_string())), false),
                None => nothing(),
            },
            NodeKind::FootnoteReferenceMark => self.footnote_mark(id),
            NodeKind::VmlShape
            | NodeKind::EmbeddedObject
            | NodeKind::SmartTag
            | NodeKind::DeletedRun
            | NodeKind::StructuredDocumentTag
            | NodeKind::SdtContent => self.children(id, ctx),
            NodeKind::Document
            | NodeKind::FieldChar(_)
            | NodeKind::FieldCode(_)
            | NodeKind::Bookmark { .. }
            | NodeKind::Unknown(_) => {
                trace!("Nothing to render for {:?}", tree.kind(id));
                nothing()
            }
        }
    }

    /// Children in order, each told its following sibling
    fn children(&self, id: NodeId, ctx: Context) -> Events<'_> {
        let children = self.tree.children(id);
        Box::new(
            children
                .iter()
                .enumerate()
                .flat_map(move |(i, &child)| self.node(child, ctx, children.get(i + 1).copied())),
        )
    }

    /// Children regrouped into lists
    fn blocks(&self, id: NodeId, ctx: Context) -> Events<'_> {
        let ctx = Context {
            list_item_child: false,
            list_owner: None,
            ..ctx
        };
        let mut blocks = regroup(self.tree, self.tree.children(id)).peekable();
        Box::new(
            iter::from_fn(move || {
                let block = blocks.next()?;
                let next = match blocks.peek() {
                    Some(Block::Node(next)) => Some(*next),
                    _ => None,
                };
                Some(self.block(block, ctx, next))
            })
            .flatten(),
        )
    }

    fn block(&self, block: Block, ctx: Context, next: Option<NodeId>) -> Events<'_> {
        match block {
            Block::Node(id) => self.node(id, ctx, next),
            Block::Span(span) => self.numbering_span(span, ctx),
        }
    }

    fn numbering_span(&self, span: NumberingSpan, ctx: Context) -> Events<'_> {
        trace!("Rendering list {} at level {}", span.num_id, span.level);
        let tag = if span.bullet {
            HtmlTag::new("ul")
        } else {
            HtmlTag::new("ol").class(format!("pydocx-list-style-type-{}", span.format))
        };
        let level = self.tree.numbering.level(&span.num_id, &span.level.to_string());
        let step = self.tree.numbering.indentation_step(&span.num_id);
        let items = span
            .items
            .into_iter()
            .flat_map(move |item| self.numbering_item(item, level, step, ctx));
        tag.apply(Box::new(items), true)
    }

    /// A list item; adjacent non-empty paragraphs are separated by `<br />`.
    ///
    /// The item is indented by the extra indentation of its first paragraph
    /// relative to `level`.
    fn numbering_item(
        &self,
        item: NumberingItem,
        level: Option<&'t NumberingLevel>,
        step: i64,
        ctx: Context,
    ) -> Events<'_> {
        let first_paragraph = match item.children.first() {
            Some(Block::Node(id)) if self.tree.kind(*id).is_paragraph() => Some(*id),
            _ => None,
        };
        let mut tag = HtmlTag::new("li");
        if let (Some(paragraph), Some(level)) = (first_paragraph, level) {
            tag = tag.style(&list_indentation(self.tree, paragraph, level, step, ctx.list_owner, false));
        }
        let ctx = Context {
            list_owner: first_paragraph,
            ..ctx
        };
        let mut blocks = item.children.into_iter().peekable();
        let mut previous_was_paragraph = false;
        let mut seen_content = false;
        let content = iter::from_fn(move || {
            let block = blocks.next()?;
            let next = match blocks.peek() {
                Some(Block::Node(next)) => Some(*next),
                _ => None,
            };
            let is_paragraph = matches!(&block, Block::Node(id) if self.tree.kind(*id).is_paragraph());
            let ctx = Context {
                in_list: true,
                list_item_child: is_paragraph,
                ..ctx
            };
            let (events, visible) = probe(self.block(block, ctx, next));
            let separate = visible && is_paragraph && previous_was_paragraph && seen_content;
            previous_was_paragraph = is_paragraph;
            seen_content |= visible;
            if !separate {
                return Some(events);
            }
            let separated: Events = Box::new(iter::once(HtmlTag::void("br").open()).chain(events));
            Some(separated)
        })
        .flatten();
        tag.apply(Box::new(content), true)
    }

    fn paragraph(&self, id: NodeId, ctx: Context, next: Option<NodeId>) -> Events<'_> {
        deferred(move || {
            let tree = self.tree;
            let Some(props) = tree.paragraph_properties(id) else {
                return nothing();
            };
            let style = BoxStyle::of_paragraph(props);
            let heading = tree.heading_style(id);
            let child_ctx = Context {
                in_heading: heading.is_some(),
                list_item_child: false,
                ..ctx
            };
            let (mut content, visible) = probe(self.children(id, child_ctx));
            if !visible && style.is_none() {
                trace!("Skipping empty paragraph {:?}", id);
                return nothing();
            }

            if let Some(class) = justification_class(props) {
                content = HtmlTag::new("span").class(class).apply(content, false);
            }
            let indentation = paragraph_indentation(tree, id);
            if !indentation.is_empty() {
                content = HtmlTag::new("span").style(&indentation).apply(content, false);
            }
            if let Some(tag) = self.paragraph_tag(id, heading, ctx) {
                content = tag.apply(content, true);
            }

            let enter = self.state.borrow_mut().borders.enter(
                BorderChannel::Paragraph,
                tree.parent(id),
                style.as_ref(),
                props.numbering.as_ref(),
            );
            let leave = deferred(move || {
                let next_style = next
                    .filter(|&next| tree.kind(next).is_paragraph())
                    .map(|next| tree.paragraph_properties(next).and_then(BoxStyle::of_paragraph));
                from_vec(self.state.borrow_mut().borders.leave(
                    BorderChannel::Paragraph,
                    style.as_ref(),
                    next_style.as_ref().map(Option::as_ref),
                    Some(props),
                ))
            });
            Box::new(enter.into_iter().chain(content).chain(leave))
        })
    }

    fn paragraph_tag(&self, id: NodeId, heading: Option<&Style>, ctx: Context) -> Option<HtmlTag> {
        if let Some(heading) = heading {
            if ctx.in_list {
                return Some(HtmlTag::new("strong"));
            }
            let tag = HtmlTag::new(self.heading_tag(heading));
            return Some(match self.tree.bookmark_name(id) {
                Some(name) => tag.attr("id", name),
                None => tag,
            });
        }
        let in_structured_tag = self
            .tree
            .ancestors(id)
            .any(|ancestor| matches!(self.tree.kind(ancestor), NodeKind::StructuredDocumentTag));
        if ctx.list_item_child || in_structured_tag {
            return None;
        }
        Some(HtmlTag::new("p"))
    }

    fn heading_tag(&self, style: &Style) -> &'static str {
        let name = style.name.as_deref().unwrap_or_default().to_lowercase();
        HEADING_TAGS
            .iter()
            .find(|(heading, _)| *heading == name)
            .map(|(_, tag)| *tag)
            .unwrap_or_else(|| self.default_heading_tag())
    }

    fn default_heading_tag(&self) -> &'static str {
        HEADING_TAGS
            .iter()
            .map(|(_, tag)| *tag)
            .find(|tag| *tag == self.options.default_heading_tag)
            .unwrap_or("h6")
    }

    fn run(&self, id: NodeId, ctx: Context, next: Option<NodeId>) -> Events<'_> {
        deferred(move || {
            let tree = self.tree;
            let Some(props) = tree.run_properties(id) else {
                return nothing();
            };
            let mut content = self.children(id, ctx);
            for format in RunFormat::ORDER {
                if !format.is_set(props) {
                    continue;
                }
                if ctx.in_heading && !format.allowed_in_heading() {
                    continue;
                }
                if format == RunFormat::Underline && ctx.suppress_underline {
                    continue;
                }
                content = format.apply(props, content);
            }

            let style = BoxStyle::of_run(props);
            let enter = self
                .state
                .borrow_mut()
                .borders
                .enter(BorderChannel::Run, tree.parent(id), style.as_ref(), None);
            let leave = deferred(move || {
                let next_style = next
                    .filter(|&next| tree.kind(next).is_run())
                    .map(|next| tree.run_properties(next).and_then(BoxStyle::of_run));
                from_vec(self.state.borrow_mut().borders.leave(
                    BorderChannel::Run,
                    style.as_ref(),
                    next_style.as_ref().map(Option::as_ref),
                    None,
                ))
            });
            Box::new(enter.into_iter().chain(content).chain(leave))
        })
    }

    /// Link around the children; runs inside never get an underline
    fn link(&self, id: NodeId, href: Option<String>, ctx: Context, allow_empty: bool) -> Events<'_> {
        let ctx = Context {
            suppress_underline: true,
            ..ctx
        };
        let content = self.children(id, ctx);
        match href {
            Some(href) => HtmlTag::new("a").attr("href", href).apply(content, allow_empty),
            None => content,
        }
    }

    fn table(&self, id: NodeId, ctx: Context) -> Events<'_> {
        deferred(move || {
            let close = {
                let mut state = self.state.borrow_mut();
                state.tables.insert(id, TableGrid::new(self.tree, id));
                state.borders.close(BorderChannel::Paragraph)
            };
            let ctx = Context {
                list_item_child: false,
                ..ctx
            };
            let table = HtmlTag::new("table")
                .attr("border", "1")
                .apply(self.children(id, ctx), true);
            Box::new(close.into_iter().chain(table))
        })
    }

    fn table_cell(&self, id: NodeId, props: &TableCellProperties, ctx: Context) -> Events<'_> {
        if is_merge_continuation(props) {
            return nothing();
        }
        let row_span = self
            .tree
            .parent(id)
            .and_then(|row| self.tree.parent(row))
            .and_then(|table| self.state.borrow().tables.get(&table).map(|grid| grid.row_span(id)))
            .unwrap_or(1);
        let mut tag = HtmlTag::new("td");
        let col_span = column_span(props);
        if col_span > 1 {
            tag = tag.attr("colspan", col_span.to_string());
        }
        if row_span > 1 {
            tag = tag.attr("rowspan", row_span.to_string());
        }
        if let Some(color) = props.background_color() {
            let mut css = Declarations::new();
            css.set("background-color", format!("#{}", color));
            tag = tag.style(&css);
        }
        tag.apply(self.blocks(id, ctx), true)
    }

    fn footnote_mark(&self, id: NodeId) -> Events<'_> {
        let footnote_id = self.tree.ancestors(id).find_map(|ancestor| match self.tree.kind(ancestor) {
            NodeKind::Footnote { id } => Some(id),
            _ => None,
        });
        match footnote_id {
            Some(footnote_id) => HtmlTag::new("a")
                .attr("href", format!("#footnote-ref-{}", footnote_id))
                .attr("name", format!("footnote-{}", footnote_id))
                .apply(single(OutputEvent::text("^")), true),
            None => nothing(),
        }
    }

    fn drawing(&self, image: &DrawingImage) -> Events<'_> {
        let Some(src) = self.image_src(image.source.as_ref()) else {
            return nothing();
        };
        let mut tag = HtmlTag::void("img").attr("src", src);
        if let (Some(width), Some(height)) = (image.width_emu, image.height_emu) {
            if width != 0 && height != 0 {
                tag = tag
                    .attr("width", format!("{:.0}px", width as f64 / EMUS_PER_PIXEL))
                    .attr("height", format!("{:.0}px", height as f64 / EMUS_PER_PIXEL));
            }
        }
        if let Some(rotation) = image.rotation.filter(|rotation| *rotation != 0.0) {
            tag = tag.attr("style", format!("transform: rotate({}deg);", rotation));
        }
        single(tag.open())
    }

    fn vml_image(&self, image: &VmlImage) -> Events<'_> {
        let Some(src) = self.image_src(image.source.as_ref()) else {
            return nothing();
        };
        let mut tag = HtmlTag::void("img").attr("src", src);
        if let (Some(width), Some(height)) = (&image.width, &image.height) {
            tag = tag.attr("width", width.as_str()).attr("height", height.as_str());
        }
        single(tag.open())
    }

    /// `src` of an image: external URIs as-is, package parts as data URIs
    fn image_src(&self, source: Option<&ImageSource>) -> Option<String> {
        match source? {
            ImageSource::External(uri) => Some(uri.clone()),
            ImageSource::Part(name) => {
                if !self.options.embed_images {
                    debug!("Skipping image {}, embedding is disabled", name);
                    return None;
                }
                let Some(data) = self.document.image_data(name) else {
                    debug!("Skipping image {}, no data", name);
                    return None;
                };
                let file_name = name.rsplit('/').next().unwrap_or(name);
                let extension = file_name.rsplit('.').next().unwrap_or(file_name).to_lowercase();
                Some(format!("data:image/{};base64,{}", extension, STANDARD.encode(data)))
            }
        }
    }
}

fn text_events<'a>(text: &str) -> Events<'a> {
    if text.is_empty() {
        return nothing();
    }
    single(OutputEvent::text(text))
}

fn justification_class(props: &ParagraphProperties) -> Option<&'static str> {
    match props.justification.as_deref()? {
        "left" => Some("pydocx-left"),
        "center" => Some("pydocx-center"),
        "right" => Some("pydocx-right"),
        _ => None,
    }
}
