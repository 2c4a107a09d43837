//! Document node variants.

use once_cell::unsync::OnceCell;

use crate::ooxml::{ParagraphProperties, RunProperties, TableCellProperties};

/// Handle of a node in a [`DocumentTree`](super::DocumentTree)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Kind of a `w:br`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
    Line,
    Page,
}

/// Kind of a `w:fldChar`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCharKind {
    Begin,
    Separate,
    End,
}

impl FieldCharKind {
    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "begin" => Some(FieldCharKind::Begin),
            "separate" => Some(FieldCharKind::Separate),
            "end" => Some(FieldCharKind::End),
            _ => None,
        }
    }
}

/// Where the bytes of an image live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A part inside the package
    Part(String),
    /// A URI outside the package, used as-is
    External(String),
}

/// A DrawingML picture (`w:drawing`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawingImage {
    pub source: Option<ImageSource>,
    /// Extent width in EMUs
    pub width_emu: Option<i64>,
    /// Extent height in EMUs
    pub height_emu: Option<i64>,
    /// Rotation in degrees
    pub rotation: Option<f64>,
}

/// A VML image (`v:imagedata`), sized by its enclosing shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VmlImage {
    pub source: Option<ImageSource>,
    /// CSS length, e.g. `41pt`
    pub width: Option<String>,
    pub height: Option<String>,
}

/// Closed set of node variants
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Body,
    /// Paragraph with its local (direct) properties
    Paragraph(ParagraphProperties),
    /// Run with its local (direct) properties
    Run(RunProperties),
    Text(String),
    DeletedText(String),
    Break(BreakKind),
    TabChar,
    NoBreakHyphen,
    Table,
    TableRow,
    TableCell(TableCellProperties),
    Hyperlink {
        /// Resolved external target
        target: Option<String>,
        /// Bookmark inside the document
        anchor: Option<String>,
    },
    Drawing(DrawingImage),
    /// `w:pict` and `v:shape` containers
    VmlShape,
    VmlImageData(VmlImage),
    EmbeddedObject,
    Footnote { id: String },
    FootnoteReference { id: String },
    /// The mark at the start of a footnote's own text
    FootnoteReferenceMark,
    FieldChar(FieldCharKind),
    FieldCode(String),
    SimpleField { instr: String },
    Bookmark { name: String },
    SmartTag,
    InsertedRun,
    DeletedRun,
    StructuredDocumentTag,
    SdtContent,
    /// An element the reader does not model
    Unknown(String),
}

impl NodeKind {
    pub fn is_paragraph(&self) -> bool {
        matches!(self, NodeKind::Paragraph(_))
    }

    pub fn is_run(&self) -> bool {
        matches!(self, NodeKind::Run(_))
    }
}

/// Resolved properties cached on a node
#[derive(Debug, Clone, PartialEq)]
pub enum EffectiveProperties {
    Paragraph(ParagraphProperties),
    Run(RunProperties),
    None,
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub(crate) effective: OnceCell<EffectiveProperties>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Node {
            kind,
            parent,
            children: Vec::new(),
            effective: OnceCell::new(),
        }
    }
}
