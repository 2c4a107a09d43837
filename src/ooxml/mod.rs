//! OOXML (Office Open XML) reading for Word documents (.docx)
//!
//! This module implements the parts of the OPC (Open Packaging Conventions)
//! standard and of WordprocessingML needed to build a [`DocumentTree`]:
//!
//! # Features
//! - Zip package reading with relationship resolution
//! - Main document and footnotes parts mapped onto the arena tree
//! - Style sheet with `basedOn` inheritance and document defaults
//! - Numbering definitions with level overrides
//!
//! # Example
//!
//! ```rust,no_run
//! use docx_html::ooxml::WordprocessingDocument;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file_data = std::fs::read("document.docx")?;
//!     let document = WordprocessingDocument::from_bytes(&file_data)?;
//!     println!("{} nodes", document.tree.len());
//!     Ok(())
//! }
//! ```
//!
//! [`DocumentTree`]: crate::dom::DocumentTree

mod document;
mod error;
mod numbering;
mod opc;
mod styles;
mod types;
mod xml;

pub use document::WordprocessingDocument;
pub use error::OoxmlError;
pub use numbering::NumberingDefinitions;
pub use opc::{resolve_target, OpcPackage};
pub use styles::StyleSheet;
pub use types::{
    Border,
    Indentation,
    NumberingDefinition,
    NumberingLevel,
    NumberingProperties,
    PackagePart,
    ParagraphBorders,
    ParagraphProperties,
    Relationship,
    RelationshipType,
    RunProperties,
    Shading,
    Style,
    StyleType,
    TableCellProperties,
    VerticalMerge,
};
