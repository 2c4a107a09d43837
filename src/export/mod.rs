//! HTML export of WordprocessingML documents
//!
//! The export runs in two passes over a copy of the document tree:
//!
//! # Features
//! - Discovery pass collecting complex field runs and footnote order
//! - Complex fields rewritten into simple field nodes before rendering
//! - Lazy render pass producing [`OutputEvent`]s
//! - Flat list paragraphs regrouped into nested `ul`/`ol` lists
//! - Border and shading wrappers shared by adjacent paragraphs and runs
//! - Document shell with a default stylesheet

pub mod borders;
pub mod discovery;
pub mod event;
pub mod fields;
mod html;
mod indentation;
pub mod numbering;
mod options;
pub mod table;
mod visitor;

pub use event::{Events, HtmlTag, OutputEvent};
pub use html::HtmlExporter;
pub use indentation::twips_to_em;
pub use options::HtmlExportOptions;
pub use visitor::Renderer;
