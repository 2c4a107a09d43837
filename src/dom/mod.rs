//! In-memory document object model consumed by the exporter.

mod node;
mod tree;

pub use node::{BreakKind, DrawingImage, EffectiveProperties, FieldCharKind, ImageSource, Node, NodeId, NodeKind, VmlImage};
pub use tree::{Descendants, DocumentTree};
