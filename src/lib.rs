//! Conversion of Word documents (.docx) to semantic HTML.
//!
//! ```rust,no_run
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file_data = std::fs::read("document.docx")?;
//!     let html = docx_html::docx_to_html(&file_data)?;
//!     println!("{}", html);
//!     Ok(())
//! }
//! ```

pub mod dom;
pub mod error;
pub mod export;
pub mod ooxml;

pub use error::ExportError;
pub use export::{HtmlExportOptions, HtmlExporter};
pub use ooxml::WordprocessingDocument;

/// Converts `.docx` bytes to an HTML document with default options
pub fn docx_to_html(file_data: &[u8]) -> Result<String, ExportError> {
    docx_to_html_with_options(file_data, HtmlExportOptions::default())
}

pub fn docx_to_html_with_options(file_data: &[u8], options: HtmlExportOptions) -> Result<String, ExportError> {
    let document = WordprocessingDocument::from_bytes(file_data)?;
    Ok(HtmlExporter::new(&document, options).export())
}
