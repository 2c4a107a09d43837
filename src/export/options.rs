use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// HTML export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlExportOptions {
    /// Render the footnote list after the body content
    pub include_footnotes: bool,
    /// Inline images stored in the package as data URIs; external
    /// images are always referenced by URI
    pub embed_images: bool,
    /// Size the body to the page width of the document
    pub include_page_width: bool,
    /// Tag for heading styles whose name has no known level
    pub default_heading_tag: String,
}

impl Default for HtmlExportOptions {
    fn default() -> Self {
        Self {
            include_footnotes: true,
            embed_images: true,
            include_page_width: true,
            default_heading_tag: "h6".to_string(),
        }
    }
}

impl HtmlExportOptions {
    /// Reads options from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string(self)?)
    }
}
