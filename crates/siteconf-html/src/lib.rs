//! Lenient HTML parsing and XPath querying.
//!
//! Response bodies are parsed with libxml2's HTML parser (forgiving of
//! unclosed tags and missing quotes, the way a browser or `lxml.html` is)
//! rather than a strict XML parser, and every selector-shaped option in a
//! structure node (`content`, `file_content`, `assert`) evaluates as XPath
//! against the resulting document.

mod document;
mod links;
mod node;

pub use document::{Document, HtmlError, Result};
pub use links::{extract_links, LinkEl};
pub use node::Node;
