//! Module documentation: front matter and Markdown rendering.

mod front_matter;
mod render;

pub use front_matter::{split_front_matter, FrontMatter, FrontMatterError};
pub use render::{render_document, render_markdown, short_description, LinkIndex, RenderedDocument};
