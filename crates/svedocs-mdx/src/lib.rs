//! Markdown compiler for svedocs pages.
//!
//! Extracts YAML frontmatter, renders the body to HTML with `pulldown-cmark`
//! and collects a table of contents from the headings.

pub mod frontmatter;
pub mod parser;

pub use frontmatter::{extract_frontmatter, Frontmatter, FrontmatterError};
pub use parser::{compile, slugify, CompileOptions, CompiledDoc, ParseError, TocEntry};
