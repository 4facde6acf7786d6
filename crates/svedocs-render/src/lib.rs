//! Page rendering for svedocs.
//!
//! Loads route files from disk into modules (markdown pages, template pages
//! and JSON endpoints), wraps markdown in the site layout and assembles the
//! final HTML document around a page's head and body fragments.

pub mod assets;
pub mod loader;
pub mod pages;
pub mod templates;

pub use assets::{theme_css, THEME_CSS_PATH};
pub use loader::{compile_options, FsModuleLoader};
pub use pages::{MarkdownPage, TemplatePage};
pub use templates::{
    fill_template, LayoutContext, LayoutPage, TemplateEngine, BODY_MARKER, HEAD_MARKER,
    HTML_TEMPLATE, LANG_MARKER,
};

use std::path::PathBuf;

/// Errors that can occur while rendering pages.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Failed to read layout {}: {source}", path.display())]
    Layout {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<RenderError> for svedocs_routes::HandlerError {
    fn from(e: RenderError) -> Self {
        Self::Other(Box::new(e))
    }
}
