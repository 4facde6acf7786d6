//! Stylesheet output.

use std::fs;
use std::path::Path;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

use svedocs_render::{theme_css, THEME_CSS_PATH};

use crate::builder::BuildError;

/// Minify CSS using lightningcss.
pub fn minify_css(css: &str) -> Result<String, BuildError> {
    let stylesheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| BuildError::Css(e.to_string()))?;

    let minified = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| BuildError::Css(e.to_string()))?;

    Ok(minified.code)
}

/// Write the theme stylesheet to where pages link it.
pub fn write_theme(out_dir: &Path, minify: bool) -> Result<(), BuildError> {
    let css = if minify {
        minify_css(theme_css())?
    } else {
        theme_css().to_string()
    };

    let path = out_dir.join(THEME_CSS_PATH.trim_start_matches('/'));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::write(parent, e))?;
    }
    fs::write(&path, css).map_err(|e| BuildError::write(&path, e))
}
