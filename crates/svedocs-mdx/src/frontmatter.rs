//! Frontmatter extraction and parsing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Parsed frontmatter of a markdown page.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Frontmatter {
    /// Page title
    #[serde(default)]
    pub title: Option<String>,

    /// Page description, emitted as a meta tag
    #[serde(default)]
    pub description: Option<String>,

    /// Wrap the page in the site layout (`layout: false` renders it bare)
    #[serde(default = "default_true")]
    pub layout: bool,

    /// Any other keys, exposed to the layout as page data
    #[serde(flatten)]
    pub data: BTreeMap<String, serde_yaml::Value>,
}

fn default_true() -> bool {
    true
}

impl Default for Frontmatter {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            layout: true,
            data: BTreeMap::new(),
        }
    }
}

/// Extract frontmatter from markdown source.
///
/// Returns the parsed frontmatter and the remaining content after the frontmatter block.
pub fn extract_frontmatter(source: &str) -> Result<(Option<Frontmatter>, &str), FrontmatterError> {
    let trimmed = source.trim_start();

    let Some(after_open) = trimmed
        .strip_prefix("---\n")
        .or_else(|| trimmed.strip_prefix("---\r\n"))
    else {
        return Ok((None, source));
    };

    // An empty block closes immediately.
    let (yaml_content, remaining) = if let Some(rest) = after_open.strip_prefix("---") {
        ("", rest)
    } else {
        let Some(close_pos) = after_open.find("\n---") else {
            return Err(FrontmatterError::Unclosed);
        };
        (&after_open[..close_pos], &after_open[close_pos + 4..])
    };

    let frontmatter = if yaml_content.trim().is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str(yaml_content)
            .map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?
    };

    Ok((Some(frontmatter), remaining.trim_start()))
}

/// Errors that can occur when parsing frontmatter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unclosed frontmatter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in frontmatter: {0}")]
    InvalidYaml(String),
}
