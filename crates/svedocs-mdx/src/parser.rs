//! Markdown page compiler.

use std::collections::HashMap;

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::frontmatter::{extract_frontmatter, Frontmatter, FrontmatterError};

/// Markdown extensions to enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    pub tables: bool,
    pub footnotes: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub smart_punctuation: bool,
    /// Give every heading an `id` derived from its text
    pub heading_ids: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            tables: true,
            footnotes: true,
            strikethrough: true,
            tasklists: true,
            smart_punctuation: true,
            heading_ids: true,
        }
    }
}

impl CompileOptions {
    fn parser_options(&self) -> Options {
        let mut options = Options::ENABLE_HEADING_ATTRIBUTES;
        options.set(Options::ENABLE_TABLES, self.tables);
        options.set(Options::ENABLE_FOOTNOTES, self.footnotes);
        options.set(Options::ENABLE_STRIKETHROUGH, self.strikethrough);
        options.set(Options::ENABLE_TASKLISTS, self.tasklists);
        options.set(Options::ENABLE_SMART_PUNCTUATION, self.smart_punctuation);
        options
    }
}

/// A compiled markdown page.
#[derive(Debug, Clone)]
pub struct CompiledDoc {
    /// Parsed frontmatter (if present)
    pub frontmatter: Option<Frontmatter>,

    /// Rendered HTML body
    pub html: String,

    /// Table of contents entries
    pub toc: Vec<TocEntry>,
}

impl CompiledDoc {
    /// Title from the frontmatter, falling back to the first level-1 heading.
    pub fn title(&self) -> Option<&str> {
        self.frontmatter
            .as_ref()
            .and_then(|f| f.title.as_deref())
            .or_else(|| {
                self.toc
                    .iter()
                    .find(|e| e.level == 1)
                    .map(|e| e.title.as_str())
            })
    }

    /// Description from the frontmatter.
    pub fn description(&self) -> Option<&str> {
        self.frontmatter
            .as_ref()
            .and_then(|f| f.description.as_deref())
    }
}

/// A table of contents entry.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TocEntry {
    /// Heading text
    pub title: String,
    /// Anchor ID
    pub id: String,
    /// Heading level (1-6)
    pub level: u8,
}

/// Errors that can occur when compiling markdown.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Frontmatter error: {0}")]
    Frontmatter(#[from] FrontmatterError),
}

/// Compile a markdown page.
///
/// Extracts frontmatter, renders HTML and generates a table of contents.
pub fn compile(source: &str, options: &CompileOptions) -> Result<CompiledDoc, ParseError> {
    let (frontmatter, content) = extract_frontmatter(source)?;

    let mut events: Vec<Event<'_>> = Parser::new_ext(content, options.parser_options()).collect();
    let mut toc = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    // (index of the heading start event, collected text)
    let mut current_heading: Option<(usize, String)> = None;

    for i in 0..events.len() {
        match &events[i] {
            Event::Start(Tag::Heading { .. }) => {
                current_heading = Some((i, String::new()));
            }

            Event::Text(text) | Event::Code(text) => {
                if let Some((_, ref mut heading_text)) = current_heading {
                    heading_text.push_str(text);
                }
            }

            Event::End(TagEnd::Heading(_)) => {
                let Some((start, title)) = current_heading.take() else {
                    continue;
                };

                let Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) = &events[start]
                else {
                    continue;
                };

                let id = match id {
                    Some(explicit) => explicit.to_string(),
                    None => unique_slug(&slugify(&title), &mut seen),
                };

                toc.push(TocEntry {
                    title,
                    id: id.clone(),
                    level: *level as u8,
                });

                if options.heading_ids {
                    let heading = Tag::Heading {
                        level: *level,
                        id: Some(CowStr::from(id)),
                        classes: classes.clone(),
                        attrs: attrs.clone(),
                    };
                    events[start] = Event::Start(heading);
                }
            }

            _ => {}
        }
    }

    let mut html_output = String::new();
    html::push_html(&mut html_output, events.into_iter());

    Ok(CompiledDoc {
        frontmatter,
        html: html_output,
        toc,
    })
}

/// Make `slug` unique among the headings seen so far.
fn unique_slug(slug: &str, seen: &mut HashMap<String, usize>) -> String {
    let count = seen.entry(slug.to_string()).or_insert(0);
    let unique = if *count == 0 {
        slug.to_string()
    } else {
        format!("{}-{}", slug, count)
    };
    *count += 1;
    unique
}

/// Convert a heading to a URL-safe slug.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn compiles_page_with_frontmatter() {
        let source = r#"---
title: Routing
description: How files become URLs
---

# Routing

Files under the routes directory become pages.

## Dynamic segments

Use `[slug].md` for a parameter.
"#;

        let doc = compile(source, &CompileOptions::default()).unwrap();

        assert_eq!(doc.title(), Some("Routing"));
        assert_eq!(doc.description(), Some("How files become URLs"));
        assert!(doc.html.contains(r#"<h1 id="routing">Routing</h1>"#));
        assert!(doc
            .html
            .contains(r#"<h2 id="dynamic-segments">Dynamic segments</h2>"#));
        assert!(doc.html.contains("<code>[slug].md</code>"));

        assert_eq!(doc.toc.len(), 2);
        assert_eq!(doc.toc[1].id, "dynamic-segments");
        assert_eq!(doc.toc[1].level, 2);
    }

    #[test]
    fn title_falls_back_to_first_heading() {
        let doc = compile("# Just Markdown\n\nNo frontmatter.", &CompileOptions::default()).unwrap();

        assert!(doc.frontmatter.is_none());
        assert_eq!(doc.title(), Some("Just Markdown"));
    }

    #[test]
    fn deduplicates_heading_ids() {
        let doc = compile("## Usage\n\n## Usage\n\n## Usage", &CompileOptions::default()).unwrap();

        let ids: Vec<&str> = doc.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["usage", "usage-1", "usage-2"]);
    }

    #[test]
    fn keeps_explicit_heading_ids() {
        let doc = compile("## Install {#setup}", &CompileOptions::default()).unwrap();

        assert_eq!(doc.toc[0].id, "setup");
        assert!(doc.html.contains(r#"id="setup""#));
    }

    #[test]
    fn heading_ids_can_be_disabled() {
        let options = CompileOptions {
            heading_ids: false,
            ..Default::default()
        };

        let doc = compile("# Plain", &options).unwrap();

        assert!(doc.html.contains("<h1>Plain</h1>"));
        assert_eq!(doc.toc[0].id, "plain");
    }

    #[test]
    fn renders_tables_when_enabled() {
        let source = "| a | b |\n|---|---|\n| 1 | 2 |";

        let with = compile(source, &CompileOptions::default()).unwrap();
        let without = compile(
            source,
            &CompileOptions {
                tables: false,
                ..Default::default()
            },
        )
        .unwrap();

        assert!(with.html.contains("<table>"));
        assert!(!without.html.contains("<table>"));
    }

    #[test]
    fn slugify_works() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("API Reference"), "api-reference");
        assert_eq!(slugify("Button (Primary)"), "button-primary");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
    }
}
