//! Template engine for the document head, the site layout and the HTML shell.

use std::fs;

use minijinja::{context, Environment, HtmlEscape, Value};
use serde::Serialize;

use svedocs_config::SiteConfig;
use svedocs_mdx::{Frontmatter, TocEntry};
use svedocs_routes::{Params, Rendered};

use crate::assets::THEME_CSS_PATH;
use crate::RenderError;

/// Marker replaced by the document language.
pub const LANG_MARKER: &str = "%svedocs.lang%";

/// Marker replaced by the head fragment.
pub const HEAD_MARKER: &str = "<!--%svedocs.head%-->";

/// Marker replaced by the body fragment.
pub const BODY_MARKER: &str = "<!--%svedocs.body%-->";

/// The document every page is rendered into.
pub const HTML_TEMPLATE: &str = r#"<!doctype html>
<html lang="%svedocs.lang%">
    <head>
        <meta charset="utf-8" />
        <meta name="viewport" content="width=device-width, initial-scale=1" />
        <!--%svedocs.head%-->
    </head>
    <body>
        <div id="__svedocs" style="display: contents"><!--%svedocs.body%--></div>
    </body>
</html>"#;

/// Substitute the language and the head and body fragments into
/// [`HTML_TEMPLATE`].
///
/// Markers appearing inside the fragments are left alone.
pub fn fill_template(lang: &str, head: &str, body: &str) -> String {
    let (before_lang, rest) = HTML_TEMPLATE
        .split_once(LANG_MARKER)
        .unwrap_or((HTML_TEMPLATE, ""));
    let (before_head, rest) = rest.split_once(HEAD_MARKER).unwrap_or((rest, ""));
    let (between, after_body) = rest.split_once(BODY_MARKER).unwrap_or((rest, ""));

    let mut html = String::with_capacity(HTML_TEMPLATE.len() + head.len() + body.len());
    html.push_str(before_lang);
    html.push_str(&HtmlEscape(lang).to_string());
    html.push_str(before_head);
    html.push_str(head);
    html.push_str(between);
    html.push_str(body);
    html.push_str(after_body);
    html
}

/// Tags that must not get a closing tag.
const VOID_TAGS: [&str; 3] = ["meta", "link", "base"];

/// Render the configured head tags.
///
/// Built outside the template so tag and attribute names stay literal.
fn render_head_tags(site: &SiteConfig) -> String {
    let mut out = String::new();

    for (name, entries) in &site.head {
        for attrs in entries {
            out.push('<');
            out.push_str(name);
            for (key, value) in attrs {
                out.push_str(&format!(" {}=\"{}\"", key, HtmlEscape(value)));
            }
            if VOID_TAGS.contains(&name.as_str()) {
                out.push_str(" />");
            } else {
                out.push_str(&format!("></{}>", name));
            }
            out.push('\n');
        }
    }

    out
}

/// Page values exposed to the layout.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayoutPage<'a> {
    /// Page title
    pub title: Option<&'a str>,
    /// Page description
    pub description: Option<&'a str>,
    /// Full frontmatter, including custom keys
    pub frontmatter: Option<&'a Frontmatter>,
}

/// Everything the layout template can see.
#[derive(Debug, Clone)]
pub struct LayoutContext<'a> {
    pub page: LayoutPage<'a>,
    pub content: &'a str,
    pub toc: &'a [TocEntry],
    pub pathname: &'a str,
    pub params: &'a Params,
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create an engine with the built-in head template and either the
    /// site's custom layout or the default theme layout.
    pub fn new(site: &SiteConfig) -> Result<Self, RenderError> {
        let mut env = Environment::new();

        env.add_template_owned("head.html".to_string(), HEAD_TEMPLATE.to_string())?;

        let layout = match &site.layout {
            Some(path) => fs::read_to_string(path).map_err(|source| RenderError::Layout {
                path: path.clone(),
                source,
            })?,
            None => LAYOUT_TEMPLATE.to_string(),
        };
        env.add_template_owned("layout.html".to_string(), layout)?;

        Ok(Self { env })
    }

    /// Render the site-level head tags for a page.
    pub fn render_head(&self, site: &SiteConfig, rendered: &Rendered) -> Result<String, RenderError> {
        let tmpl = self.env.get_template("head.html")?;

        Ok(tmpl.render(context! {
            title => site.page_title(rendered.title.as_deref()),
            description => rendered.description.as_deref().unwrap_or(&site.description),
            tags => Value::from_safe_string(render_head_tags(site)),
            theme_css => Value::from_safe_string(format!(
                "{}{}",
                site.base.trim_end_matches('/'),
                THEME_CSS_PATH
            )),
        })?)
    }

    /// Wrap page content in the site layout.
    pub fn render_layout(
        &self,
        site: &SiteConfig,
        ctx: &LayoutContext<'_>,
    ) -> Result<String, RenderError> {
        let tmpl = self.env.get_template("layout.html")?;

        Ok(tmpl.render(context! {
            site => site,
            base => site.base.trim_end_matches('/'),
            page => &ctx.page,
            content => ctx.content,
            toc => ctx.toc,
            pathname => ctx.pathname,
            params => ctx.params,
        })?)
    }

    /// Assemble the full HTML document for a rendered page.
    ///
    /// `extra_head` is appended after the page's own head fragment.
    pub fn render_document(
        &self,
        site: &SiteConfig,
        rendered: &Rendered,
        extra_head: &str,
    ) -> Result<String, RenderError> {
        let mut head = self.render_head(site, rendered)?;
        if !rendered.head.is_empty() {
            head.push('\n');
            head.push_str(&rendered.head);
        }
        if !extra_head.is_empty() {
            head.push('\n');
            head.push_str(extra_head);
        }

        Ok(fill_template(&site.lang, &head, &rendered.body))
    }
}

const HEAD_TEMPLATE: &str = r##"<title>{{ title }}</title>
<meta name="description" content="{{ description }}" />
{{ tags }}<link rel="stylesheet" href="{{ theme_css }}" />"##;

const LAYOUT_TEMPLATE: &str = r##"<div class="svedocs">
  <header class="svedocs-header">
    <a href="{{ base | safe }}/" class="svedocs-logo">{{ site.title }}</a>
  </header>
  <div class="svedocs-main">
    <article class="svedocs-content">
      {{ content | safe }}
    </article>
    {% if toc | length > 1 %}
    <aside class="svedocs-toc">
      <h2>On this page</h2>
      <ul>
      {% for entry in toc %}{% if entry.level > 1 %}
        <li class="toc-level-{{ entry.level }}"><a href="#{{ entry.id }}">{{ entry.title }}</a></li>
      {% endif %}{% endfor %}
      </ul>
    </aside>
    {% endif %}
  </div>
</div>"##;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn rendered(title: Option<&str>) -> Rendered {
        Rendered {
            head: String::new(),
            body: "<p>Hello world</p>".to_string(),
            title: title.map(str::to_string),
            description: None,
        }
    }

    #[test]
    fn fills_both_markers() {
        let html = fill_template("de", "<title>T</title>", "<main>B</main>");

        assert!(html.contains("<title>T</title>"));
        assert!(html.contains(r#"<div id="__svedocs" style="display: contents"><main>B</main></div>"#));
        assert!(html.contains(r#"<html lang="de">"#));
        assert!(!html.contains(LANG_MARKER));
        assert!(!html.contains(HEAD_MARKER));
        assert!(!html.contains(BODY_MARKER));
    }

    #[test]
    fn markers_inside_fragments_are_not_expanded() {
        let html = fill_template("en", BODY_MARKER, "body");

        assert_eq!(html.matches(BODY_MARKER).count(), 1);
        assert!(html.contains(">body</div>"));
    }

    #[test]
    fn renders_document_head() {
        let site = SiteConfig {
            title: "My Docs".to_string(),
            title_template: ":title - My Docs".to_string(),
            ..Default::default()
        };
        let engine = TemplateEngine::new(&site).unwrap();

        let html = engine
            .render_document(&site, &rendered(Some("Intro")), "<script src=\"/__hmr.js\"></script>")
            .unwrap();

        assert!(html.contains("<title>Intro - My Docs</title>"));
        assert!(html.contains(r#"content="documentation for the rest of us""#));
        assert!(html.contains(r#"<html lang="en-us">"#));
        assert!(html.contains(r#"href="/@svedocs/theme.css""#));
        assert!(html.contains("<script src=\"/__hmr.js\"></script>"));
        assert!(html.contains("<p>Hello world</p>"));
    }

    #[test]
    fn renders_configured_head_tags_escaped() {
        let mut head = BTreeMap::new();
        head.insert(
            "link".to_string(),
            vec![BTreeMap::from([
                ("rel".to_string(), "icon".to_string()),
                ("href".to_string(), "/favicon.svg".to_string()),
            ])],
        );
        head.insert(
            "script".to_string(),
            vec![BTreeMap::from([("src".to_string(), "/a.js?x=\"1\"".to_string())])],
        );
        let site = SiteConfig {
            head,
            ..Default::default()
        };
        let engine = TemplateEngine::new(&site).unwrap();

        let html = engine.render_head(&site, &rendered(None)).unwrap();

        assert!(html.contains(r#"<link href="&#x2f;favicon.svg" rel="icon" />"#));
        assert!(html.contains(r#"<script src="&#x2f;a.js?x=&quot;1&quot;"></script>"#));
        assert!(html.contains("<title>svedocs</title>"));
    }

    #[test]
    fn default_layout_wraps_content() {
        let site = SiteConfig::default();
        let engine = TemplateEngine::new(&site).unwrap();
        let toc = vec![
            TocEntry {
                title: "Guide".to_string(),
                id: "guide".to_string(),
                level: 1,
            },
            TocEntry {
                title: "Install".to_string(),
                id: "install".to_string(),
                level: 2,
            },
        ];
        let params = Params::new();

        let html = engine
            .render_layout(
                &site,
                &LayoutContext {
                    page: LayoutPage::default(),
                    content: "<h1>Guide</h1>",
                    toc: &toc,
                    pathname: "/guide",
                    params: &params,
                },
            )
            .unwrap();

        assert!(html.contains("<h1>Guide</h1>"));
        assert!(html.contains(r##"<a href="#install">Install</a>"##));
        assert!(html.contains(r#"<a href="/" class="svedocs-logo">svedocs</a>"#));
    }

    #[test]
    fn errors_on_missing_custom_layout() {
        let site = SiteConfig {
            layout: Some("/definitely/missing/layout.html".into()),
            ..Default::default()
        };

        assert!(matches!(
            TemplateEngine::new(&site),
            Err(RenderError::Layout { .. })
        ));
    }
}
