//! Page components backed by route files.

use std::sync::Arc;

use minijinja::{context, Environment, ErrorKind, State};

use svedocs_config::SiteConfig;
use svedocs_mdx::CompiledDoc;
use svedocs_routes::{Component, HandlerError, RenderContext, Rendered};

use crate::templates::{LayoutContext, LayoutPage, TemplateEngine};
use crate::RenderError;

/// A compiled markdown page.
///
/// Rendered inside the site layout unless its frontmatter sets
/// `layout: false`.
pub struct MarkdownPage {
    doc: CompiledDoc,
    engine: Arc<TemplateEngine>,
    site: Arc<SiteConfig>,
}

impl MarkdownPage {
    pub fn new(doc: CompiledDoc, engine: Arc<TemplateEngine>, site: Arc<SiteConfig>) -> Self {
        Self { doc, engine, site }
    }

    fn uses_layout(&self) -> bool {
        self.doc.frontmatter.as_ref().map_or(true, |f| f.layout)
    }
}

impl Component for MarkdownPage {
    fn render(&self, ctx: &RenderContext<'_>) -> Result<Rendered, HandlerError> {
        let body = if self.uses_layout() {
            self.engine.render_layout(
                &self.site,
                &LayoutContext {
                    page: LayoutPage {
                        title: self.doc.title(),
                        description: self.doc.description(),
                        frontmatter: self.doc.frontmatter.as_ref(),
                    },
                    content: &self.doc.html,
                    toc: &self.doc.toc,
                    pathname: ctx.pathname,
                    params: ctx.params,
                },
            )?
        } else {
            self.doc.html.clone()
        };

        Ok(Rendered {
            head: String::new(),
            body,
            title: self.doc.title().map(str::to_string),
            description: self.doc.description().map(str::to_string),
        })
    }
}

/// A minijinja template page.
///
/// The `head`, `body`, `title` and `description` blocks provide the
/// fragments. A template without a `body` block renders whole as the body.
pub struct TemplatePage {
    name: String,
    env: Arc<Environment<'static>>,
    site: Arc<SiteConfig>,
}

impl TemplatePage {
    /// `name` is the template's path inside the environment's loader.
    pub fn new(name: impl Into<String>, env: Arc<Environment<'static>>, site: Arc<SiteConfig>) -> Self {
        Self {
            name: name.into(),
            env,
            site,
        }
    }
}

impl Component for TemplatePage {
    fn render(&self, ctx: &RenderContext<'_>) -> Result<Rendered, HandlerError> {
        let tmpl = self.env.get_template(&self.name).map_err(RenderError::from)?;
        let values = context! {
            site => &*self.site,
            pathname => ctx.pathname,
            params => ctx.params,
        };
        let mut state = tmpl.eval_to_state(values.clone()).map_err(RenderError::from)?;

        let body = match block(&mut state, "body")? {
            Some(body) => body,
            None => tmpl.render(values).map_err(RenderError::from)?,
        };
        let head = block(&mut state, "head")?.unwrap_or_default();
        let title = block(&mut state, "title")?
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let description = block(&mut state, "description")?
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Rendered {
            head,
            body,
            title,
            description,
        })
    }
}

/// Render a named block, `None` if the template does not define it.
fn block(state: &mut State<'_, '_>, name: &str) -> Result<Option<String>, RenderError> {
    match state.render_block(name) {
        Ok(html) => Ok(Some(html)),
        Err(e) if e.kind() == ErrorKind::UnknownBlock => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svedocs_mdx::{compile, CompileOptions};
    use svedocs_routes::Params;

    fn render(component: &dyn Component, pathname: &str, params: &Params) -> Rendered {
        component
            .render(&RenderContext { pathname, params })
            .unwrap()
    }

    fn markdown(source: &str) -> MarkdownPage {
        let site = Arc::new(SiteConfig::default());
        let engine = Arc::new(TemplateEngine::new(&site).unwrap());
        let doc = compile(source, &CompileOptions::default()).unwrap();
        MarkdownPage::new(doc, engine, site)
    }

    #[test]
    fn markdown_page_renders_in_layout() {
        let page = markdown("---\ntitle: Intro\ndescription: First steps\n---\n# Welcome\n");

        let rendered = render(&page, "/intro", &Params::new());

        assert!(rendered.body.contains(r#"<article class="svedocs-content">"#));
        assert!(rendered.body.contains(r#"<h1 id="welcome">Welcome</h1>"#));
        assert_eq!(rendered.title.as_deref(), Some("Intro"));
        assert_eq!(rendered.description.as_deref(), Some("First steps"));
        assert!(rendered.head.is_empty());
    }

    #[test]
    fn markdown_page_without_layout() {
        let page = markdown("---\nlayout: false\n---\n# Bare\n");

        let rendered = render(&page, "/bare", &Params::new());

        assert_eq!(rendered.body.trim(), r#"<h1 id="bare">Bare</h1>"#);
        assert_eq!(rendered.title.as_deref(), Some("Bare"));
    }

    fn template_env(name: &'static str, source: &'static str) -> Arc<Environment<'static>> {
        let mut env = Environment::new();
        env.add_template(name, source).unwrap();
        Arc::new(env)
    }

    #[test]
    fn template_page_renders_blocks() {
        let env = template_env(
            "users/[name].html",
            "{% block title %} Profile {% endblock %}\
             {% block head %}<meta name=\"robots\" content=\"noindex\">{% endblock %}\
             {% block body %}<h1>Hello {{ params.name }}</h1>{% endblock %}",
        );
        let page = TemplatePage::new("users/[name].html", env, Arc::new(SiteConfig::default()));
        let params = Params::from([("name".to_string(), svedocs_routes::Param::One("ada".to_string()))]);

        let rendered = render(&page, "/users/ada", &params);

        assert_eq!(rendered.body, "<h1>Hello ada</h1>");
        assert_eq!(rendered.head, r#"<meta name="robots" content="noindex">"#);
        assert_eq!(rendered.title.as_deref(), Some("Profile"));
        assert_eq!(rendered.description, None);
    }

    #[test]
    fn template_without_blocks_renders_whole() {
        let env = template_env("about.html", "<p>{{ site.title }}</p>");
        let page = TemplatePage::new("about.html", env, Arc::new(SiteConfig::default()));

        let rendered = render(&page, "/about", &Params::new());

        assert_eq!(rendered.body, "<p>svedocs</p>");
        assert!(rendered.head.is_empty());
        assert_eq!(rendered.title, None);
    }
}
