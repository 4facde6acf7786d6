//! Loads route files from disk.
//!
//! - `.md` files compile to [`MarkdownPage`]s
//! - `.html` files become [`TemplatePage`]s that may include or extend
//!   other templates in the routes directory
//! - `.json` files are endpoints: every top-level key is an export

use std::fs;
use std::path::Path;
use std::sync::Arc;

use minijinja::{path_loader, Environment};
use serde_json::Value;

use svedocs_config::{MarkdownOptions, SiteConfig};
use svedocs_mdx::{compile, CompileOptions};
use svedocs_routes::{
    Endpoint, Handler, HandlerError, HandlerEvent, LoadError, Module, ModuleLoader,
};

use crate::pages::{MarkdownPage, TemplatePage};
use crate::templates::TemplateEngine;
use crate::RenderError;

/// Module loader reading route files from the routes directory.
///
/// Files are read on every load, so edits show up without a restart.
pub struct FsModuleLoader {
    site: Arc<SiteConfig>,
    engine: Arc<TemplateEngine>,
}

impl FsModuleLoader {
    /// Create a loader for a site.
    ///
    /// Fails if the site's custom layout cannot be read or parsed.
    pub fn new(site: Arc<SiteConfig>) -> Result<Self, RenderError> {
        let engine = Arc::new(TemplateEngine::new(&site)?);
        Ok(Self { site, engine })
    }

    /// The template engine shared by every page this loader creates.
    pub fn engine(&self) -> Arc<TemplateEngine> {
        Arc::clone(&self.engine)
    }

    fn load_markdown(&self, file: &Path) -> Result<Module, LoadError> {
        let source = read(file)?;
        let doc = compile(&source, &compile_options(&self.site.markdown)).map_err(|e| {
            LoadError::Parse {
                path: file.to_path_buf(),
                message: e.to_string(),
            }
        })?;

        Ok(Module::page(MarkdownPage::new(
            doc,
            self.engine(),
            Arc::clone(&self.site),
        )))
    }

    fn load_template(&self, file: &Path) -> Result<Module, LoadError> {
        let name = file
            .strip_prefix(&self.site.routes_dir)
            .ok()
            .and_then(template_name)
            .ok_or_else(|| LoadError::Unsupported(file.to_path_buf()))?;

        // A fresh environment per load so edited includes are picked up.
        let mut env = Environment::new();
        env.set_loader(path_loader(&self.site.routes_dir));

        // Parse eagerly so syntax errors surface at load time.
        env.get_template(&name).map_err(|e| LoadError::Parse {
            path: file.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(Module::page(TemplatePage::new(
            name,
            Arc::new(env),
            Arc::clone(&self.site),
        )))
    }

    fn load_endpoint(&self, file: &Path) -> Result<Module, LoadError> {
        let source = read(file)?;
        let value: Value = serde_json::from_str(&source).map_err(|e| LoadError::Parse {
            path: file.to_path_buf(),
            message: e.to_string(),
        })?;

        let Value::Object(exports) = value else {
            return Err(LoadError::Parse {
                path: file.to_path_buf(),
                message: "expected an object of exports".to_string(),
            });
        };

        let mut endpoint = Endpoint::new();
        for (name, value) in exports {
            endpoint.insert(name, json_handler(value));
        }

        Ok(Module::Endpoint(endpoint))
    }
}

impl ModuleLoader for FsModuleLoader {
    fn load(&self, file: &Path) -> Result<Module, LoadError> {
        if !file.is_file() {
            return Err(LoadError::NotFound(file.to_path_buf()));
        }

        tracing::debug!("Loading {}", file.display());
        match file.extension().and_then(|e| e.to_str()) {
            Some("md") => self.load_markdown(file),
            Some("html") => self.load_template(file),
            Some("json") => self.load_endpoint(file),
            _ => Err(LoadError::Unsupported(file.to_path_buf())),
        }
    }
}

/// Handler for one JSON export.
///
/// String values are rendered as templates against the request event.
/// Anything else is returned unchanged.
fn json_handler(value: Value) -> Handler {
    Handler::new(move |event: &mut HandlerEvent| match &value {
        Value::String(source) => {
            let rendered = Environment::new()
                .render_str(source, &*event)
                .map_err(|e| HandlerError::from(RenderError::from(e)))?;
            Ok(Value::String(rendered))
        }
        other => Ok(other.clone()),
    })
}

/// Compiler options for the configured markdown extensions.
pub fn compile_options(markdown: &MarkdownOptions) -> CompileOptions {
    CompileOptions {
        tables: markdown.tables,
        footnotes: markdown.footnotes,
        strikethrough: markdown.strikethrough,
        tasklists: markdown.tasklists,
        smart_punctuation: markdown.smart_punctuation,
        heading_ids: markdown.heading_ids,
    }
}

fn read(file: &Path) -> Result<String, LoadError> {
    fs::read_to_string(file).map_err(|source| LoadError::Read {
        path: file.to_path_buf(),
        source,
    })
}

/// `/`-separated template name for a path relative to the routes directory.
fn template_name(relative: &Path) -> Option<String> {
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}
