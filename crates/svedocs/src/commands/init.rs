//! Scaffold a documentation project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use svedocs_config::find_config_file;

/// Run the init command.
pub fn run(cwd: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing svedocs in {}...", cwd.display());

    fs::create_dir_all(cwd).context("Failed to create project directory")?;

    if let Some(existing) = find_config_file(cwd) {
        if !yes {
            tracing::warn!(
                "{} already exists. Use --yes to overwrite.",
                existing.display()
            );
            return Ok(());
        }
    }

    let files = [
        ("svedocs.config.toml", DEFAULT_CONFIG),
        ("index.md", DEFAULT_INDEX),
        ("guide/getting-started.md", DEFAULT_GETTING_STARTED),
    ];

    for (relative, content) in files {
        let path = cwd.join(relative);
        if path.exists() && !yes {
            tracing::info!("Keeping existing {}", relative);
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", relative))?;
        tracing::info!("Created {}", relative);
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'svedocs dev' to start the development server.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# svedocs configuration

title = "My Docs"
title_template = ":title | My Docs"
description = "Documentation for my project"

# Directory scanned for pages, relative to this file
routes_dir = "."

# Output directory for `svedocs build`
out_dir = "dist"

# Paths skipped by the route scan
routes_exclude = ["README.md", "node_modules/**", "target/**"]

[server]
port = 5173
"#;

const DEFAULT_INDEX: &str = r#"---
title: Welcome
---

# Welcome

This site is built with **svedocs**. Every markdown file in this
directory becomes a page.

- [Getting Started](/guide/getting-started)
"#;

const DEFAULT_GETTING_STARTED: &str = r#"---
title: Getting Started
description: Write pages, run the dev server and build the site
---

# Getting Started

## Pages

Files map to URLs by their path:

| File                   | URL             |
|------------------------|-----------------|
| `index.md`             | `/`             |
| `guide/index.md`       | `/guide`        |
| `guide/intro.md`       | `/guide/intro`  |
| `posts/[slug].md`      | `/posts/:slug`  |
| `docs/[...rest].md`    | `/docs/*rest`   |

Markdown and `.html` template pages are rendered with the site layout.
`.json` files are endpoints: each top-level key names an HTTP method.

## Development

```bash
svedocs dev
```

## Building

```bash
svedocs build
```
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use svedocs_config::resolve_config;
    use tempfile::tempdir;

    #[test]
    fn scaffolds_a_resolvable_project() {
        let temp = tempdir().unwrap();

        run(temp.path(), false).unwrap();

        assert!(temp.path().join("index.md").exists());
        assert!(temp.path().join("guide/getting-started.md").exists());

        let site = resolve_config(temp.path()).unwrap();
        assert_eq!(site.title, "My Docs");
        assert_eq!(site.lang, "en-us");
        assert_eq!(site.out_dir, temp.path().join("dist"));
    }

    #[test]
    fn keeps_existing_files_without_yes() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("svedocs.config.toml"), "title = \"Mine\"").unwrap();

        run(temp.path(), false).unwrap();

        let config = fs::read_to_string(temp.path().join("svedocs.config.toml")).unwrap();
        assert_eq!(config, "title = \"Mine\"");
        assert!(!temp.path().join("index.md").exists());
    }

    #[test]
    fn overwrites_with_yes() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("index.md"), "old").unwrap();

        run(temp.path(), true).unwrap();

        let index = fs::read_to_string(temp.path().join("index.md")).unwrap();
        assert!(index.contains("# Welcome"));
    }
}
