//! Built-in theme stylesheet.

/// URL path the theme stylesheet is served at.
pub const THEME_CSS_PATH: &str = "/@svedocs/theme.css";

/// The default theme stylesheet.
pub fn theme_css() -> &'static str {
    THEME_CSS
}

// Colors come from custom properties so sites can restyle through `head` links.
const THEME_CSS: &str = r#"/* svedocs default theme */

:root {
  --svedocs-background: #ffffff;
  --svedocs-foreground: #1f2328;
  --svedocs-muted: #f6f8fa;
  --svedocs-muted-foreground: #59636e;
  --svedocs-border: #d1d9e0;
  --svedocs-primary: #0969da;
  --svedocs-radius: 0.375rem;
  --svedocs-toc-width: 220px;
  --svedocs-content-max-width: 780px;
}

@media (prefers-color-scheme: dark) {
  :root {
    --svedocs-background: #0d1117;
    --svedocs-foreground: #e6edf3;
    --svedocs-muted: #161b22;
    --svedocs-muted-foreground: #9198a1;
    --svedocs-border: #3d444d;
    --svedocs-primary: #4493f8;
  }
}

* {
  box-sizing: border-box;
  margin: 0;
  padding: 0;
}

body {
  font-family: system-ui, -apple-system, sans-serif;
  background: var(--svedocs-background);
  color: var(--svedocs-foreground);
  line-height: 1.6;
}

/* Header */
.svedocs-header {
  padding: 1rem 2rem;
  border-bottom: 1px solid var(--svedocs-border);
}

.svedocs-logo {
  font-weight: 700;
  font-size: 1.25rem;
  color: var(--svedocs-foreground);
  text-decoration: none;
}

/* Main content */
.svedocs-main {
  display: grid;
  grid-template-columns: 1fr var(--svedocs-toc-width);
  gap: 2rem;
  padding: 2rem;
  margin: 0 auto;
  max-width: calc(var(--svedocs-content-max-width) + var(--svedocs-toc-width) + 4rem);
}

.svedocs-content {
  max-width: var(--svedocs-content-max-width);
}

.svedocs-content h1 {
  font-size: 2.25rem;
  font-weight: 700;
  margin-bottom: 1.5rem;
}

.svedocs-content h2 {
  font-size: 1.5rem;
  font-weight: 600;
  margin: 2rem 0 1rem;
  padding-bottom: 0.5rem;
  border-bottom: 1px solid var(--svedocs-border);
}

.svedocs-content h3 {
  font-size: 1.25rem;
  font-weight: 600;
  margin: 1.5rem 0 0.75rem;
}

.svedocs-content p,
.svedocs-content ul,
.svedocs-content ol,
.svedocs-content table {
  margin-bottom: 1rem;
}

.svedocs-content ul,
.svedocs-content ol {
  padding-left: 1.5rem;
}

.svedocs-content a {
  color: var(--svedocs-primary);
  text-underline-offset: 4px;
}

/* Code */
.svedocs-content pre {
  background: var(--svedocs-muted);
  border: 1px solid var(--svedocs-border);
  border-radius: var(--svedocs-radius);
  padding: 1rem;
  overflow-x: auto;
  margin-bottom: 1rem;
}

.svedocs-content code {
  font-family: ui-monospace, monospace;
  font-size: 0.875em;
  background: var(--svedocs-muted);
  padding: 0.125rem 0.375rem;
  border-radius: 0.25rem;
}

.svedocs-content pre code {
  background: none;
  padding: 0;
}

/* Tables */
.svedocs-content table {
  border-collapse: collapse;
}

.svedocs-content th,
.svedocs-content td {
  border: 1px solid var(--svedocs-border);
  padding: 0.375rem 0.75rem;
}

/* Table of contents */
.svedocs-toc {
  position: sticky;
  top: 2rem;
  align-self: start;
}

.svedocs-toc h2 {
  font-size: 0.75rem;
  font-weight: 600;
  text-transform: uppercase;
  letter-spacing: 0.05em;
  color: var(--svedocs-muted-foreground);
  margin-bottom: 0.75rem;
}

.svedocs-toc ul {
  list-style: none;
}

.svedocs-toc a {
  font-size: 0.875rem;
  color: var(--svedocs-muted-foreground);
  text-decoration: none;
}

.svedocs-toc a:hover {
  color: var(--svedocs-foreground);
}

.toc-level-3 {
  padding-left: 1rem;
}

.toc-level-4 {
  padding-left: 2rem;
}

@media (max-width: 1024px) {
  .svedocs-main {
    grid-template-columns: 1fr;
  }

  .svedocs-toc {
    display: none;
  }
}
"#;
