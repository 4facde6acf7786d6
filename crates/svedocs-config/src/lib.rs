//! Site configuration for svedocs.
//!
//! Discovers the project's `svedocs.config.*` file, merges it over the
//! built-in defaults and normalizes paths against the project directory.

pub mod config;
pub mod merge;
pub mod resolve;

pub use config::{MarkdownOptions, ServerOptions, SiteConfig};
pub use merge::deep_merge;
pub use resolve::{find_config_file, resolve_config, ConfigError, CONFIG_FILE_NAMES};
