//! Config file discovery and loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::SiteConfig;
use crate::merge::deep_merge;

/// Accepted config file names, in order of preference.
pub const CONFIG_FILE_NAMES: [&str; 4] = [
    "svedocs.config.toml",
    "svedocs.config.json",
    "svedocs.config.yaml",
    "svedocs.config.yml",
];

/// Errors that can occur while resolving the site configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No config file found in {} (expected one of svedocs.config.{{toml,json,yaml,yml}})", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid config in {}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

/// Find the first config file present in `project_dir`.
pub fn find_config_file(project_dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|path| path.is_file())
}

/// Load the project's config file and merge it over the defaults.
pub fn resolve_config(project_dir: &Path) -> Result<SiteConfig, ConfigError> {
    let path = find_config_file(project_dir)
        .ok_or_else(|| ConfigError::NotFound(project_dir.to_path_buf()))?;

    let source = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;

    let user = parse_config(&path, &source)?;

    let defaults = serde_json::to_value(SiteConfig::default()).map_err(|e| {
        ConfigError::Invalid {
            path: path.clone(),
            message: e.to_string(),
        }
    })?;

    let mut config: SiteConfig =
        serde_json::from_value(deep_merge(defaults, user)).map_err(|e| ConfigError::Invalid {
            path: path.clone(),
            message: e.to_string(),
        })?;

    // Routes are populated by scans, never by the user.
    config.routes.clear();
    config.normalize_paths(project_dir);

    tracing::info!("Loaded config from {}", path.display());

    Ok(config)
}

/// Parse a config file into a generic value according to its extension.
fn parse_config(path: &Path, source: &str) -> Result<Value, ConfigError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    let parsed = match ext {
        "toml" => toml::from_str::<Value>(source).map_err(|e| e.to_string()),
        "json" => serde_json::from_str::<Value>(source).map_err(|e| e.to_string()),
        "yaml" | "yml" => serde_yaml::from_str::<Value>(source).map_err(|e| e.to_string()),
        other => Err(format!("unsupported config format: {other}")),
    };

    let value = parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })?;

    match value {
        Value::Object(_) => Ok(value),
        // An empty YAML document parses as null.
        Value::Null => Ok(Value::Object(Default::default())),
        _ => Err(ConfigError::Parse {
            path: path.to_path_buf(),
            message: "config must be a table/object at the top level".to_string(),
        }),
    }
}
