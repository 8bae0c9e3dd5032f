//! Runtime configuration read from the environment.

use std::{env, path::PathBuf};

use thiserror::Error;
use tracing::info;

/// Default directory holding the LOC cache and the repository archive.
const DEFAULT_CACHE_DIR: &str = "cache";
/// Environment variable that overrides [`DEFAULT_CACHE_DIR`].
const CACHE_DIR_ENV: &str = "OCTO_STATS_CACHE_DIR";
/// Environment variable carrying a comma-separated template list, overriding
/// the bundled dark/light pair.
const TEMPLATES_ENV: &str = "OCTO_STATS_TEMPLATES";
/// Environment variable forcing a full re-walk of every repository.
const FORCE_REFRESH_ENV: &str = "OCTO_STATS_FORCE_REFRESH";

/// Failures while assembling the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing or empty.
    #[error("missing environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
}

/// Immutable configuration for one refresh run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// GitHub login whose profile is refreshed.
    pub user_name: String,
    /// Bearer token for the GraphQL API. Never logged.
    pub access_token: String,
    /// Directory holding the LOC cache and the repository archive.
    pub cache_dir: PathBuf,
    /// SVG templates rewritten with the computed figures.
    pub template_paths: Vec<PathBuf>,
    /// Ignore the cache and re-walk every repository.
    pub force_refresh: bool,
}

impl AppConfig {
    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let user_name = require("USER_NAME")?;
        let access_token = require("ACCESS_TOKEN")?;

        let cache_dir = match non_empty_var(CACHE_DIR_ENV) {
            Some(dir) => {
                info!(%dir, "using cache directory override");
                PathBuf::from(dir)
            }
            None => PathBuf::from(DEFAULT_CACHE_DIR),
        };

        let template_paths = match non_empty_var(TEMPLATES_ENV) {
            Some(list) => {
                let paths = parse_template_list(&list);
                info!(count = paths.len(), "using template list override");
                paths
            }
            None => default_templates(),
        };

        let force_refresh = non_empty_var(FORCE_REFRESH_ENV)
            .is_some_and(|value| matches!(value.as_str(), "1" | "true" | "yes"));

        Ok(Self {
            user_name,
            access_token,
            cache_dir,
            template_paths,
            force_refresh,
        })
    }
}

fn require(var: &'static str) -> Result<String, ConfigError> {
    non_empty_var(var).ok_or(ConfigError::MissingEnvVar { var })
}

fn non_empty_var(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.is_empty())
}

/// Split a comma-separated template list into paths, dropping empty items.
fn parse_template_list(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// The dark/light template pair bundled with the repository.
fn default_templates() -> Vec<PathBuf> {
    vec![
        PathBuf::from("templates/dark_mode.svg"),
        PathBuf::from("templates/light_mode.svg"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_list_splits_and_trims() {
        let paths = parse_template_list("a.svg, b.svg ,,c.svg");
        assert_eq!(
            paths,
            vec![
                PathBuf::from("a.svg"),
                PathBuf::from("b.svg"),
                PathBuf::from("c.svg")
            ]
        );
    }

    #[test]
    fn default_templates_are_the_bundled_pair() {
        let paths = default_templates();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("dark_mode.svg"));
        assert!(paths[1].ends_with("light_mode.svg"));
    }
}
